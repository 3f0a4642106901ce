//! Contains the core datastructures for constructing and maintaining decision
//! diagrams and compiled circuits.

mod cache;

pub mod bdd;
pub mod completion;
pub mod decision_nnf;

pub use self::cache::*;

use crate::repr::VarLabel;

/// A builder that constructs Boolean functions by composing smaller ones
pub trait BottomUpBuilder<Ptr: Copy> {
    fn true_ptr(&self) -> Ptr;
    fn false_ptr(&self) -> Ptr;

    /// Get a pointer to the variable with label `lbl` and polarity `polarity`
    fn var(&self, label: VarLabel, polarity: bool) -> Ptr;

    fn eq(&self, a: Ptr, b: Ptr) -> bool;

    fn and(&self, a: Ptr, b: Ptr) -> Ptr;

    fn negate(&self, f: Ptr) -> Ptr;

    /// if f then g else h
    fn ite(&self, f: Ptr, g: Ptr, h: Ptr) -> Ptr;

    /// Compute the Boolean function `f || g`
    fn or(&self, a: Ptr, b: Ptr) -> Ptr {
        self.negate(self.and(self.negate(a), self.negate(b)))
    }
}
