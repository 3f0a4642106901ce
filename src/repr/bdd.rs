//! Binary decision diagram pointers and nodes. Nodes live in the unique table
//! of a [`RobddBuilder`](crate::builder::bdd::RobddBuilder); a `BddPtr` is an
//! index into that table together with a complement bit.
use super::var_label::VarLabel;
use std::fmt;

/// Core BDD pointer datatype
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BddPtr {
    Compl(usize),
    Reg(usize),
    PtrTrue,
    PtrFalse,
}

use BddPtr::*;

impl BddPtr {
    #[inline]
    pub fn new_reg(idx: usize) -> BddPtr {
        Reg(idx)
    }

    #[inline]
    pub fn new_compl(idx: usize) -> BddPtr {
        Compl(idx)
    }

    pub fn true_ptr() -> BddPtr {
        PtrTrue
    }

    pub fn false_ptr() -> BddPtr {
        PtrFalse
    }

    /// Negate the BDD pointer
    /// ```
    /// # use whatif::repr::BddPtr;
    /// assert_eq!(BddPtr::true_ptr().neg(), BddPtr::false_ptr());
    /// assert_eq!(BddPtr::new_reg(3).neg(), BddPtr::new_compl(3));
    /// assert_eq!(BddPtr::new_reg(3).neg().neg(), BddPtr::new_reg(3));
    /// ```
    pub fn neg(&self) -> BddPtr {
        match *self {
            Compl(n) => Reg(n),
            Reg(n) => Compl(n),
            PtrTrue => PtrFalse,
            PtrFalse => PtrTrue,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, PtrTrue)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, PtrFalse)
    }

    pub fn is_const(&self) -> bool {
        matches!(self, PtrTrue | PtrFalse)
    }

    /// True if this is a complemented edge into the unique table
    pub fn is_neg(&self) -> bool {
        matches!(self, Compl(_))
    }

    /// The unique-table index of the node this pointer refers to
    pub fn index(&self) -> Option<usize> {
        match *self {
            Compl(n) | Reg(n) => Some(n),
            PtrTrue | PtrFalse => None,
        }
    }

    /// Gets a non-complemented version of self
    pub fn regular(&self) -> BddPtr {
        match *self {
            Compl(n) => Reg(n),
            other => other,
        }
    }
}

impl fmt::Debug for BddPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PtrTrue => write!(f, "BddPtr(T)"),
            PtrFalse => write!(f, "BddPtr(F)"),
            Reg(n) => write!(f, "BddPtr({})", n),
            Compl(n) => write!(f, "BddPtr(!{})", n),
        }
    }
}

/// A node stored in the unique table. The `high` edge of a stored node is
/// never complemented and never false; complements are pushed to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BddNode {
    pub var: VarLabel,
    pub low: BddPtr,
    pub high: BddPtr,
}

impl BddNode {
    pub fn new(var: VarLabel, low: BddPtr, high: BddPtr) -> BddNode {
        BddNode { var, low, high }
    }
}
