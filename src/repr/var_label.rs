//! A generic data structure for tracking variable labels throughout the library
use std::fmt;

/// a label for each distinct variable in a decision diagram or CNF
#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
pub struct VarLabel(u64);

impl VarLabel {
    #[inline]
    pub fn new(v: u64) -> VarLabel {
        VarLabel(v)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn new_usize(v: usize) -> VarLabel {
        VarLabel::new(v as u64)
    }

    pub fn value_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal, a variable label and its corresponding truth assignment
#[derive(Clone, PartialEq, Eq, Hash, Copy, PartialOrd, Ord)]
pub struct Literal {
    label: VarLabel,
    polarity: bool,
}

impl Literal {
    pub fn new(label: VarLabel, polarity: bool) -> Literal {
        Literal { label, polarity }
    }

    pub fn label(&self) -> VarLabel {
        self.label
    }

    pub fn polarity(&self) -> bool {
        self.polarity
    }

    pub fn negated(&self) -> Literal {
        Literal::new(self.label, !self.polarity)
    }

    /// The DIMACS encoding of this literal (variables are 1-indexed)
    /// ```
    /// # use whatif::repr::{Literal, VarLabel};
    /// assert_eq!(Literal::new(VarLabel::new(0), true).to_dimacs(), 1);
    /// assert_eq!(Literal::new(VarLabel::new(4), false).to_dimacs(), -5);
    /// ```
    pub fn to_dimacs(&self) -> i64 {
        let v = self.label.value() as i64 + 1;
        if self.polarity {
            v
        } else {
            -v
        }
    }

    /// Inverse of [`Literal::to_dimacs`]; `None` for the clause terminator `0`
    pub fn from_dimacs(lit: i64) -> Option<Literal> {
        if lit == 0 {
            return None;
        }
        Some(Literal::new(
            VarLabel::new(lit.unsigned_abs() - 1),
            lit > 0,
        ))
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Literal")
            .field("label", &self.label)
            .field("polarity", &self.polarity)
            .finish()
    }
}
