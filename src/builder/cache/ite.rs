//! Data-structure for representing ITEs in a standard form
//! Follows Section 7.1.5, "Standard Triples", in
//! 'Algorithms and Datastructures in VLSI Design' pages 115-117
use crate::repr::BddPtr;

/// Core ITE representation
#[derive(Debug, Clone, Hash, PartialEq, Eq, Copy)]
pub enum Ite {
    /// a standard ite
    IteChoice { f: BddPtr, g: BddPtr, h: BddPtr },
    /// an ite whose result must be complemented
    IteComplChoice { f: BddPtr, g: BddPtr, h: BddPtr },
    IteConst(BddPtr),
}
use Ite::*;

impl Ite {
    /// Returns a new Ite in standard form. Arguments are ITE(f, g, h), i.e. if
    /// f then g else h. `lt(a, b)` must be true iff the top variable of `a`
    /// occurs strictly before the top variable of `b`; constants never do.
    /// After standardization `f` and `g` are regular pointers.
    pub fn new<F: Fn(BddPtr, BddPtr) -> bool>(lt: F, f: BddPtr, g: BddPtr, h: BddPtr) -> Ite {
        // introduce constants
        let (f, g, h) = match (f, g, h) {
            (f, g, h) if f == g => (f, BddPtr::true_ptr(), h),
            (f, g, h) if f == g.neg() => (f, BddPtr::false_ptr(), h),
            (f, g, h) if f == h => (f, g, BddPtr::false_ptr()),
            (f, g, h) if f == h.neg() => (f, g, BddPtr::true_ptr()),
            _ => (f, g, h),
        };

        // check for terminal cases
        match (f, g, h) {
            (f, g, _) if f.is_true() => return IteConst(g),
            (f, _, h) if f.is_false() => return IteConst(h),
            (_, g, h) if g == h => return IteConst(g),
            (f, g, h) if g.is_true() && h.is_false() => return IteConst(f),
            (f, g, h) if g.is_false() && h.is_true() => return IteConst(f.neg()),
            _ => (),
        };

        // place the top-most variable first when the ITE is symmetric
        let (f, g, h) = match (f, g, h) {
            // f | h
            (f, g, h) if g.is_true() && lt(h, f) => (h, g, f),
            // f & g
            (f, g, h) if h.is_false() && lt(g, f) => (g, f, h),
            // !f | g
            (f, g, h) if h.is_true() && lt(g, f) => (g.neg(), f.neg(), h),
            // !f & h
            (f, g, h) if g.is_false() && lt(h, f) => (h.neg(), g, f.neg()),
            // f <=> g
            (f, g, h) if g == h.neg() && lt(g, f) => (g, f, f.neg()),
            _ => (f, g, h),
        };

        // ite(!f, g, h) = ite(f, h, g)
        let (f, g, h) = if f.is_neg() { (f.neg(), h, g) } else { (f, g, h) };

        // ite(f, !g, h) = !ite(f, g, !h)
        if g.is_neg() || g.is_false() {
            IteComplChoice {
                f,
                g: g.neg(),
                h: h.neg(),
            }
        } else {
            IteChoice { f, g, h }
        }
    }

    pub fn is_compl_choice(&self) -> bool {
        matches!(self, IteComplChoice { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_index(a: BddPtr, b: BddPtr) -> bool {
        match (a.index(), b.index()) {
            (Some(x), Some(y)) => x < y,
            _ => false,
        }
    }

    #[test]
    fn terminal_cases() {
        let x = BddPtr::new_reg(0);
        let y = BddPtr::new_reg(1);
        let t = BddPtr::true_ptr();
        let f = BddPtr::false_ptr();
        assert_eq!(Ite::new(by_index, t, x, y), IteConst(x));
        assert_eq!(Ite::new(by_index, f, x, y), IteConst(y));
        assert_eq!(Ite::new(by_index, x, y, y), IteConst(y));
        assert_eq!(Ite::new(by_index, x, t, f), IteConst(x));
        assert_eq!(Ite::new(by_index, x, f, t), IteConst(x.neg()));
        // x & x = x
        assert_eq!(Ite::new(by_index, x, x, f), IteConst(x));
        // x & !x = false
        assert_eq!(Ite::new(by_index, x, x.neg(), f), IteConst(f));
    }

    #[test]
    fn conjunction_is_symmetric() {
        let x = BddPtr::new_reg(0);
        let y = BddPtr::new_reg(1);
        let f = BddPtr::false_ptr();
        assert_eq!(Ite::new(by_index, x, y, f), Ite::new(by_index, y, x, f));
    }

    #[test]
    fn standard_form_is_regular() {
        let x = BddPtr::new_reg(0);
        let y = BddPtr::new_reg(1);
        let z = BddPtr::new_reg(2);
        for ite in [
            Ite::new(by_index, x.neg(), y, z),
            Ite::new(by_index, x, y.neg(), z),
            Ite::new(by_index, x.neg(), y.neg(), z.neg()),
        ] {
            match ite {
                IteChoice { f, g, .. } | IteComplChoice { f, g, .. } => {
                    assert!(!f.is_neg());
                    assert!(!g.is_neg());
                }
                IteConst(_) => panic!("unexpected constant"),
            }
        }
    }

    #[test]
    fn negated_conjunction_is_complemented_disjunction() {
        // !x & y = !(x | !y)
        let x = BddPtr::new_reg(0);
        let y = BddPtr::new_reg(1);
        let f = BddPtr::false_ptr();
        assert_eq!(
            Ite::new(by_index, x, f, y),
            IteComplChoice {
                f: x,
                g: BddPtr::true_ptr(),
                h: y.neg()
            }
        );
        // x | y is already standard
        assert_eq!(
            Ite::new(by_index, x, BddPtr::true_ptr(), y),
            IteChoice {
                f: x,
                g: BddPtr::true_ptr(),
                h: y
            }
        );
    }
}
