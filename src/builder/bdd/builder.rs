use crate::{
    builder::BottomUpBuilder,
    repr::{BddNode, BddPtr, VarLabel},
};

pub trait BddBuilder: BottomUpBuilder<BddPtr> {
    /// Normalizes and fetches a node from the store
    fn get_or_insert(&self, bdd: BddNode) -> BddPtr;

    // implementation-dependent helper functions

    fn ite_helper(&self, f: BddPtr, g: BddPtr, h: BddPtr) -> BddPtr;

    // convenience utilities
    /// disjoins a list of BDDs
    fn or_lst(&self, f: &[BddPtr]) -> BddPtr {
        let mut cur_bdd = BddPtr::false_ptr();
        for &itm in f {
            cur_bdd = self.or(cur_bdd, itm);
        }
        cur_bdd
    }

    /// conjoins a list of BDDs
    fn and_lst(&self, f: &[BddPtr]) -> BddPtr {
        let mut cur_bdd = BddPtr::true_ptr();
        for &itm in f {
            cur_bdd = self.and(cur_bdd, itm);
        }
        cur_bdd
    }
}

impl<T> BottomUpBuilder<BddPtr> for T
where
    T: BddBuilder,
{
    fn true_ptr(&self) -> BddPtr {
        BddPtr::true_ptr()
    }

    fn false_ptr(&self) -> BddPtr {
        BddPtr::false_ptr()
    }

    /// Get a pointer to the variable with label `lbl` and polarity `polarity`
    fn var(&self, label: VarLabel, polarity: bool) -> BddPtr {
        let bdd = BddNode::new(label, BddPtr::false_ptr(), BddPtr::true_ptr());
        let r = self.get_or_insert(bdd);
        if polarity {
            r
        } else {
            r.neg()
        }
    }

    fn eq(&self, a: BddPtr, b: BddPtr) -> bool {
        a == b
    }

    /// Produce a new BDD that is the result of conjoining `f` and `g`
    /// ```
    /// # use whatif::builder::bdd::RobddBuilder;
    /// # use whatif::builder::{AllIteTable, BottomUpBuilder};
    /// # use whatif::repr::VarLabel;
    /// let builder = RobddBuilder::<AllIteTable>::new_with_linear_order(10);
    /// let a = builder.var(VarLabel::new(0), true);
    /// let a_and_not_a = builder.and(a, a.neg());
    /// assert!(a_and_not_a.is_false());
    /// ```
    fn and(&self, f: BddPtr, g: BddPtr) -> BddPtr {
        self.ite(f, g, BddPtr::false_ptr())
    }

    fn negate(&self, f: BddPtr) -> BddPtr {
        f.neg()
    }

    /// if f then g else h
    fn ite(&self, f: BddPtr, g: BddPtr, h: BddPtr) -> BddPtr {
        self.ite_helper(f, g, h)
    }
}
