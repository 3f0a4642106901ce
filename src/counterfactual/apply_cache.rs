//! A memo over the Boolean operations of the bottom-up engine.
//!
//! The builder already caches its ITE calls, but an `And` over two large
//! functions still walks the ITE standardization and the unique table on every
//! call. Atom functions are rebuilt from the same operands batch after batch,
//! so the composite operation itself is the key here.

use crate::{builder::BottomUpBuilder, repr::BddPtr};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOp {
    And(BddPtr, BddPtr),
    Or(BddPtr, BddPtr),
    Not(BddPtr),
}

#[derive(Debug, Default)]
pub struct ApplyCache {
    table: FxHashMap<ApplyOp, BddPtr>,
    hits: usize,
}

impl ApplyCache {
    pub fn new() -> ApplyCache {
        ApplyCache::default()
    }

    /// Applies `op`, or returns the node stored for it by an earlier call
    /// ```
    /// # use whatif::builder::{bdd::RobddBuilder, AllIteTable, BottomUpBuilder};
    /// # use whatif::counterfactual::{ApplyCache, ApplyOp};
    /// # use whatif::repr::VarLabel;
    /// let builder = RobddBuilder::<AllIteTable>::new_with_linear_order(2);
    /// let a = builder.var(VarLabel::new(0), true);
    /// let b = builder.var(VarLabel::new(1), true);
    /// let mut cache = ApplyCache::new();
    /// let f = cache.apply(&builder, ApplyOp::And(a, b));
    /// assert_eq!(f, cache.apply(&builder, ApplyOp::And(a, b)));
    /// assert_eq!(cache.hits(), 1);
    /// ```
    pub fn apply<B: BottomUpBuilder<BddPtr>>(&mut self, builder: &B, op: ApplyOp) -> BddPtr {
        if let Some(r) = self.table.get(&op) {
            self.hits += 1;
            return *r;
        }
        let r = match op {
            ApplyOp::And(a, b) => builder.and(a, b),
            ApplyOp::Or(a, b) => builder.or(a, b),
            ApplyOp::Not(a) => builder.negate(a),
        };
        self.table.insert(op, r);
        r
    }

    /// Conjoins `fs` from left to right
    pub fn and_all<B: BottomUpBuilder<BddPtr>>(
        &mut self,
        builder: &B,
        fs: impl IntoIterator<Item = BddPtr>,
    ) -> BddPtr {
        fs.into_iter()
            .fold(BddPtr::true_ptr(), |acc, f| self.apply(builder, ApplyOp::And(acc, f)))
    }

    /// Disjoins `fs` from left to right
    pub fn or_all<B: BottomUpBuilder<BddPtr>>(
        &mut self,
        builder: &B,
        fs: impl IntoIterator<Item = BddPtr>,
    ) -> BddPtr {
        fs.into_iter()
            .fold(BddPtr::false_ptr(), |acc, f| self.apply(builder, ApplyOp::Or(acc, f)))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl fmt::Display for ApplyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entries: {}, hits: {}", self.len(), self.hits)
    }
}
