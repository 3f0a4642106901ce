use crate::{
    backing_store::{BddTable, UniqueTable},
    builder::{
        bdd::{BddBuilder, BddBuilderStats},
        cache::{Ite, IteTable},
    },
    repr::{BddNode, BddPtr, VarLabel, VarOrder, WmcParams},
    util::semirings::Semiring,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;

pub struct RobddBuilder<T: IteTable + Default> {
    compute_table: RefCell<BddTable>,
    apply_table: RefCell<T>,
    stats: RefCell<BddBuilderStats>,
    order: VarOrder,
}

impl<T: IteTable + Default> BddBuilder for RobddBuilder<T> {
    /// Normalizes and fetches a node from the store; the stored high edge is
    /// always regular and never false
    fn get_or_insert(&self, bdd: BddNode) -> BddPtr {
        let mut tbl = self.compute_table.borrow_mut();
        if bdd.high.is_neg() || bdd.high.is_false() {
            let bdd = BddNode::new(bdd.var, bdd.low.neg(), bdd.high.neg());
            BddPtr::new_compl(tbl.get_or_insert(bdd))
        } else {
            BddPtr::new_reg(tbl.get_or_insert(bdd))
        }
    }

    fn ite_helper(&self, f: BddPtr, g: BddPtr, h: BddPtr) -> BddPtr {
        let ite = Ite::new(|a, b| self.lt(a, b), f, g, h);

        let (f, g, h) = match ite {
            Ite::IteConst(f) => return f,
            Ite::IteChoice { f, g, h } | Ite::IteComplChoice { f, g, h } => (f, g, h),
        };

        if let Some(v) = self.apply_table.borrow().get(ite) {
            self.stats.borrow_mut().num_cache_hits += 1;
            return v;
        }
        self.stats.borrow_mut().num_recursive_calls += 1;

        // ok the work!
        // find the first essential variable for f, g, or h
        let lbl = self.first_essential(f, g, h);
        let fx = self.condition_essential(f, lbl, true);
        let gx = self.condition_essential(g, lbl, true);
        let hx = self.condition_essential(h, lbl, true);
        let fxn = self.condition_essential(f, lbl, false);
        let gxn = self.condition_essential(g, lbl, false);
        let hxn = self.condition_essential(h, lbl, false);
        let t = self.ite_helper(fx, gx, hx);
        let e = self.ite_helper(fxn, gxn, hxn);

        let r = if t == e {
            t
        } else {
            self.get_or_insert(BddNode::new(lbl, e, t))
        };
        // `r` is the standardized ite; undo the complement for the caller
        let r = if ite.is_compl_choice() { r.neg() } else { r };
        self.apply_table.borrow_mut().insert(ite, r);
        r
    }
}

impl<T: IteTable + Default> RobddBuilder<T> {
    /// Creates a new variable manager with the specified order
    pub fn new(order: VarOrder) -> RobddBuilder<T> {
        RobddBuilder {
            compute_table: RefCell::new(BddTable::new()),
            order,
            apply_table: RefCell::new(T::default()),
            stats: RefCell::new(BddBuilderStats::new()),
        }
    }

    /// Make a BDD manager with a default variable ordering
    pub fn new_with_linear_order(num_vars: usize) -> RobddBuilder<T> {
        RobddBuilder::new(VarOrder::linear_order(num_vars))
    }

    /// Returns the number of variables in the manager
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.order.num_vars()
    }

    /// Get the current variable order
    #[inline]
    pub fn order(&self) -> &VarOrder {
        &self.order
    }

    pub fn stats(&self) -> BddBuilderStats {
        *self.stats.borrow()
    }

    /// Total number of nodes allocated by this builder
    pub fn num_nodes(&self) -> usize {
        self.compute_table.borrow().num_nodes()
    }

    pub fn num_apply_entries(&self) -> usize {
        self.apply_table.borrow().num_entries()
    }

    fn node(&self, idx: usize) -> BddNode {
        *self.compute_table.borrow().get(idx)
    }

    /// The top variable of `f`, `None` for constants
    pub fn top_var(&self, f: BddPtr) -> Option<VarLabel> {
        f.index().map(|idx| self.node(idx).var)
    }

    /// The low child of `f` with the complement of `f` pushed down
    pub fn low(&self, f: BddPtr) -> BddPtr {
        match f.index() {
            None => f,
            Some(idx) => {
                let l = self.node(idx).low;
                if f.is_neg() {
                    l.neg()
                } else {
                    l
                }
            }
        }
    }

    /// The high child of `f` with the complement of `f` pushed down
    pub fn high(&self, f: BddPtr) -> BddPtr {
        match f.index() {
            None => f,
            Some(idx) => {
                let h = self.node(idx).high;
                if f.is_neg() {
                    h.neg()
                } else {
                    h
                }
            }
        }
    }

    /// true if the top variable of `a` is strictly above that of `b`; a
    /// constant is never above anything
    fn lt(&self, a: BddPtr, b: BddPtr) -> bool {
        match (self.top_var(a), self.top_var(b)) {
            (Some(va), Some(vb)) => self.order.lt(va, vb),
            _ => false,
        }
    }

    fn first_essential(&self, f: BddPtr, g: BddPtr, h: BddPtr) -> VarLabel {
        [f, g, h]
            .iter()
            .filter_map(|p| self.top_var(*p))
            .min_by_key(|v| self.order.get(*v))
            .unwrap_or_else(|| unreachable!("ite of three constants is standardized away"))
    }

    // condition a BDD *only* if the top variable is `v`; used in `ite`
    fn condition_essential(&self, f: BddPtr, lbl: VarLabel, v: bool) -> BddPtr {
        match self.top_var(f) {
            Some(var) if var == lbl => {
                if v {
                    self.high(f)
                } else {
                    self.low(f)
                }
            }
            _ => f,
        }
    }

    fn level(&self, f: BddPtr) -> usize {
        match self.top_var(f) {
            Some(v) => self.order.get(v),
            None => self.order.num_vars(),
        }
    }

    /// Number of distinct nodes reachable from `f`
    pub fn count_nodes(&self, f: BddPtr) -> usize {
        let mut seen = FxHashSet::default();
        let mut stack = vec![f];
        while let Some(p) = stack.pop() {
            if let Some(idx) = p.index() {
                if seen.insert(idx) {
                    let n = self.node(idx);
                    stack.push(n.low);
                    stack.push(n.high);
                }
            }
        }
        seen.len()
    }

    /// Weighted model count of `f` over every variable of the builder's order.
    /// Variables skipped along an edge contribute their total weight.
    /// ```
    /// # use whatif::builder::bdd::RobddBuilder;
    /// # use whatif::builder::{AllIteTable, BottomUpBuilder};
    /// # use whatif::repr::{VarLabel, WmcParams};
    /// # use whatif::util::semirings::RealSemiring;
    /// let builder = RobddBuilder::<AllIteTable>::new_with_linear_order(2);
    /// let x = builder.var(VarLabel::new(0), true);
    /// let y = builder.var(VarLabel::new(1), true);
    /// let mut params = WmcParams::default();
    /// params.set_weight(VarLabel::new(0), RealSemiring(0.8), RealSemiring(0.2));
    /// params.set_weight(VarLabel::new(1), RealSemiring(0.4), RealSemiring(0.6));
    /// let or = builder.or(x, y);
    /// assert!((builder.wmc(or, &params).0 - (1.0 - 0.8 * 0.4)).abs() < 1e-12);
    /// ```
    pub fn wmc<W: Semiring>(&self, f: BddPtr, params: &WmcParams<W>) -> W {
        let smooth: Vec<W> = self
            .order
            .in_order_iter()
            .map(|v| params.smoothing_weight(v))
            .collect();
        let skip = |from: usize, to: usize| {
            smooth[from..to]
                .iter()
                .fold(params.one, |acc, w| acc * *w)
        };
        let mut memo: FxHashMap<BddPtr, W> = FxHashMap::default();
        let v = self.wmc_h(f, params, &skip, &mut memo);
        v * skip(0, self.level(f))
    }

    fn wmc_h<W: Semiring, F: Fn(usize, usize) -> W>(
        &self,
        f: BddPtr,
        params: &WmcParams<W>,
        skip: &F,
        memo: &mut FxHashMap<BddPtr, W>,
    ) -> W {
        if f.is_true() {
            return params.one;
        }
        if f.is_false() {
            return params.zero;
        }
        if let Some(v) = memo.get(&f) {
            return *v;
        }
        let lvl = self.level(f);
        let (lo, hi) = (self.low(f), self.high(f));
        let var = self.order.var_at_level(lvl);
        let (wl, wh) = params.var_weight(var);
        let lo_v = self.wmc_h(lo, params, skip, memo) * skip(lvl + 1, self.level(lo));
        let hi_v = self.wmc_h(hi, params, skip, memo) * skip(lvl + 1, self.level(hi));
        let r = wl * lo_v + wh * hi_v;
        memo.insert(f, r);
        r
    }
}
