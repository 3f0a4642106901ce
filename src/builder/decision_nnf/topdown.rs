//! An in-process top-down compiler from CNF to decision-DNNF: decide a
//! variable, propagate units, split the remaining clauses into independent
//! components and cache each component by its residual clauses.

use crate::{
    builder::decision_nnf::{CompileError, KnowledgeCompiler, UnitPropagate},
    repr::{Cnf, Literal, NnfCircuit, NnfNode, VarOrder},
};
use rustc_hash::FxHashMap;
use tracing::debug;

/// A component is identified by its residual clauses: the unassigned literals
/// of every clause that is not yet satisfied, sorted
type ResidualCnf = Vec<Vec<Literal>>;

/// Hash-consing store for the circuit under construction
#[derive(Default)]
struct NnfStore {
    nodes: Vec<NnfNode>,
    unique: FxHashMap<NnfNode, usize>,
}

impl NnfStore {
    fn get_or_insert(&mut self, node: NnfNode) -> usize {
        if let Some(idx) = self.unique.get(&node) {
            return *idx;
        }
        self.nodes.push(node.clone());
        self.unique.insert(node, self.nodes.len() - 1);
        self.nodes.len() - 1
    }

    fn true_node(&mut self) -> usize {
        self.get_or_insert(NnfNode::True)
    }

    fn false_node(&mut self) -> usize {
        self.get_or_insert(NnfNode::False)
    }

    fn is_false(&self, idx: usize) -> bool {
        self.nodes[idx] == NnfNode::False
    }

    fn is_true(&self, idx: usize) -> bool {
        self.nodes[idx] == NnfNode::True
    }

    fn and(&mut self, children: Vec<usize>) -> usize {
        if children.iter().any(|c| self.is_false(*c)) {
            return self.false_node();
        }
        let mut children: Vec<usize> = children.into_iter().filter(|c| !self.is_true(*c)).collect();
        match children.len() {
            0 => self.true_node(),
            1 => children[0],
            _ => {
                children.sort_unstable();
                self.get_or_insert(NnfNode::And(children))
            }
        }
    }

    fn or(&mut self, children: Vec<usize>) -> usize {
        let children: Vec<usize> = children.into_iter().filter(|c| !self.is_false(*c)).collect();
        match children.len() {
            0 => self.false_node(),
            1 => children[0],
            _ => self.get_or_insert(NnfNode::Or(children)),
        }
    }

    /// Conjoins `lits` onto `sub`
    fn conjoin_implied(&mut self, lits: &[Literal], sub: usize) -> usize {
        if self.is_false(sub) {
            return sub;
        }
        let mut children: Vec<usize> = lits
            .iter()
            .map(|l| self.get_or_insert(NnfNode::Lit(*l)))
            .collect();
        children.push(sub);
        self.and(children)
    }
}

/// Compiles with the built-in component-caching search. Decisions follow
/// `order` (the linear order over the CNF's variables when unset).
#[derive(Debug, Clone, Default)]
pub struct TopDownCompiler {
    order: Option<VarOrder>,
}

impl TopDownCompiler {
    pub fn new() -> TopDownCompiler {
        TopDownCompiler::default()
    }

    pub fn with_order(order: VarOrder) -> TopDownCompiler {
        TopDownCompiler { order: Some(order) }
    }

    /// Compiles `cnf` into a decision-DNNF over `0..cnf.num_vars()`
    /// ```
    /// # use whatif::builder::decision_nnf::TopDownCompiler;
    /// # use whatif::repr::{Cnf, VarLabel, WmcParams};
    /// # use whatif::util::semirings::RealSemiring;
    /// let cnf = Cnf::from_dimacs("p cnf 2 1\n1 2 0\n").unwrap();
    /// let circuit = TopDownCompiler::new().compile_cnf(&cnf);
    /// let mut params = WmcParams::default();
    /// params.set_weight(VarLabel::new(0), RealSemiring(0.5), RealSemiring(0.5));
    /// params.set_weight(VarLabel::new(1), RealSemiring(0.5), RealSemiring(0.5));
    /// assert!((circuit.wmc(&params).0 - 0.75).abs() < 1e-12);
    /// ```
    pub fn compile_cnf(&self, cnf: &Cnf) -> NnfCircuit {
        let mut store = NnfStore::default();
        let mut up = match UnitPropagate::new(cnf) {
            Some(up) => up,
            None => {
                let f = store.false_node();
                return NnfCircuit::new(store.nodes, f, cnf.num_vars());
            }
        };
        let order = match &self.order {
            Some(o) => o.clone(),
            None => VarOrder::linear_order(cnf.num_vars()),
        };
        let all: Vec<usize> = (0..cnf.clauses().len()).collect();
        let mut cache: FxHashMap<ResidualCnf, usize> = FxHashMap::default();
        let sub = compile_h(&mut up, &all, &order, &mut cache, &mut store);
        let implied = up.trail().to_vec();
        let root = store.conjoin_implied(&implied, sub);
        debug!(
            nodes = store.nodes.len(),
            components = cache.len(),
            "compiled cnf top-down"
        );
        NnfCircuit::new(store.nodes, root, cnf.num_vars())
    }
}

impl KnowledgeCompiler for TopDownCompiler {
    fn name(&self) -> &str {
        "top-down"
    }

    fn compile(&self, cnf: &Cnf) -> Result<NnfCircuit, CompileError> {
        Ok(self.compile_cnf(cnf))
    }
}

/// The clauses among `clauses` that the current assignment does not satisfy
fn open_clauses(up: &UnitPropagate, clauses: &[usize]) -> Vec<usize> {
    clauses
        .iter()
        .copied()
        .filter(|c| !up.clauses()[*c].iter().any(|l| up.is_true(*l)))
        .collect()
}

/// Partitions open clauses into groups that share no unassigned variable
fn components(up: &UnitPropagate, open: &[usize]) -> Vec<Vec<usize>> {
    fn find(parent: &mut FxHashMap<usize, usize>, x: usize) -> usize {
        let mut root = x;
        while let Some(&p) = parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        let mut cur = x;
        while cur != root {
            let next = parent[&cur];
            parent.insert(cur, root);
            cur = next;
        }
        root
    }

    let mut parent: FxHashMap<usize, usize> = FxHashMap::default();
    for c in open.iter() {
        let vars: Vec<usize> = up.clauses()[*c]
            .iter()
            .filter(|l| up.value(l.label()).is_none())
            .map(|l| l.label().value_usize())
            .collect();
        for v in vars.iter() {
            parent.entry(*v).or_insert(*v);
        }
        for w in vars.windows(2) {
            let (a, b) = (find(&mut parent, w[0]), find(&mut parent, w[1]));
            if a != b {
                parent.insert(a, b);
            }
        }
    }

    let mut groups: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    let mut roots_in_order = Vec::new();
    for c in open.iter() {
        let rep = up.clauses()[*c]
            .iter()
            .find(|l| up.value(l.label()).is_none())
            .map(|l| find(&mut parent, l.label().value_usize()));
        // an open clause always has an unassigned literal after successful
        // propagation
        if let Some(rep) = rep {
            let g = groups.entry(rep).or_insert_with(|| {
                roots_in_order.push(rep);
                Vec::new()
            });
            g.push(*c);
        }
    }
    roots_in_order
        .into_iter()
        .filter_map(|r| groups.remove(&r))
        .collect()
}

fn residual(up: &UnitPropagate, clauses: &[usize]) -> ResidualCnf {
    let mut res: ResidualCnf = clauses
        .iter()
        .map(|c| {
            let mut lits: Vec<Literal> = up.clauses()[*c]
                .iter()
                .copied()
                .filter(|l| up.value(l.label()).is_none())
                .collect();
            lits.sort_unstable();
            lits
        })
        .collect();
    res.sort_unstable();
    res.dedup();
    res
}

fn compile_h(
    up: &mut UnitPropagate,
    clauses: &[usize],
    order: &VarOrder,
    cache: &mut FxHashMap<ResidualCnf, usize>,
    store: &mut NnfStore,
) -> usize {
    let open = open_clauses(up, clauses);
    if open.is_empty() {
        return store.true_node();
    }
    let mut results = Vec::new();
    for component in components(up, &open) {
        let key = residual(up, &component);
        if let Some(r) = cache.get(&key) {
            results.push(*r);
            continue;
        }

        // decide on the topmost unassigned variable of the component
        let decision = key
            .iter()
            .flatten()
            .map(|l| l.label())
            .min_by_key(|v| order.get(*v))
            .unwrap_or_else(|| unreachable!("components only contain open clauses"));

        let mut branches = Vec::with_capacity(2);
        for polarity in [true, false] {
            let branch = if up.decide(Literal::new(decision, polarity)) {
                let implied = up.current_level().to_vec();
                let sub = compile_h(up, &component, order, cache, store);
                store.conjoin_implied(&implied, sub)
            } else {
                store.false_node()
            };
            up.backtrack();
            branches.push(branch);
        }
        let r = store.or(branches);
        cache.insert(key, r);
        results.push(r);
    }
    store.and(results)
}
