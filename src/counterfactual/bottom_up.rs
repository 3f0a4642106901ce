//! The bottom-up engine: one BDD per atom and rule, built in topological
//! order.
//!
//! A multi-query session fixes a topological order of the full transformed
//! program once. Each batch only removes rules (and adds facts for the atoms
//! forced to true), so the order stays valid for every batch, and the same
//! operand pairs come back batch after batch through the [`ApplyCache`].

use crate::{
    builder::{bdd::RobddBuilder, AllIteTable, BottomUpBuilder},
    counterfactual::{
        graph::{check_acyclic, AndOrGraph},
        query::{intervene, LiteralPolicy, ResolvedQuery},
        ApplyCache, ApplyOp, CounterfactualError,
    },
    repr::{AtomId, AtomLiteral, AtomSpace, BddPtr, Rule, VarLabel, WmcParams},
    util::semirings::RealSemiring,
};
use std::iter;
use tracing::debug;

type Builder = RobddBuilder<AllIteTable>;

/// The guessed atoms' variables, numbered by first appearance in `order`,
/// and their weights
fn guessed_variables(
    atoms: &AtomSpace,
    order: &[usize],
    builder_vars: &mut Vec<(AtomId, VarLabel)>,
) -> WmcParams<RealSemiring> {
    let mut params = WmcParams::default();
    for node in order.iter().filter(|n| **n < atoms.len()) {
        let atom = AtomId::new(*node);
        if let Some(p) = atoms.kind(atom).probability() {
            let label = VarLabel::new_usize(builder_vars.len());
            params.set_weight(label, RealSemiring(1.0 - p), RealSemiring(p));
            builder_vars.push((atom, label));
        }
    }
    params
}

/// Functions of the atoms before any rule is applied: guessed atoms are their
/// variable, derived atoms are false
fn atom_functions(builder: &Builder, num_atoms: usize, vars: &[(AtomId, VarLabel)]) -> Vec<BddPtr> {
    let mut fns = vec![BddPtr::false_ptr(); num_atoms];
    for (atom, label) in vars.iter() {
        fns[atom.value()] = builder.var(*label, true);
    }
    fns
}

fn literal_function(
    builder: &Builder,
    cache: &mut ApplyCache,
    fns: &[BddPtr],
    lit: AtomLiteral,
) -> BddPtr {
    let f = fns[lit.atom().value()];
    if lit.polarity() {
        f
    } else {
        cache.apply(builder, ApplyOp::Not(f))
    }
}

/// Computes the function of `node` from its predecessors: the conjunction of
/// a rule's body, or the disjunction of an atom's rules. Guessed atoms are
/// left untouched.
fn node_function(
    builder: &Builder,
    cache: &mut ApplyCache,
    atoms: &AtomSpace,
    graph: &AndOrGraph,
    rules: &[Rule],
    fns: &mut [BddPtr],
    node: usize,
) {
    match graph.rule_of(node) {
        Some(r) => {
            let body: Vec<BddPtr> = rules[r]
                .body
                .iter()
                .map(|l| literal_function(builder, cache, &*fns, *l))
                .collect();
            fns[node] = cache.and_all(builder, body);
        }
        None if atoms.is_guessed(AtomId::new(node)) => (),
        None => {
            let derivations: Vec<BddPtr> = graph.preds(node).iter().map(|p| fns[*p]).collect();
            fns[node] = cache.or_all(builder, derivations);
        }
    }
}

/// Unnormalized probabilities of `queries` in the models of `rules`, the
/// constraints of `rules` included
pub(crate) fn count(
    atoms: &AtomSpace,
    rules: &[Rule],
    queries: &[AtomId],
) -> Result<Vec<f64>, CounterfactualError> {
    let order = check_acyclic(atoms, rules)?;
    let graph = AndOrGraph::new(atoms.len(), rules);
    let mut vars = Vec::new();
    let params = guessed_variables(atoms, &order, &mut vars);
    let builder = Builder::new_with_linear_order(vars.len());
    let mut cache = ApplyCache::new();

    let mut fns = atom_functions(&builder, atoms.len(), &vars);
    fns.resize(graph.num_nodes(), BddPtr::false_ptr());
    for node in order {
        node_function(&builder, &mut cache, atoms, &graph, rules, &mut fns, node);
    }
    let violations: Vec<BddPtr> = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_constraint())
        .map(|(idx, _)| cache.apply(&builder, ApplyOp::Not(fns[graph.rule_node(idx)])))
        .collect();
    let constraints = cache.and_all(&builder, violations);
    let values = queries
        .iter()
        .map(|q| {
            let f = cache.apply(&builder, ApplyOp::And(fns[q.value()], constraints));
            builder.wmc(f, &params).0
        })
        .collect();
    debug!(
        nodes = builder.num_nodes(),
        ite_entries = builder.num_apply_entries(),
        builder = %builder.stats(),
        cache = %cache,
        "counted bottom-up"
    );
    Ok(values)
}

/// Persistent state of the bottom-up engine across query batches
pub(crate) struct BottomUpSession {
    builder: Builder,
    cache: ApplyCache,
    /// topological order of the full transformed program
    order: Vec<usize>,
    /// function of each atom before any rule is applied
    initial: Vec<BddPtr>,
    params: WmcParams<RealSemiring>,
}

impl BottomUpSession {
    pub fn new(atoms: &AtomSpace, order: Vec<usize>) -> BottomUpSession {
        let mut vars = Vec::new();
        let params = guessed_variables(atoms, &order, &mut vars);
        let builder = Builder::new_with_linear_order(vars.len());
        let initial = atom_functions(&builder, atoms.len(), &vars);
        debug!(vars = vars.len(), nodes = order.len(), "started bottom-up session");
        BottomUpSession {
            builder,
            cache: ApplyCache::new(),
            order,
            initial,
            params,
        }
    }

    pub fn cache(&self) -> &ApplyCache {
        &self.cache
    }

    /// Unnormalized probabilities of the evidence followed by each query
    /// conjoined with the evidence
    pub fn evaluate(
        &mut self,
        atoms: &AtomSpace,
        base: &[Rule],
        q: &ResolvedQuery,
    ) -> Vec<f64> {
        let num_atoms = atoms.len();
        let mut to_batch = vec![None; base.len()];
        let mut rules = Vec::with_capacity(base.len());
        for (idx, rule) in intervene(base, &q.interventions, LiteralPolicy::Keep) {
            to_batch[idx] = Some(rules.len());
            rules.push(rule);
        }
        let num_kept = rules.len();
        rules.extend(q.forcing_facts());
        let graph = AndOrGraph::new(num_atoms, &rules);
        let relevant = graph.ancestors(q.roots().iter().map(|a| a.value()));

        let mut fns = self.initial.clone();
        fns.resize(graph.num_nodes(), BddPtr::false_ptr());
        let builder = &self.builder;
        let cache = &mut self.cache;
        let forcing = (num_kept..rules.len()).map(|r| graph.rule_node(r));
        let ordered = self.order.iter().filter_map(|node| match node.checked_sub(num_atoms) {
            Some(base_rule) => to_batch[base_rule].map(|r| graph.rule_node(r)),
            None => Some(*node),
        });
        for node in forcing.chain(ordered) {
            if relevant.contains(node) {
                node_function(builder, cache, atoms, &graph, &rules, &mut fns, node);
            }
        }

        let observed: Vec<BddPtr> = q
            .evidence
            .iter()
            .map(|(a, v)| literal_function(builder, cache, &fns, AtomLiteral::new(*a, *v)))
            .collect();
        let evidence = cache.and_all(builder, observed);
        let params = &self.params;
        let values = iter::once(evidence)
            .chain(
                q.queries
                    .iter()
                    .map(|a| cache.apply(builder, ApplyOp::And(fns[a.value()], evidence)))
                    .collect::<Vec<_>>(),
            )
            .map(|f| builder.wmc(f, params).0)
            .collect();
        debug!(
            rules = rules.len(),
            relevant = relevant.len(),
            nodes = builder.num_nodes(),
            evidence_nodes = builder.count_nodes(evidence),
            ite_entries = builder.num_apply_entries(),
            builder = %builder.stats(),
            cache = %cache,
            "evaluated bottom-up batch"
        );
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{AtomKind, Rule};
    use std::collections::BTreeMap;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn counts_with_constraints() {
        let mut atoms = AtomSpace::new();
        let u = atoms.get_or_insert("u", AtomKind::Guessed(0.3));
        let v = atoms.get_or_insert("v", AtomKind::Guessed(0.5));
        let a = atoms.get_or_insert("a", AtomKind::Derived);
        let t = atoms.get_or_insert("true", AtomKind::Derived);
        let rules = vec![
            Rule::new(Some(a), vec![AtomLiteral::pos(u)]),
            Rule::new(Some(a), vec![AtomLiteral::pos(v)]),
            Rule::fact(t),
            Rule::constraint(vec![AtomLiteral::neg(a)]),
        ];
        let values = count(&atoms, &rules, &[t, a]).unwrap();
        // P(u | v) = 1 - 0.7 * 0.5
        assert!(close(values[0], 0.65));
        assert!(close(values[1], 0.65));
    }

    #[test]
    fn sessions_reuse_their_cache() {
        let mut atoms = AtomSpace::new();
        let u = atoms.get_or_insert("u", AtomKind::Guessed(0.3));
        let a = atoms.get_or_insert("a", AtomKind::Derived);
        let b = atoms.get_or_insert("b", AtomKind::Derived);
        let rules = vec![
            Rule::new(Some(a), vec![AtomLiteral::pos(u)]),
            Rule::new(Some(b), vec![AtomLiteral::neg(a)]),
        ];
        let order = check_acyclic(&atoms, &rules).unwrap();
        let mut session = BottomUpSession::new(&atoms, order);
        let q = ResolvedQuery {
            interventions: BTreeMap::new(),
            evidence: BTreeMap::new(),
            queries: vec![b],
        };
        let first = session.evaluate(&atoms, &rules, &q);
        assert!(close(first[0], 1.0));
        assert!(close(first[1], 0.7));
        let entries = session.cache().len();
        let hits = session.cache().hits();
        let second = session.evaluate(&atoms, &rules, &q);
        assert_eq!(first, second);
        assert_eq!(session.cache().len(), entries);
        assert!(session.cache().hits() > hits);

        let mut forced = q.clone();
        forced.interventions.insert(a, false);
        let values = session.evaluate(&atoms, &rules, &forced);
        assert!(close(values[1], 1.0));
    }
}
