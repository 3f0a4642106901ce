//! The AND/OR dependency graph of a rule set.
//!
//! Atoms are OR nodes `0..num_atoms`, the `i`-th rule is the AND node
//! `num_atoms + i`. Every rule has an edge to its head and every body atom an
//! edge to the rule; the sign of a literal is irrelevant here.

use crate::{
    counterfactual::CounterfactualError,
    repr::{AtomId, AtomSpace, Rule},
};
use bit_set::BitSet;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct AndOrGraph {
    num_atoms: usize,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
}

impl AndOrGraph {
    pub fn new(num_atoms: usize, rules: &[Rule]) -> AndOrGraph {
        let num_nodes = num_atoms + rules.len();
        let mut preds = vec![Vec::new(); num_nodes];
        let mut succs = vec![Vec::new(); num_nodes];
        for (idx, rule) in rules.iter().enumerate() {
            let node = num_atoms + idx;
            if let Some(h) = rule.head {
                succs[node].push(h.value());
                preds[h.value()].push(node);
            }
            for lit in rule.body.iter() {
                succs[lit.atom().value()].push(node);
                preds[node].push(lit.atom().value());
            }
        }
        AndOrGraph {
            num_atoms,
            preds,
            succs,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.preds.len()
    }

    pub fn rule_node(&self, rule: usize) -> usize {
        self.num_atoms + rule
    }

    /// The rule behind `node`, if it is an AND node
    pub fn rule_of(&self, node: usize) -> Option<usize> {
        node.checked_sub(self.num_atoms)
    }

    /// The rules deriving an atom, or the body atoms of a rule
    pub fn preds(&self, node: usize) -> &[usize] {
        &self.preds[node]
    }

    /// Every node with a path to one of `roots`, the roots included
    pub fn ancestors(&self, roots: impl IntoIterator<Item = usize>) -> BitSet {
        let mut seen = BitSet::with_capacity(self.num_nodes());
        let mut stack: Vec<usize> = roots.into_iter().collect();
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            for p in self.preds[n].iter() {
                if !seen.contains(*p) {
                    stack.push(*p);
                }
            }
        }
        seen
    }

    /// Kahn's algorithm. Nodes of equal depth keep their index order. On a
    /// cycle, returns an atom node lying on it.
    pub fn topological_order(&self) -> Result<Vec<usize>, usize> {
        let mut in_degree: Vec<usize> = self.preds.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..self.num_nodes())
            .filter(|n| in_degree[*n] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.num_nodes());
        while let Some(n) = queue.pop_front() {
            order.push(n);
            for s in self.succs[n].iter() {
                in_degree[*s] -= 1;
                if in_degree[*s] == 0 {
                    queue.push_back(*s);
                }
            }
        }
        if order.len() == self.num_nodes() {
            return Ok(order);
        }
        // every cycle alternates between atoms and rules
        let stuck = (0..self.num_atoms).find(|n| in_degree[*n] > 0);
        Err(stuck.unwrap_or(0))
    }
}

/// Fails with the name of an atom on a cycle of `rules`
pub(crate) fn check_acyclic(
    atoms: &AtomSpace,
    rules: &[Rule],
) -> Result<Vec<usize>, CounterfactualError> {
    AndOrGraph::new(atoms.len(), rules)
        .topological_order()
        .map_err(|n| CounterfactualError::CyclicProgram {
            atom: atoms.name(AtomId::new(n)).to_string(),
        })
}

/// The rules from which one of `roots` is reachable
pub(crate) fn slice(num_atoms: usize, rules: &[Rule], roots: &[AtomId]) -> Vec<Rule> {
    let graph = AndOrGraph::new(num_atoms, rules);
    let relevant = graph.ancestors(roots.iter().map(|a| a.value()));
    let sliced: Vec<Rule> = rules
        .iter()
        .enumerate()
        .filter(|(idx, _)| relevant.contains(graph.rule_node(*idx)))
        .map(|(_, r)| r.clone())
        .collect();
    debug!(before = rules.len(), after = sliced.len(), "sliced program");
    sliced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::AtomLiteral;

    fn id(i: usize) -> AtomId {
        AtomId::new(i)
    }

    /// u(0) -> a(1) -> b(2), v(3) -> c(4)
    fn rules() -> Vec<Rule> {
        vec![
            Rule::new(Some(id(1)), vec![AtomLiteral::pos(id(0))]),
            Rule::new(Some(id(2)), vec![AtomLiteral::neg(id(1))]),
            Rule::new(Some(id(4)), vec![AtomLiteral::pos(id(3))]),
            Rule::constraint(vec![AtomLiteral::pos(id(2))]),
        ]
    }

    #[test]
    fn ancestors_include_roots() {
        let g = AndOrGraph::new(5, &rules());
        let anc = g.ancestors([2]);
        let nodes: Vec<usize> = anc.iter().collect();
        // atoms 0, 1, 2 and rule nodes 5, 6
        assert_eq!(nodes, vec![0, 1, 2, 5, 6]);
        assert_eq!(g.rule_of(6), Some(1));
        assert_eq!(g.rule_of(4), None);
    }

    #[test]
    fn slicing_drops_unrelated_rules() {
        let sliced = slice(5, &rules(), &[id(2)]);
        assert_eq!(sliced, rules()[..2].to_vec());
        let sliced = slice(5, &rules(), &[id(4)]);
        assert_eq!(sliced, vec![rules()[2].clone()]);
    }

    #[test]
    fn topological_order_respects_edges() {
        let g = AndOrGraph::new(5, &rules());
        let order = g.topological_order().unwrap();
        assert_eq!(order.len(), 9);
        let pos = |n: usize| order.iter().position(|m| *m == n).unwrap();
        for n in 0..g.num_nodes() {
            for p in g.preds(n) {
                assert!(pos(*p) < pos(n));
            }
        }
    }

    #[test]
    fn cycles_are_reported() {
        let mut atoms = AtomSpace::new();
        let a = atoms.get_or_insert("a", crate::repr::AtomKind::Derived);
        let b = atoms.get_or_insert("b", crate::repr::AtomKind::Derived);
        let rules = vec![
            Rule::new(Some(a), vec![AtomLiteral::pos(b)]),
            Rule::new(Some(b), vec![AtomLiteral::neg(a)]),
        ];
        match check_acyclic(&atoms, &rules) {
            Err(CounterfactualError::CyclicProgram { atom }) => assert_eq!(atom, "a"),
            other => panic!("expected a cycle, got {:?}", other),
        }
    }
}
