//! The top-down engine: one compiled circuit shared by every query batch.
//!
//! Each intervention atom `a` receives two guessed conditioner atoms `do(a)`
//! and `dont(a)` of probability zero, the rules `a :- .., not dont(a)` and
//! `a :- do(a)`. Raising the weight of `do(a)` to one forces `a`, raising
//! `dont(a)` cuts `a` off from its rules. Batches differ only in weights, so
//! the program is completed and compiled once.

use crate::{
    builder::{completion::Completion, decision_nnf::KnowledgeCompiler},
    counterfactual::{graph::slice, query::ResolvedQuery, AtomRole, CounterfactualError, Strategy},
    repr::{AtomId, AtomKind, AtomLiteral, AtomSpace, Literal, NnfCircuit, Rule, VarLabel},
    util::semirings::RealSemiring,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::iter;
use tracing::info;

/// The conditioner atoms of one intervention atom
#[derive(Debug, Clone, Copy)]
struct Conditioners {
    force: AtomId,
    cut: AtomId,
}

pub(crate) struct TopDownSession {
    strategy: Strategy,
    atoms: AtomSpace,
    completion: Completion,
    circuit: NnfCircuit,
    conditioners: FxHashMap<AtomId, Conditioners>,
    true_atom: AtomId,
}

impl TopDownSession {
    pub fn new(
        atoms: &AtomSpace,
        rules: &[Rule],
        evidence_atoms: &BTreeMap<String, AtomId>,
        intervention_atoms: &BTreeMap<String, AtomId>,
        true_atom: AtomId,
        strategy: Strategy,
        compiler: &dyn KnowledgeCompiler,
    ) -> Result<TopDownSession, CounterfactualError> {
        let mut atoms = atoms.clone();
        let mut conditioners = FxHashMap::default();
        for (name, atom) in intervention_atoms.iter() {
            let force = atoms.fresh(&format!("do({})", name), AtomKind::Guessed(0.0));
            let cut = atoms.fresh(&format!("dont({})", name), AtomKind::Guessed(0.0));
            conditioners.insert(*atom, Conditioners { force, cut });
        }

        let mut conditioned: Vec<Rule> = rules
            .iter()
            .map(|r| {
                let mut r = r.clone();
                if let Some(c) = r.head.and_then(|h| conditioners.get(&h)) {
                    r.body.push(AtomLiteral::neg(c.cut));
                }
                r
            })
            .collect();
        for atom in intervention_atoms.values() {
            let c = conditioners[atom];
            conditioned.push(Rule::new(Some(*atom), vec![AtomLiteral::pos(c.force)]));
        }

        let roots: Vec<AtomId> = iter::once(true_atom)
            .chain(intervention_atoms.values().copied())
            .chain(evidence_atoms.values().copied())
            .collect();
        let sliced = slice(atoms.len(), &conditioned, &roots);
        // a conditioner of an atom heading no rule occurs in no body, it still
        // needs a variable to carry its weight
        let completion_roots: Vec<AtomId> = roots
            .iter()
            .copied()
            .chain(conditioners.values().flat_map(|c| [c.force, c.cut]))
            .collect();
        let completion = Completion::new(&atoms, &sliced, &completion_roots);
        let circuit = compiler.compile(completion.cnf())?;
        info!(
            compiler = compiler.name(),
            vars = completion.cnf().num_vars(),
            clauses = completion.cnf().clauses().len(),
            nodes = circuit.num_nodes(),
            "compiled shared circuit"
        );
        Ok(TopDownSession {
            strategy,
            atoms,
            completion,
            circuit,
            conditioners,
            true_atom,
        })
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    fn var(&self, atom: AtomId, role: AtomRole) -> Result<VarLabel, CounterfactualError> {
        self.completion
            .var(atom)
            .ok_or_else(|| CounterfactualError::UnknownAtom {
                name: self.atoms.name(atom).to_string(),
                role,
            })
    }

    /// Unnormalized probabilities of the evidence followed by each query
    /// conjoined with the evidence
    pub fn evaluate(&self, q: &ResolvedQuery) -> Result<Vec<f64>, CounterfactualError> {
        let zero = RealSemiring(0.0);
        let mut weights = self.completion.base_weights().clone();
        for (atom, value) in q.interventions.iter() {
            let c = self.conditioners.get(atom).ok_or_else(|| CounterfactualError::UnknownAtom {
                name: self.atoms.name(*atom).to_string(),
                role: AtomRole::Intervention,
            })?;
            let chosen = if *value { c.force } else { c.cut };
            let label = self.var(chosen, AtomRole::Intervention)?;
            weights.set_weight(label, zero, RealSemiring(1.0));
        }
        for (atom, value) in q.evidence.iter() {
            let label = self.var(*atom, AtomRole::Evidence)?;
            weights.set_literal_weight(Literal::new(label, !*value), zero);
        }

        iter::once(self.true_atom)
            .chain(q.queries.iter().copied())
            .map(|atom| {
                let label = self.var(atom, AtomRole::Query)?;
                let mut params = weights.clone();
                params.set_literal_weight(Literal::new(label, false), zero);
                Ok(self.circuit.wmc(&params).0)
            })
            .collect()
    }
}
