//! One-shot evaluation: rewrite, slice and evaluate from scratch per batch.

use crate::{
    builder::{completion::Completion, decision_nnf::KnowledgeCompiler},
    counterfactual::{
        bottom_up,
        graph::slice,
        query::{intervene, LiteralPolicy, ResolvedQuery},
        CounterfactualError, Strategy,
    },
    repr::{AtomId, AtomSpace, Literal, Rule, WmcParams},
    util::semirings::RealSemiring,
};
use std::iter;
use tracing::debug;

/// The intervened, sliced program of one batch with its evidence turned into
/// constraints
pub(crate) fn batch_program(
    atoms: &AtomSpace,
    rules: &[Rule],
    true_atom: AtomId,
    q: &ResolvedQuery,
) -> Vec<Rule> {
    let mut intervened: Vec<Rule> = intervene(rules, &q.interventions, LiteralPolicy::Drop)
        .into_iter()
        .map(|(_, r)| r)
        .collect();
    intervened.extend(q.forcing_facts());
    let mut sliced = slice(atoms.len(), &intervened, &q.roots());
    sliced.push(Rule::fact(true_atom));
    sliced.extend(q.evidence_constraints());
    sliced
}

/// Weighted model counts of `queries` under the completion of `rules`
fn compile_and_count(
    atoms: &AtomSpace,
    rules: &[Rule],
    queries: &[AtomId],
    compiler: &dyn KnowledgeCompiler,
) -> Result<Vec<f64>, CounterfactualError> {
    let completion = Completion::new(atoms, rules, queries);
    let params: Vec<WmcParams<RealSemiring>> = queries
        .iter()
        .map(|q| {
            let mut p = completion.base_weights().clone();
            if let Some(label) = completion.var(*q) {
                p.set_literal_weight(Literal::new(label, false), RealSemiring(0.0));
            }
            p
        })
        .collect();
    let values = compiler.compile_and_evaluate(completion.cnf(), &params)?;
    Ok(values.into_iter().map(|v| v.0).collect())
}

/// Unnormalized probabilities of the evidence followed by each query
/// conjoined with the evidence
pub(crate) fn evaluate(
    atoms: &AtomSpace,
    rules: &[Rule],
    true_atom: AtomId,
    q: &ResolvedQuery,
    strategy: &Strategy,
) -> Result<Vec<f64>, CounterfactualError> {
    let program = batch_program(atoms, rules, true_atom, q);
    let queries: Vec<AtomId> = iter::once(true_atom)
        .chain(q.queries.iter().copied())
        .collect();
    debug!(rules = program.len(), %strategy, "evaluating single query");
    match strategy.compiler() {
        Some(compiler) => compile_and_count(atoms, &program, &queries, compiler.as_ref()),
        None => bottom_up::count(atoms, &program, &queries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{AtomKind, AtomLiteral};
    use maplit::btreemap;

    #[test]
    fn batch_program_rewrites_and_slices() {
        let mut atoms = AtomSpace::new();
        let u = atoms.get_or_insert("u", AtomKind::Guessed(0.5));
        let a = atoms.get_or_insert("a_i", AtomKind::Derived);
        let b = atoms.get_or_insert("b_i", AtomKind::Derived);
        let c = atoms.get_or_insert("c_i", AtomKind::Derived);
        let b_e = atoms.get_or_insert("b_e", AtomKind::Derived);
        let t = atoms.get_or_insert("true", AtomKind::Derived);
        let rules = vec![
            Rule::new(Some(a), vec![AtomLiteral::pos(u)]),
            Rule::new(Some(b), vec![AtomLiteral::pos(a), AtomLiteral::neg(u)]),
            Rule::new(Some(c), vec![AtomLiteral::neg(u)]),
            Rule::new(Some(b_e), vec![AtomLiteral::pos(u)]),
            Rule::fact(t),
        ];
        let q = ResolvedQuery {
            interventions: btreemap! { a => true },
            evidence: btreemap! { b_e => false },
            queries: vec![b],
        };
        let shown: Vec<String> = batch_program(&atoms, &rules, t, &q)
            .iter()
            .map(|r| r.display(&atoms).to_string())
            .collect();
        assert_eq!(
            shown,
            vec!["b_i :- not u.", "b_e :- u.", "true.", ":- b_e."]
        );
    }
}
