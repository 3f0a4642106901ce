//! Name resolution and the per-batch rewrites shared by the engines.

use crate::{
    counterfactual::{AtomRole, CounterfactualError},
    repr::{AtomId, AtomLiteral, Rule},
};
use std::collections::{BTreeMap, HashMap};

/// A query batch with every name resolved to an atom of the transformed
/// program. Interventions and evidence are sorted by atom so that evaluation
/// does not depend on the caller's map iteration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedQuery {
    /// intervention atom -> forced value
    pub interventions: BTreeMap<AtomId, bool>,
    /// shadow atom -> observed value
    pub evidence: BTreeMap<AtomId, bool>,
    /// intervention atoms, in the caller's order
    pub queries: Vec<AtomId>,
}

impl ResolvedQuery {
    pub fn resolve<S: AsRef<str>>(
        evidence_atoms: &BTreeMap<String, AtomId>,
        intervention_atoms: &BTreeMap<String, AtomId>,
        interventions: &HashMap<S, bool>,
        evidence: &HashMap<S, bool>,
        queries: &[S],
    ) -> Result<ResolvedQuery, CounterfactualError> {
        let lookup = |map: &BTreeMap<String, AtomId>, name: &str, role| {
            map.get(name)
                .copied()
                .ok_or_else(|| CounterfactualError::UnknownAtom {
                    name: name.to_string(),
                    role,
                })
        };
        let interventions: BTreeMap<AtomId, bool> = interventions
            .iter()
            .map(|(n, v)| Ok((lookup(intervention_atoms, n.as_ref(), AtomRole::Intervention)?, *v)))
            .collect::<Result<_, CounterfactualError>>()?;
        let evidence: BTreeMap<AtomId, bool> = evidence
            .iter()
            .map(|(n, v)| Ok((lookup(evidence_atoms, n.as_ref(), AtomRole::Evidence)?, *v)))
            .collect::<Result<_, CounterfactualError>>()?;
        let queries: Vec<AtomId> = queries
            .iter()
            .map(|n| lookup(intervention_atoms, n.as_ref(), AtomRole::Query))
            .collect::<Result<_, _>>()?;
        Ok(ResolvedQuery {
            interventions,
            evidence,
            queries,
        })
    }

    /// Shadow atoms and query atoms, the roots of the relevant slice
    pub fn roots(&self) -> Vec<AtomId> {
        self.queries
            .iter()
            .chain(self.evidence.keys())
            .copied()
            .collect()
    }

    /// One fact per atom forced to true
    pub fn forcing_facts(&self) -> Vec<Rule> {
        self.interventions
            .iter()
            .filter(|(_, v)| **v)
            .map(|(a, _)| Rule::fact(*a))
            .collect()
    }

    /// One constraint per observation, discarding the worlds that disagree
    /// with it
    pub fn evidence_constraints(&self) -> Vec<Rule> {
        self.evidence
            .iter()
            .map(|(a, v)| Rule::constraint(vec![AtomLiteral::new(*a, !*v)]))
            .collect()
    }
}

/// How literals over intervened atoms are treated by [`intervene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralPolicy {
    /// drop literals that agree with the forced value
    Drop,
    /// keep them, so rule bodies stay a subset of the input rules
    Keep,
}

/// Cuts the intervened atoms loose from their causes. Returns the indices of
/// the surviving rules together with the rewritten rules.
///
/// A rule headed by an intervened atom is dropped. A literal over an
/// intervened atom that contradicts the forced value drops its whole rule.
pub(crate) fn intervene(
    rules: &[Rule],
    interventions: &BTreeMap<AtomId, bool>,
    policy: LiteralPolicy,
) -> Vec<(usize, Rule)> {
    let mut out = Vec::with_capacity(rules.len());
    'rules: for (idx, rule) in rules.iter().enumerate() {
        if let Some(h) = rule.head {
            if interventions.contains_key(&h) {
                continue;
            }
        }
        let mut body = Vec::with_capacity(rule.body.len());
        for lit in rule.body.iter() {
            match interventions.get(&lit.atom()) {
                None => body.push(*lit),
                Some(v) if *v != lit.polarity() => continue 'rules,
                Some(_) => {
                    if policy == LiteralPolicy::Keep {
                        body.push(*lit)
                    }
                }
            }
        }
        out.push((idx, Rule::new(rule.head, body)));
    }
    out
}

/// Divides by the first value, the probability of the evidence
pub(crate) fn normalize(values: &[f64]) -> Result<Vec<f64>, CounterfactualError> {
    let (norm, rest) = match values.split_first() {
        Some(s) => s,
        None => return Ok(Vec::new()),
    };
    if !(*norm > 0.0) {
        return Err(CounterfactualError::ContradictoryEvidence { probability: *norm });
    }
    Ok(rest.iter().map(|v| v / norm).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::{btreemap, hashmap};

    fn id(i: usize) -> AtomId {
        AtomId::new(i)
    }

    #[test]
    fn resolves_names_by_role() {
        let evidence_atoms = btreemap! { "a".to_string() => id(5) };
        let intervention_atoms = btreemap! { "a".to_string() => id(2), "b".to_string() => id(3) };
        let q = ResolvedQuery::resolve(
            &evidence_atoms,
            &intervention_atoms,
            &hashmap! { "b" => false },
            &hashmap! { "a" => true },
            &["a", "b"],
        )
        .unwrap();
        assert_eq!(q.interventions, btreemap! { id(3) => false });
        assert_eq!(q.evidence, btreemap! { id(5) => true });
        assert_eq!(q.queries, vec![id(2), id(3)]);
        assert_eq!(q.roots(), vec![id(2), id(3), id(5)]);
        assert!(q.forcing_facts().is_empty());
        assert_eq!(
            q.evidence_constraints(),
            vec![Rule::constraint(vec![AtomLiteral::neg(id(5))])]
        );
    }

    #[test]
    fn unknown_names_report_their_role() {
        let evidence_atoms = btreemap! { "a".to_string() => id(5) };
        let intervention_atoms = btreemap! { "a".to_string() => id(2) };
        let err = ResolvedQuery::resolve(
            &evidence_atoms,
            &intervention_atoms,
            &HashMap::new(),
            &hashmap! { "zzz" => true },
            &["a"],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CounterfactualError::UnknownAtom { role: AtomRole::Evidence, ref name } if name == "zzz"
        ));
    }

    #[test]
    fn intervened_heads_and_contradicted_bodies_are_dropped() {
        let (a, b, c) = (id(0), id(1), id(2));
        let rules = vec![
            Rule::new(Some(a), vec![]),
            Rule::new(Some(b), vec![AtomLiteral::pos(a), AtomLiteral::neg(c)]),
            Rule::new(Some(c), vec![AtomLiteral::neg(a)]),
        ];
        let forced = btreemap! { a => true };
        let dropped = intervene(&rules, &forced, LiteralPolicy::Drop);
        assert_eq!(
            dropped,
            vec![(1, Rule::new(Some(b), vec![AtomLiteral::neg(c)]))]
        );
        let kept = intervene(&rules, &forced, LiteralPolicy::Keep);
        assert_eq!(kept, vec![(1, rules[1].clone())]);
    }

    #[test]
    fn normalizes_by_the_first_slot() {
        assert_eq!(normalize(&[0.5, 0.25, 0.5]).unwrap(), vec![0.5, 1.0]);
        assert!(matches!(
            normalize(&[0.0, 0.0]),
            Err(CounterfactualError::ContradictoryEvidence { .. })
        ));
        assert!(normalize(&[f64::NAN, 0.1]).is_err());
    }
}
