//! serializable representation of ground programs and query batches

use crate::repr::{AtomId, AtomLiteral, Program};
use std::collections::BTreeMap;

/// A ground rule by atom names; `head` lists more than one atom only for
/// disjunctive rules, which the counterfactual engines reject
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SerRule {
    #[serde(default)]
    pub head: Vec<String>,
    #[serde(default)]
    pub pos: Vec<String>,
    #[serde(default)]
    pub neg: Vec<String>,
}

/// A ground program: every atom named in `probabilities` is guessed, every
/// other atom is derived
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SerProgram {
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
    pub rules: Vec<SerRule>,
}

impl SerProgram {
    /// ```
    /// use whatif::serialize::SerProgram;
    ///
    /// let src = r#"{
    ///     "probabilities": { "u": 0.3 },
    ///     "rules": [ { "head": ["a"], "pos": ["u"] } ]
    /// }"#;
    /// let program = serde_json::from_str::<SerProgram>(src).unwrap().to_program();
    /// assert_eq!(program.atoms().len(), 2);
    /// assert_eq!(program.rules().len(), 1);
    /// ```
    pub fn to_program(&self) -> Program {
        let mut program = Program::new();
        for (name, p) in self.probabilities.iter() {
            program.guessed(name, *p);
        }
        for rule in self.rules.iter() {
            let head: Vec<AtomId> = rule.head.iter().map(|h| program.derived(h)).collect();
            let mut body: Vec<AtomLiteral> = Vec::with_capacity(rule.pos.len() + rule.neg.len());
            for name in rule.pos.iter() {
                body.push(AtomLiteral::pos(program.derived(name)));
            }
            for name in rule.neg.iter() {
                body.push(AtomLiteral::neg(program.derived(name)));
            }
            program.add_rule(&head, &body);
        }
        program
    }

    pub fn from_program(program: &Program) -> SerProgram {
        let atoms = program.atoms();
        let probabilities = atoms
            .iter()
            .filter_map(|(_, a)| a.kind().probability().map(|p| (a.name().to_string(), p)))
            .collect();
        let rules = program
            .rules()
            .iter()
            .map(|r| {
                let names = |pol: bool| -> Vec<String> {
                    r.body
                        .iter()
                        .filter(|l| l.polarity() == pol)
                        .map(|l| atoms.name(l.atom()).to_string())
                        .collect()
                };
                SerRule {
                    head: r.head.iter().map(|h| atoms.name(*h).to_string()).collect(),
                    pos: names(true),
                    neg: names(false),
                }
            })
            .collect();
        SerProgram {
            probabilities,
            rules,
        }
    }

    /// Appends the rules of `other`; a probability given in both keeps
    /// `other`'s value
    pub fn merge(&mut self, other: SerProgram) {
        self.probabilities.extend(other.probabilities);
        self.rules.extend(other.rules);
    }
}

/// One batch of counterfactual queries
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SerQuery {
    #[serde(default)]
    pub interventions: BTreeMap<String, bool>,
    #[serde(default)]
    pub evidence: BTreeMap<String, bool>,
    pub queries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::AtomKind;

    #[test]
    fn program_survives_json() {
        let mut p = Program::new();
        let u = p.guessed("u", 0.25);
        let a = p.derived("a");
        let b = p.derived("b(1,2)");
        p.add_rule(&[a], &[AtomLiteral::pos(u)]);
        p.add_rule(&[b], &[AtomLiteral::pos(a), AtomLiteral::neg(u)]);

        let json = serde_json::to_string(&SerProgram::from_program(&p)).unwrap();
        let back = serde_json::from_str::<SerProgram>(&json).unwrap().to_program();
        let u2 = back.atoms().id("u").unwrap();
        assert_eq!(back.atoms().kind(u2), AtomKind::Guessed(0.25));
        assert_eq!(back.rules().len(), 2);
        assert_eq!(
            back.rules()[1].display(back.atoms()).to_string(),
            "b(1,2) :- a, not u."
        );
    }

    #[test]
    fn merged_programs_share_atoms() {
        let mut first: SerProgram = serde_json::from_str(
            r#"{ "probabilities": { "u": 0.5 }, "rules": [ { "head": ["a"], "pos": ["u"] } ] }"#,
        )
        .unwrap();
        let second: SerProgram = serde_json::from_str(
            r#"{ "probabilities": { "u": 0.2 }, "rules": [ { "head": ["b"], "neg": ["a"] } ] }"#,
        )
        .unwrap();
        first.merge(second);
        let p = first.to_program();
        assert_eq!(p.atoms().len(), 3);
        assert_eq!(p.rules().len(), 2);
        let u = p.atoms().id("u").unwrap();
        assert_eq!(p.atoms().kind(u), AtomKind::Guessed(0.2));
    }

    #[test]
    fn query_defaults() {
        let q: SerQuery = serde_json::from_str(r#"{ "queries": ["c"] }"#).unwrap();
        assert!(q.interventions.is_empty());
        assert!(q.evidence.is_empty());
        assert_eq!(q.queries, vec!["c".to_string()]);
    }
}
