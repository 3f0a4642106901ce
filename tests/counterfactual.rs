//! Scenario tests of the counterfactual entry points

#[macro_use]
extern crate maplit;
extern crate whatif;

use std::collections::HashMap;
use whatif::counterfactual::{AtomRole, CounterfactualError, CounterfactualProgram, Strategy};
use whatif::repr::{AtomLiteral, Program};
use whatif::serialize::SerProgram;

fn strategies() -> Vec<Strategy> {
    vec![Strategy::TopDown, Strategy::BottomUp]
}

fn assert_close(got: &[f64], expected: &[f64]) {
    assert_eq!(got.len(), expected.len(), "got {:?}", got);
    for (g, e) in got.iter().zip(expected.iter()) {
        assert!((g - e).abs() < 1e-9, "got {:?}, expected {:?}", got, expected);
    }
}

/// a :- u1.  b :- a.  b :- u2.
fn chain() -> Program {
    let mut p = Program::new();
    let u1 = p.guessed("u1", 0.5);
    let u2 = p.guessed("u2", 0.2);
    let a = p.derived("a");
    let b = p.derived("b");
    p.add_rule(&[a], &[AtomLiteral::pos(u1)]);
    p.add_rule(&[b], &[AtomLiteral::pos(a)]);
    p.add_rule(&[b], &[AtomLiteral::pos(u2)]);
    p
}

fn none() -> HashMap<&'static str, bool> {
    HashMap::new()
}

#[test]
fn plain_marginals_without_interventions_or_evidence() {
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    for s in strategies() {
        let single = program.single_query(&none(), &none(), &["a", "b"], &s).unwrap();
        assert_close(&single, &[0.5, 0.6]);
        let multi = program.multi_query(&none(), &none(), &["a", "b"], &s).unwrap();
        assert_close(&multi, &[0.5, 0.6]);
    }
}

#[test]
fn negative_intervention_cuts_the_chain() {
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    let interventions = hashmap! { "a" => false };
    for s in strategies() {
        let r = program.single_query(&interventions, &none(), &["a", "b"], &s).unwrap();
        assert_close(&r, &[0.0, 0.2]);
        let r = program.multi_query(&interventions, &none(), &["a", "b"], &s).unwrap();
        assert_close(&r, &[0.0, 0.2]);
    }
}

#[test]
fn evidence_is_observed_in_the_factual_world() {
    // b was observed; had a been false, b would only hold through u2:
    // P(u2 | b) = 0.2 / 0.6
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    let interventions = hashmap! { "a" => false };
    let evidence = hashmap! { "b" => true };
    for s in strategies() {
        let r = program.single_query(&interventions, &evidence, &["b", "a"], &s).unwrap();
        assert_close(&r, &[1.0 / 3.0, 0.0]);
        let r = program.multi_query(&interventions, &evidence, &["b", "a"], &s).unwrap();
        assert_close(&r, &[1.0 / 3.0, 0.0]);
    }
}

#[test]
fn evidence_on_an_unrelated_cause() {
    // observing not u1 through a leaves b to u2 alone
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    let evidence = hashmap! { "a" => false };
    for s in strategies() {
        let r = program.single_query(&none(), &evidence, &["b"], &s).unwrap();
        assert_close(&r, &[0.2]);
        let r = program.multi_query(&none(), &evidence, &["b"], &s).unwrap();
        assert_close(&r, &[0.2]);
    }
}

#[test]
fn positive_intervention_removes_upstream_dependence() {
    let build = |p1: f64| {
        let mut p = Program::new();
        let u1 = p.guessed("u1", p1);
        let a = p.derived("a");
        let b = p.derived("b");
        p.add_rule(&[a], &[AtomLiteral::pos(u1)]);
        p.add_rule(&[b], &[AtomLiteral::pos(a)]);
        CounterfactualProgram::new(p).unwrap()
    };
    let interventions = hashmap! { "a" => true };
    for s in strategies() {
        for p1 in [0.1, 0.5, 0.9] {
            let r = build(p1)
                .single_query(&interventions, &none(), &["b"], &s)
                .unwrap();
            assert_close(&r, &[1.0]);
        }
    }
}

#[test]
fn interventions_on_atoms_without_rules() {
    // a :- u.  a :- c.  with c heading no rule
    let mut p = Program::new();
    let u = p.guessed("u", 0.5);
    let a = p.derived("a");
    let c = p.derived("c");
    p.add_rule(&[a], &[AtomLiteral::pos(u)]);
    p.add_rule(&[a], &[AtomLiteral::pos(c)]);
    let mut program = CounterfactualProgram::new(p).unwrap();
    for s in strategies() {
        for (value, expected) in [(false, [0.5, 0.0]), (true, [1.0, 1.0])] {
            let interventions = hashmap! { "c" => value };
            let single = program.single_query(&interventions, &none(), &["a", "c"], &s).unwrap();
            assert_close(&single, &expected);
            let multi = program.multi_query(&interventions, &none(), &["a", "c"], &s).unwrap();
            assert_close(&multi, &expected);
        }
    }
}

#[test]
fn evidence_probability_is_the_normalizer() {
    let program = CounterfactualProgram::new(chain()).unwrap();
    for s in strategies() {
        let z = program.evidence_probability(&none(), &s).unwrap();
        assert!((z - 1.0).abs() < 1e-9);
        let z = program.evidence_probability(&hashmap! { "b" => true }, &s).unwrap();
        assert!((z - 0.6).abs() < 1e-9);
        let z = program.evidence_probability(&hashmap! { "a" => false, "b" => true }, &s).unwrap();
        assert!((z - 0.1).abs() < 1e-9);
    }
}

#[test]
fn facts_are_certain() {
    let mut p = chain();
    let c = p.derived("c");
    p.add_fact(c);
    let mut program = CounterfactualProgram::new(p).unwrap();
    for s in strategies() {
        let r = program.single_query(&none(), &none(), &["c"], &s).unwrap();
        assert_close(&r, &[1.0]);
        let r = program
            .multi_query(&none(), &hashmap! { "b" => true }, &["c"], &s)
            .unwrap();
        assert_close(&r, &[1.0]);
    }
}

#[test]
fn contradictory_evidence_is_an_error() {
    let mut p = chain();
    let c = p.derived("c");
    p.add_fact(c);
    let mut program = CounterfactualProgram::new(p).unwrap();
    let evidence = hashmap! { "c" => false };
    for s in strategies() {
        assert!(matches!(
            program.single_query(&none(), &evidence, &["b"], &s),
            Err(CounterfactualError::ContradictoryEvidence { probability }) if probability == 0.0
        ));
        assert!(matches!(
            program.multi_query(&none(), &evidence, &["b"], &s),
            Err(CounterfactualError::ContradictoryEvidence { .. })
        ));
    }
}

#[test]
fn interventions_do_not_affect_the_evidence_copy() {
    // forcing a does not make the observation of not-a impossible
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    let interventions = hashmap! { "a" => true };
    let evidence = hashmap! { "a" => false };
    for s in strategies() {
        let r = program.multi_query(&interventions, &evidence, &["a", "b"], &s).unwrap();
        assert_close(&r, &[1.0, 1.0]);
    }
}

#[test]
fn unknown_names_are_reported_with_their_role() {
    let program = CounterfactualProgram::new(chain()).unwrap();
    let s = Strategy::TopDown;
    match program.single_query(&none(), &none(), &["nope"], &s) {
        Err(CounterfactualError::UnknownAtom { name, role }) => {
            assert_eq!(name, "nope");
            assert_eq!(role, AtomRole::Query);
        }
        other => panic!("expected an unknown atom, got {:?}", other),
    }
    // guessed atoms can be neither observed nor intervened on
    assert!(matches!(
        program.single_query(&none(), &hashmap! { "u1" => true }, &["b"], &s),
        Err(CounterfactualError::UnknownAtom { role: AtomRole::Evidence, .. })
    ));
    assert!(matches!(
        program.single_query(&hashmap! { "u1" => true }, &none(), &["b"], &s),
        Err(CounterfactualError::UnknownAtom { role: AtomRole::Intervention, .. })
    ));
}

#[test]
fn malformed_and_cyclic_programs_are_rejected() {
    let mut p = chain();
    let u1 = p.guessed("u1", 0.5);
    let a = p.derived("a");
    p.add_rule(&[u1], &[AtomLiteral::pos(a)]);
    assert!(matches!(
        CounterfactualProgram::new(p),
        Err(CounterfactualError::MalformedRule { .. })
    ));

    let mut p = chain();
    let a = p.derived("a");
    let b = p.derived("b");
    p.add_rule(&[a], &[AtomLiteral::neg(b)]);
    assert!(matches!(
        CounterfactualProgram::new(p),
        Err(CounterfactualError::CyclicProgram { .. })
    ));
}

#[test]
fn repeated_single_queries_are_identical() {
    let program = CounterfactualProgram::new(chain()).unwrap();
    let interventions = hashmap! { "a" => false };
    let evidence = hashmap! { "b" => true, "a" => true };
    for s in strategies() {
        let first = program.single_query(&interventions, &evidence, &["a", "b"], &s).unwrap();
        for _ in 0..5 {
            let again = program.single_query(&interventions, &evidence, &["a", "b"], &s).unwrap();
            assert_eq!(first, again);
        }
    }
}

#[test]
fn bottom_up_batches_share_the_apply_cache() {
    let mut program = CounterfactualProgram::new(chain()).unwrap();
    assert!(program.apply_cache().is_none());
    let s = Strategy::BottomUp;
    let evidence = hashmap! { "b" => true };
    program.multi_query(&none(), &evidence, &["a"], &s).unwrap();
    let (entries, hits) = {
        let c = program.apply_cache().unwrap();
        (c.len(), c.hits())
    };
    program.multi_query(&none(), &evidence, &["a"], &s).unwrap();
    let c = program.apply_cache().unwrap();
    assert_eq!(c.len(), entries);
    assert!(c.hits() > hits);
}

#[test]
fn names_with_arguments() {
    let src = r#"{
        "probabilities": { "edge(x,y)": 0.4, "edge(y,z)": 0.5 },
        "rules": [
            { "head": ["path(x,y)"], "pos": ["edge(x,y)"] },
            { "head": ["path(y,z)"], "pos": ["edge(y,z)"] },
            { "head": ["path(x,z)"], "pos": ["path(x,y)", "path(y,z)"] }
        ]
    }"#;
    let p = serde_json::from_str::<SerProgram>(src).unwrap().to_program();
    let program = CounterfactualProgram::new(p).unwrap();
    let a = program.intervention_atom("path(x,z)").unwrap();
    assert_eq!(program.atoms().name(a), "path_i(x,z)");
    let e = program.evidence_atom("path(x,z)").unwrap();
    assert_eq!(program.atoms().name(e), "path_e(x,z)");
    let r = program
        .single_query(
            &hashmap! { "path(x,y)" => true },
            &none(),
            &["path(x,z)"],
            &Strategy::TopDown,
        )
        .unwrap();
    assert_close(&r, &[0.5]);
}

#[test]
fn strategies_parse_from_names() {
    assert_eq!("bottom-up".parse::<Strategy>().unwrap(), Strategy::BottomUp);
    assert!(matches!(
        "sat".parse::<Strategy>(),
        Err(CounterfactualError::UnsupportedStrategy(_))
    ));
}
