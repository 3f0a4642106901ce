//! The program-duplication transformation.
//!
//! The input program is kept as the *intervention* copy (every derived atom
//! renamed with an `_i` marker) and duplicated into an *evidence* copy over
//! fresh shadow atoms (`_e` marker). Both copies share the guessed atoms, so a
//! joint assignment to the guessed atoms fixes the factual world (seen through
//! the shadows) and the counterfactual world at the same time.

use crate::{
    counterfactual::CounterfactualError,
    repr::{AtomId, AtomKind, AtomLiteral, AtomSpace, GroundRule, Program, Rule},
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Inserts `_marker` in front of the argument list of `name`, or at its end
/// if there is none.
/// ```
/// # use whatif::counterfactual::decorate;
/// assert_eq!(decorate("path(a,b)", "i"), "path_i(a,b)");
/// assert_eq!(decorate("rain", "e"), "rain_e");
/// ```
pub fn decorate(name: &str, marker: &str) -> String {
    match name.find('(') {
        Some(idx) => format!("{}_{}{}", &name[..idx], marker, &name[idx..]),
        None => format!("{}_{}", name, marker),
    }
}

/// Allocates evidence shadows on first reference
pub(crate) struct ShadowBuilder<'a> {
    atoms: &'a mut AtomSpace,
    shadows: FxHashMap<AtomId, AtomId>,
}

impl<'a> ShadowBuilder<'a> {
    pub fn new(atoms: &'a mut AtomSpace) -> ShadowBuilder<'a> {
        ShadowBuilder {
            atoms,
            shadows: FxHashMap::default(),
        }
    }

    pub fn shadow_of(&mut self, atom: AtomId) -> AtomId {
        if let Some(s) = self.shadows.get(&atom) {
            return *s;
        }
        let name = decorate(self.atoms.name(atom), "e");
        let shadow = self.atoms.fresh(&name, AtomKind::Derived);
        self.shadows.insert(atom, shadow);
        shadow
    }

    /// Guessed literals are shared between both copies
    fn shadow_literal(&mut self, lit: AtomLiteral) -> AtomLiteral {
        if self.atoms.is_guessed(lit.atom()) {
            lit
        } else {
            AtomLiteral::new(self.shadow_of(lit.atom()), lit.polarity())
        }
    }

    fn into_map(self) -> FxHashMap<AtomId, AtomId> {
        self.shadows
    }
}

/// The duplicated program
#[derive(Debug, Clone)]
pub(crate) struct Transformed {
    pub atoms: AtomSpace,
    pub rules: Vec<Rule>,
    /// original derived name -> shadow atom
    pub evidence_atoms: BTreeMap<String, AtomId>,
    /// original derived name -> renamed atom
    pub intervention_atoms: BTreeMap<String, AtomId>,
    pub true_atom: AtomId,
}

fn check_rule(atoms: &AtomSpace, rule: &GroundRule) -> Result<Option<AtomId>, CounterfactualError> {
    let malformed = |reason: &str| CounterfactualError::MalformedRule {
        rule: rule.display(atoms).to_string(),
        reason: reason.to_string(),
    };
    match rule.head.as_slice() {
        [] => Ok(None),
        [h] if atoms.is_guessed(*h) => Err(malformed("a guessed atom cannot be derived")),
        [h] => Ok(Some(*h)),
        _ => Err(malformed("disjunctive heads are not supported")),
    }
}

pub(crate) fn duplicate(program: Program) -> Result<Transformed, CounterfactualError> {
    let (mut atoms, input) = program.into_parts();
    for (_, atom) in atoms.iter() {
        if let AtomKind::Guessed(p) = atom.kind() {
            if !(0.0..=1.0).contains(&p) {
                return Err(CounterfactualError::InvalidProbability {
                    name: atom.name().to_string(),
                    probability: p,
                });
            }
        }
    }
    let heads = input
        .iter()
        .map(|r| check_rule(&atoms, r))
        .collect::<Result<Vec<_>, _>>()?;

    let derived: Vec<AtomId> = atoms
        .iter()
        .filter(|(_, a)| !a.kind().is_guessed())
        .map(|(id, _)| id)
        .collect();

    let mut rules = Vec::with_capacity(2 * input.len() + 1);
    let mut evidence_atoms = BTreeMap::new();
    {
        let mut shadows = ShadowBuilder::new(&mut atoms);
        for (rule, head) in input.into_iter().zip(heads) {
            let shadow_head = head.map(|h| shadows.shadow_of(h));
            let shadow_body = rule
                .body
                .iter()
                .map(|l| shadows.shadow_literal(*l))
                .collect();
            rules.push(Rule::new(head, rule.body));
            rules.push(Rule::new(shadow_head, shadow_body));
        }
        let shadows = shadows.into_map();
        for (original, shadow) in shadows {
            evidence_atoms.insert(atoms.name(original).to_string(), shadow);
        }
    }

    let mut intervention_atoms = BTreeMap::new();
    for atom in derived {
        let name = atoms.name(atom).to_string();
        atoms.rename(atom, &decorate(&name, "i"));
        intervention_atoms.insert(name, atom);
    }

    let true_atom = atoms.fresh("true", AtomKind::Derived);
    rules.push(Rule::fact(true_atom));
    debug!(
        atoms = atoms.len(),
        rules = rules.len(),
        shadows = evidence_atoms.len(),
        "duplicated program"
    );
    Ok(Transformed {
        atoms,
        rules,
        evidence_atoms,
        intervention_atoms,
        true_atom,
    })
}
