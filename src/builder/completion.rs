//! Clark completion of an acyclic normal program into CNF.
//!
//! Every atom becomes a variable: guessed atoms first, then derived atoms,
//! then one auxiliary variable per rule body with more than one literal. For a
//! derived atom `a` with rule bodies `B1 .. Bk` the completion asserts
//! `a <=> B1 | .. | Bk`; a constraint `:- B` asserts `!B`. For acyclic
//! programs every assignment to the guessed variables extends to exactly one
//! model, so the weighted model count of the CNF is a probability.

use crate::{
    repr::{AtomId, AtomKind, AtomLiteral, AtomSpace, Cnf, Literal, Rule, VarLabel, WmcParams},
    util::semirings::RealSemiring,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Completion {
    cnf: Cnf,
    atom_to_var: FxHashMap<AtomId, VarLabel>,
    num_aux: usize,
    weights: WmcParams<RealSemiring>,
}

impl Completion {
    /// Completes `rules`. Atoms in `roots` receive a variable even when no
    /// rule mentions them (and are then false).
    pub fn new(atoms: &AtomSpace, rules: &[Rule], roots: &[AtomId]) -> Completion {
        let mentioned: BTreeSet<AtomId> = rules
            .iter()
            .flat_map(|r| r.head.iter().copied().chain(r.body.iter().map(|l| l.atom())))
            .chain(roots.iter().copied())
            .collect();
        let (guessed, derived): (Vec<AtomId>, Vec<AtomId>) =
            mentioned.into_iter().partition(|a| atoms.is_guessed(*a));

        let mut atom_to_var = FxHashMap::default();
        let mut weights = WmcParams::default();
        for (idx, atom) in guessed.iter().chain(derived.iter()).enumerate() {
            let label = VarLabel::new_usize(idx);
            atom_to_var.insert(*atom, label);
            if let AtomKind::Guessed(p) = atoms.kind(*atom) {
                weights.set_weight(label, RealSemiring(1.0 - p), RealSemiring(p));
            } else {
                weights.set_weight(label, RealSemiring(1.0), RealSemiring(1.0));
            }
        }

        let mut by_head: FxHashMap<AtomId, Vec<&Rule>> = FxHashMap::default();
        for r in rules.iter() {
            if let Some(h) = r.head {
                by_head.entry(h).or_default().push(r);
            }
        }

        let mut builder = ClauseBuilder {
            atom_to_var: &atom_to_var,
            next_var: guessed.len() + derived.len(),
            clauses: Vec::new(),
        };
        for atom in derived.iter() {
            let a = builder.lit(AtomLiteral::pos(*atom));
            let bodies = by_head.get(atom).map(Vec::as_slice).unwrap_or(&[]);
            if bodies.iter().any(|r| r.body.is_empty()) {
                builder.clauses.push(vec![a]);
                continue;
            }
            let terms: Vec<Literal> = bodies.iter().map(|r| builder.term(&r.body)).collect();
            // a => t1 | .. | tk
            let mut support = vec![a.negated()];
            support.extend(terms.iter().copied());
            builder.clauses.push(support);
            // ti => a
            for t in terms {
                builder.clauses.push(vec![t.negated(), a]);
            }
        }
        for r in rules.iter().filter(|r| r.is_constraint()) {
            let clause = r.body.iter().map(|l| builder.lit(l.negated())).collect();
            builder.clauses.push(clause);
        }

        let num_vars = builder.next_var;
        let num_aux = num_vars - guessed.len() - derived.len();
        for aux in guessed.len() + derived.len()..num_vars {
            weights.set_weight(
                VarLabel::new_usize(aux),
                RealSemiring(1.0),
                RealSemiring(1.0),
            );
        }
        let cnf = Cnf::with_num_vars(builder.clauses, num_vars);
        debug!(
            guessed = guessed.len(),
            derived = derived.len(),
            aux = num_aux,
            clauses = cnf.clauses().len(),
            "completed program"
        );
        Completion {
            cnf,
            atom_to_var,
            num_aux,
            weights,
        }
    }

    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// The variable standing for `atom`, if the atom is part of the completion
    pub fn var(&self, atom: AtomId) -> Option<VarLabel> {
        self.atom_to_var.get(&atom).copied()
    }

    pub fn num_aux(&self) -> usize {
        self.num_aux
    }

    /// Weights of every variable: guessed atoms `(1 - p, p)`, all others
    /// `(1, 1)`
    pub fn base_weights(&self) -> &WmcParams<RealSemiring> {
        &self.weights
    }
}

struct ClauseBuilder<'a> {
    atom_to_var: &'a FxHashMap<AtomId, VarLabel>,
    next_var: usize,
    clauses: Vec<Vec<Literal>>,
}

impl<'a> ClauseBuilder<'a> {
    fn lit(&self, l: AtomLiteral) -> Literal {
        Literal::new(self.atom_to_var[&l.atom()], l.polarity())
    }

    /// A literal equivalent to the conjunction `body` (which is non-empty)
    fn term(&mut self, body: &[AtomLiteral]) -> Literal {
        if body.len() == 1 {
            return self.lit(body[0]);
        }
        let aux = Literal::new(VarLabel::new_usize(self.next_var), true);
        self.next_var += 1;
        let lits: Vec<Literal> = body.iter().map(|l| self.lit(*l)).collect();
        // aux => li
        for l in lits.iter() {
            self.clauses.push(vec![aux.negated(), *l]);
        }
        // l1 & .. & ln => aux
        let mut back: Vec<Literal> = lits.iter().map(|l| l.negated()).collect();
        back.push(aux);
        self.clauses.push(back);
        aux
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::Program;

    #[test]
    fn guessed_atoms_come_first() {
        let mut p = Program::new();
        let a = p.derived("a");
        let u = p.guessed("u", 0.25);
        let rules = vec![Rule::new(Some(a), vec![AtomLiteral::pos(u)])];
        let c = Completion::new(p.atoms(), &rules, &[a]);
        assert_eq!(c.var(u), Some(VarLabel::new(0)));
        assert_eq!(c.var(a), Some(VarLabel::new(1)));
        assert_eq!(c.num_aux(), 0);
        assert_eq!(
            c.base_weights().var_weight(VarLabel::new(0)),
            (RealSemiring(0.75), RealSemiring(0.25))
        );
        // a => u, u => a
        assert_eq!(c.cnf().clauses().len(), 2);
    }

    #[test]
    fn long_bodies_get_aux_vars() {
        let mut p = Program::new();
        let a = p.derived("a");
        let u = p.guessed("u", 0.5);
        let v = p.guessed("v", 0.5);
        let rules = vec![
            Rule::new(Some(a), vec![AtomLiteral::pos(u), AtomLiteral::neg(v)]),
            Rule::new(Some(a), vec![AtomLiteral::pos(v)]),
        ];
        let c = Completion::new(p.atoms(), &rules, &[]);
        assert_eq!(c.num_aux(), 1);
        assert_eq!(c.cnf().num_vars(), 4);
        // 3 clauses for the aux, 1 support clause, 2 back implications
        assert_eq!(c.cnf().clauses().len(), 6);
    }

    #[test]
    fn unsupported_roots_are_false() {
        let mut p = Program::new();
        let a = p.derived("a");
        let c = Completion::new(p.atoms(), &[], &[a]);
        assert_eq!(c.cnf().clauses(), &[vec![Literal::new(VarLabel::new(0), false)]]);
    }

    #[test]
    fn facts_are_units() {
        let mut p = Program::new();
        let t = p.derived("true");
        let c = Completion::new(p.atoms(), &[Rule::fact(t)], &[]);
        assert_eq!(c.cnf().clauses(), &[vec![Literal::new(VarLabel::new(0), true)]]);
    }

    #[test]
    fn constraints_negate_their_body() {
        let mut p = Program::new();
        let u = p.guessed("u", 0.5);
        let c = Completion::new(p.atoms(), &[Rule::constraint(vec![AtomLiteral::neg(u)])], &[]);
        assert_eq!(c.cnf().clauses(), &[vec![Literal::new(VarLabel::new(0), true)]]);
    }
}
