//! A unit propagator with a decision trail, used by top-down compilation.
//!
//! Each literal keeps an occurrence list of the clauses it appears in. When a
//! literal becomes true, only the clauses containing its negation can become
//! unit or empty, so only those are re-examined.

use crate::repr::{Cnf, Literal, VarLabel};

#[derive(Debug, Clone)]
pub struct UnitPropagate {
    clauses: Vec<Vec<Literal>>,
    /// `occurrences[2 * v + p]` lists the clauses containing variable `v`
    /// with polarity `p`
    occurrences: Vec<Vec<usize>>,
    assignment: Vec<Option<bool>>,
    trail: Vec<Literal>,
    /// trail length at the time of each decision
    levels: Vec<usize>,
}

fn occ_idx(lit: Literal) -> usize {
    2 * lit.label().value_usize() + lit.polarity() as usize
}

impl UnitPropagate {
    /// Returns None if UNSAT discovered during initial unit propagation
    pub fn new(cnf: &Cnf) -> Option<UnitPropagate> {
        let num_vars = cnf.num_vars();
        let mut occurrences = vec![Vec::new(); 2 * num_vars];
        for (idx, c) in cnf.clauses().iter().enumerate() {
            if c.is_empty() {
                return None;
            }
            for l in c.iter() {
                occurrences[occ_idx(*l)].push(idx);
            }
        }
        let mut up = UnitPropagate {
            clauses: cnf.clauses().to_vec(),
            occurrences,
            assignment: vec![None; num_vars],
            trail: Vec::new(),
            levels: Vec::new(),
        };
        let units: Vec<Literal> = up
            .clauses
            .iter()
            .filter(|c| c.len() == 1)
            .map(|c| c[0])
            .collect();
        for u in units {
            if !up.assign_and_propagate(u) {
                return None;
            }
        }
        Some(up)
    }

    pub fn value(&self, var: VarLabel) -> Option<bool> {
        self.assignment[var.value_usize()]
    }

    /// True if `lit` holds under the current partial assignment
    pub fn is_true(&self, lit: Literal) -> bool {
        self.value(lit.label()) == Some(lit.polarity())
    }

    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    /// Every literal assigned so far, in assignment order
    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    /// The literals assigned since the most recent decision, including the
    /// decision itself
    pub fn current_level(&self) -> &[Literal] {
        let start = self.levels.last().copied().unwrap_or(0);
        &self.trail[start..]
    }

    /// Sets `lit` and propagates. Returns false if a conflict was found, in
    /// which case the caller must still `backtrack`.
    pub fn decide(&mut self, lit: Literal) -> bool {
        self.levels.push(self.trail.len());
        self.assign_and_propagate(lit)
    }

    /// Undoes everything since the most recent decision
    pub fn backtrack(&mut self) {
        let start = match self.levels.pop() {
            Some(s) => s,
            None => return,
        };
        for l in self.trail.drain(start..) {
            self.assignment[l.label().value_usize()] = None;
        }
    }

    fn assign_and_propagate(&mut self, lit: Literal) -> bool {
        match self.value(lit.label()) {
            Some(v) => return v == lit.polarity(),
            None => self.assign(lit),
        }
        let mut head = self.trail.len() - 1;
        while head < self.trail.len() {
            let falsified = self.trail[head].negated();
            head += 1;
            for i in 0..self.occurrences[occ_idx(falsified)].len() {
                let clause_idx = self.occurrences[occ_idx(falsified)][i];
                let mut unassigned = None;
                let mut num_unassigned = 0;
                let mut sat = false;
                for l in self.clauses[clause_idx].iter() {
                    match self.value(l.label()) {
                        Some(v) if v == l.polarity() => {
                            sat = true;
                            break;
                        }
                        Some(_) => (),
                        None => {
                            num_unassigned += 1;
                            unassigned = Some(*l);
                        }
                    }
                }
                if sat {
                    continue;
                }
                match (num_unassigned, unassigned) {
                    (0, _) => return false,
                    (1, Some(u)) => self.assign(u),
                    _ => (),
                }
            }
        }
        true
    }

    fn assign(&mut self, lit: Literal) {
        self.assignment[lit.label().value_usize()] = Some(lit.polarity());
        self.trail.push(lit);
    }
}
