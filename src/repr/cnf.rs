//! A representation of a conjunctive normal form (CNF)

use crate::repr::var_label::{Literal, VarLabel};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DimacsError {
    #[error("malformed DIMACS input: {0:?}")]
    Syntax(dimacs::ParseError),
    #[error("expected a `p cnf` instance")]
    NotCnf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Vec<Literal>>,
    num_vars: usize,
}

impl Cnf {
    /// Builds a CNF over exactly as many variables as its largest label needs
    pub fn new(clauses: Vec<Vec<Literal>>) -> Cnf {
        let num_vars = clauses
            .iter()
            .flatten()
            .map(|l| l.label().value_usize() + 1)
            .max()
            .unwrap_or(0);
        Cnf { clauses, num_vars }
    }

    /// Builds a CNF whose variable universe is `0..num_vars`, even if some of
    /// those variables do not occur in any clause
    pub fn with_num_vars(clauses: Vec<Vec<Literal>>, num_vars: usize) -> Cnf {
        let cnf = Cnf::new(clauses);
        Cnf {
            num_vars: usize::max(num_vars, cnf.num_vars),
            ..cnf
        }
    }

    /// Parses a DIMACS CNF instance, e.g.
    /// ```
    /// # use whatif::repr::Cnf;
    /// let cnf = Cnf::from_dimacs("p cnf 3 2\n1 -2 0\n3 0\n").unwrap();
    /// assert_eq!(cnf.num_vars(), 3);
    /// assert_eq!(cnf.clauses().len(), 2);
    /// ```
    pub fn from_dimacs(input: &str) -> Result<Cnf, DimacsError> {
        use dimacs::*;
        let (num_vars, clauses) = match parse_dimacs(input).map_err(DimacsError::Syntax)? {
            Instance::Cnf { num_vars, clauses } => (num_vars, clauses),
            _ => return Err(DimacsError::NotCnf),
        };
        let clauses = clauses
            .iter()
            .map(|c| {
                c.lits()
                    .iter()
                    .map(|l| {
                        // subtract 1, we are 0-indexed
                        let lbl = VarLabel::new(l.var().to_u64() - 1);
                        Literal::new(lbl, matches!(l.sign(), Sign::Pos))
                    })
                    .collect()
            })
            .collect();
        Ok(Cnf::with_num_vars(clauses, num_vars as usize))
    }

    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// All variable labels of this CNF's universe
    pub fn vars(&self) -> impl Iterator<Item = VarLabel> {
        (0..self.num_vars).map(VarLabel::new_usize)
    }

    /// Serializes this CNF into DIMACS
    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        writeln!(out, "p cnf {} {}", self.num_vars, self.clauses.len()).unwrap();
        for clause in self.clauses.iter() {
            for lit in clause.iter() {
                write!(out, "{} ", lit.to_dimacs()).unwrap();
            }
            out.push_str("0\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimacs_keeps_declared_vars() {
        let cnf = Cnf::from_dimacs("c a comment\np cnf 4 2\n1 -3 0\n2 0\n").unwrap();
        assert_eq!(cnf.num_vars(), 4);
        assert_eq!(
            cnf.clauses(),
            &[
                vec![
                    Literal::new(VarLabel::new(0), true),
                    Literal::new(VarLabel::new(2), false)
                ],
                vec![Literal::new(VarLabel::new(1), true)],
            ]
        );
    }

    #[test]
    fn dimacs_round_trips_through_text() {
        let cnf = Cnf::new(vec![
            vec![Literal::new(VarLabel::new(0), false)],
            vec![
                Literal::new(VarLabel::new(0), true),
                Literal::new(VarLabel::new(1), true),
            ],
        ]);
        assert_eq!(Cnf::from_dimacs(&cnf.to_dimacs()).unwrap(), cnf);
    }

    #[test]
    fn malformed_dimacs_is_an_error() {
        assert!(matches!(
            Cnf::from_dimacs("p cnf 2 1\n1 @ 0\n"),
            Err(DimacsError::Syntax(_))
        ));
    }
}
