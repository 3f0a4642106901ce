//! Counterfactual queries over probabilistic logic programs.
//!
//! A [`CounterfactualProgram`] answers queries of the form "given that the
//! evidence was observed, how likely is each query atom had the interventions
//! been made". The program is duplicated once at construction (see
//! [`decorate`] for the naming scheme); queries are then answered either one
//! batch at a time ([`CounterfactualProgram::single_query`]) or by engines
//! that keep state between batches ([`CounterfactualProgram::multi_query`]).
//!
//! ```
//! use maplit::hashmap;
//! use whatif::counterfactual::{CounterfactualProgram, Strategy};
//! use whatif::repr::{AtomLiteral, Program};
//!
//! // rain :- cloudy.  wet :- rain.  wet :- sprinkler.
//! let mut p = Program::new();
//! let cloudy = p.guessed("cloudy", 0.5);
//! let sprinkler = p.guessed("sprinkler", 0.2);
//! let rain = p.derived("rain");
//! let wet = p.derived("wet");
//! p.add_rule(&[rain], &[AtomLiteral::pos(cloudy)]);
//! p.add_rule(&[wet], &[AtomLiteral::pos(rain)]);
//! p.add_rule(&[wet], &[AtomLiteral::pos(sprinkler)]);
//!
//! let program = CounterfactualProgram::new(p).unwrap();
//! // the grass is wet; would it be, had it not rained?
//! let r = program
//!     .single_query(
//!         &hashmap! { "rain" => false },
//!         &hashmap! { "wet" => true },
//!         &["wet"],
//!         &Strategy::TopDown,
//!     )
//!     .unwrap();
//! assert!((r[0] - 0.2 / 0.6).abs() < 1e-9);
//! ```

mod apply_cache;
mod bottom_up;
mod error;
mod graph;
mod query;
mod single;
mod strategy;
mod top_down;
mod transform;

pub use self::apply_cache::*;
pub use self::error::*;
pub use self::strategy::*;
pub use self::transform::decorate;

use self::{
    bottom_up::BottomUpSession, graph::check_acyclic, query::normalize, query::ResolvedQuery,
    top_down::TopDownSession,
};
use crate::repr::{AtomId, AtomSpace, Program, Rule};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// A program prepared for counterfactual queries
pub struct CounterfactualProgram {
    atoms: AtomSpace,
    rules: Vec<Rule>,
    evidence_atoms: BTreeMap<String, AtomId>,
    intervention_atoms: BTreeMap<String, AtomId>,
    true_atom: AtomId,
    /// topological order of the AND/OR graph of `rules`
    order: Vec<usize>,
    top_down: Option<TopDownSession>,
    bottom_up: Option<BottomUpSession>,
}

impl CounterfactualProgram {
    /// Duplicates `program` into its factual and counterfactual copies.
    ///
    /// Fails if a probability is outside `[0, 1]`, if a rule derives a guessed
    /// atom or several atoms at once, or if the program is cyclic.
    pub fn new(program: Program) -> Result<CounterfactualProgram, CounterfactualError> {
        let t = transform::duplicate(program)?;
        let order = check_acyclic(&t.atoms, &t.rules)?;
        info!(
            atoms = t.atoms.len(),
            rules = t.rules.len(),
            "prepared counterfactual program"
        );
        Ok(CounterfactualProgram {
            atoms: t.atoms,
            rules: t.rules,
            evidence_atoms: t.evidence_atoms,
            intervention_atoms: t.intervention_atoms,
            true_atom: t.true_atom,
            order,
            top_down: None,
            bottom_up: None,
        })
    }

    /// The atoms of the duplicated program
    pub fn atoms(&self) -> &AtomSpace {
        &self.atoms
    }

    /// The duplicated rules, ending with the `true` fact
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The shadow standing for `name` in the factual copy
    pub fn evidence_atom(&self, name: &str) -> Option<AtomId> {
        self.evidence_atoms.get(name).copied()
    }

    /// The atom standing for `name` in the counterfactual copy
    pub fn intervention_atom(&self, name: &str) -> Option<AtomId> {
        self.intervention_atoms.get(name).copied()
    }

    pub fn true_atom(&self) -> AtomId {
        self.true_atom
    }

    fn resolve<S: AsRef<str>>(
        &self,
        interventions: &HashMap<S, bool>,
        evidence: &HashMap<S, bool>,
        queries: &[S],
    ) -> Result<ResolvedQuery, CounterfactualError> {
        ResolvedQuery::resolve(
            &self.evidence_atoms,
            &self.intervention_atoms,
            interventions,
            evidence,
            queries,
        )
    }

    /// The probability of each query, in order, conditioned on `evidence`
    /// in the world where `interventions` were made. Every call evaluates
    /// from scratch.
    pub fn single_query<S: AsRef<str>>(
        &self,
        interventions: &HashMap<S, bool>,
        evidence: &HashMap<S, bool>,
        queries: &[S],
        strategy: &Strategy,
    ) -> Result<Vec<f64>, CounterfactualError> {
        let q = self.resolve(interventions, evidence, queries)?;
        let values = single::evaluate(&self.atoms, &self.rules, self.true_atom, &q, strategy)?;
        normalize(&values)
    }

    /// The probability of `evidence` in the factual world, the value every
    /// query result is divided by. Zero when the evidence cannot hold.
    pub fn evidence_probability<S: AsRef<str>>(
        &self,
        evidence: &HashMap<S, bool>,
        strategy: &Strategy,
    ) -> Result<f64, CounterfactualError> {
        let q = self.resolve(&HashMap::new(), evidence, &[])?;
        let values = single::evaluate(&self.atoms, &self.rules, self.true_atom, &q, strategy)?;
        Ok(values[0])
    }

    /// Same as [`CounterfactualProgram::single_query`], but reuses the work
    /// of earlier calls: a top-down strategy compiles the program once and
    /// only reweighs the circuit per call (a different compiler triggers a
    /// recompilation), the bottom-up strategy keeps its decision diagrams.
    pub fn multi_query<S: AsRef<str>>(
        &mut self,
        interventions: &HashMap<S, bool>,
        evidence: &HashMap<S, bool>,
        queries: &[S],
        strategy: &Strategy,
    ) -> Result<Vec<f64>, CounterfactualError> {
        let q = self.resolve(interventions, evidence, queries)?;
        let values = match strategy.compiler() {
            None => {
                let (atoms, order) = (&self.atoms, &self.order);
                self.bottom_up
                    .get_or_insert_with(|| BottomUpSession::new(atoms, order.clone()))
                    .evaluate(&self.atoms, &self.rules, &q)
            }
            Some(compiler) => {
                let session = match self.top_down.take() {
                    Some(s) if s.strategy() == strategy => s,
                    _ => {
                        debug!(%strategy, "starting top-down session");
                        TopDownSession::new(
                            &self.atoms,
                            &self.rules,
                            &self.evidence_atoms,
                            &self.intervention_atoms,
                            self.true_atom,
                            strategy.clone(),
                            compiler.as_ref(),
                        )?
                    }
                };
                let values = session.evaluate(&q);
                self.top_down = Some(session);
                values?
            }
        };
        normalize(&values)
    }

    /// Entries and hits of the bottom-up engine's apply cache, once it has
    /// been started
    pub fn apply_cache(&self) -> Option<&ApplyCache> {
        self.bottom_up.as_ref().map(|s| s.cache())
    }
}
