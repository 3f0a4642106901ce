use crate::builder::decision_nnf::CompileError;
use std::fmt;
use thiserror::Error;

/// The role in which a caller referred to an atom by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomRole {
    Query,
    Evidence,
    Intervention,
}

impl fmt::Display for AtomRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomRole::Query => write!(f, "query"),
            AtomRole::Evidence => write!(f, "evidence"),
            AtomRole::Intervention => write!(f, "intervention"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CounterfactualError {
    /// The evidence has probability zero in the counterfactual world
    #[error("contradictory evidence: the evidence has probability {probability}")]
    ContradictoryEvidence { probability: f64 },
    #[error("unknown {role} atom `{name}`")]
    UnknownAtom { name: String, role: AtomRole },
    #[error("unsupported strategy `{0}` (expected one of top-down, bottom-up, d4, c2d)")]
    UnsupportedStrategy(String),
    #[error("malformed rule `{rule}`: {reason}")]
    MalformedRule { rule: String, reason: String },
    #[error("probability {probability} of `{name}` is not in [0, 1]")]
    InvalidProbability { name: String, probability: f64 },
    #[error("the program is cyclic through `{atom}`")]
    CyclicProgram { atom: String },
    #[error(transparent)]
    Compile(#[from] CompileError),
}
