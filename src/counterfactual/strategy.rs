//! Evaluation strategies and the engine configuration.

use crate::{
    builder::decision_nnf::{ExternalCompiler, ExternalTool, KnowledgeCompiler, TopDownCompiler},
    counterfactual::CounterfactualError,
};
use std::{fmt, path::PathBuf, str::FromStr};

/// How query probabilities are computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Knowledge compilation with the built-in decision-DNNF compiler
    TopDown,
    /// Knowledge compilation with an external d-DNNF compiler
    External(ExternalCompiler),
    /// Binary decision diagrams built atom by atom
    BottomUp,
}

impl Strategy {
    /// The compiler of a top-down strategy
    pub fn compiler(&self) -> Option<Box<dyn KnowledgeCompiler>> {
        match self {
            Strategy::TopDown => Some(Box::new(TopDownCompiler::new())),
            Strategy::External(c) => Some(Box::new(c.clone())),
            Strategy::BottomUp => None,
        }
    }
}

impl FromStr for Strategy {
    type Err = CounterfactualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-down" => Ok(Strategy::TopDown),
            "bottom-up" => Ok(Strategy::BottomUp),
            "d4" => Ok(Strategy::External(ExternalCompiler::new(ExternalTool::D4))),
            "c2d" => Ok(Strategy::External(ExternalCompiler::new(ExternalTool::C2d))),
            other => Err(CounterfactualError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::TopDown => write!(f, "top-down"),
            Strategy::BottomUp => write!(f, "bottom-up"),
            Strategy::External(c) => write!(f, "{}", c.tool().as_str()),
        }
    }
}

fn default_strategy() -> String {
    "top-down".to_string()
}

/// Engine settings, read from JSON:
/// ```json
/// { "strategy": "d4", "d4_path": "/opt/d4/d4" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub d4_path: Option<PathBuf>,
    #[serde(default)]
    pub c2d_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            strategy: default_strategy(),
            d4_path: None,
            c2d_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<EngineConfig, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolves a strategy name, applying the configured compiler paths
    pub fn strategy(&self, name: &str) -> Result<Strategy, CounterfactualError> {
        let strategy = match Strategy::from_str(name)? {
            Strategy::External(c) => {
                let path = match c.tool() {
                    ExternalTool::D4 => self.d4_path.as_ref(),
                    ExternalTool::C2d => self.c2d_path.as_ref(),
                };
                match path {
                    Some(p) => Strategy::External(ExternalCompiler::with_path(c.tool(), p)),
                    None => Strategy::External(c),
                }
            }
            s => s,
        };
        Ok(strategy)
    }

    pub fn default_strategy(&self) -> Result<Strategy, CounterfactualError> {
        self.strategy(&self.strategy)
    }
}
