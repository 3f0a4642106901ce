//! Top-down compilation of CNFs into deterministic decomposable negation
//! normal form, either in-process or through an external compiler.

mod external;
mod topdown;
mod unit_prop;

pub use self::external::*;
pub use self::topdown::*;
pub use self::unit_prop::*;

use crate::{
    repr::{Cnf, NnfCircuit, NnfParseError, WmcParams},
    util::semirings::RealSemiring,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("i/o error while exchanging files with the compiler: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{tool}` exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("`{tool}` did not produce {}", path.display())]
    MissingOutput { tool: String, path: PathBuf },
    #[error("could not parse the compiled circuit: {0}")]
    Parse(#[from] NnfParseError),
}

/// A compiler from CNF into a d-DNNF circuit that can be evaluated many times
/// under different weights
pub trait KnowledgeCompiler {
    fn name(&self) -> &str;

    fn compile(&self, cnf: &Cnf) -> Result<NnfCircuit, CompileError>;

    /// Compiles once and evaluates the circuit under every weight vector
    fn compile_and_evaluate(
        &self,
        cnf: &Cnf,
        params: &[WmcParams<RealSemiring>],
    ) -> Result<Vec<RealSemiring>, CompileError> {
        let circuit = self.compile(cnf)?;
        Ok(params.iter().map(|p| circuit.wmc(p)).collect())
    }
}
