//! External d-DNNF compilers. The CNF is written as DIMACS into a scoped
//! temporary directory, the tool is run to completion and its NNF output is
//! parsed back into an [`NnfCircuit`]. The directory is removed when the
//! compilation returns, on success and on error.

use crate::{
    builder::decision_nnf::{CompileError, KnowledgeCompiler},
    repr::{Cnf, NnfCircuit},
};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalTool {
    D4,
    C2d,
}

impl ExternalTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalTool::D4 => "d4",
            ExternalTool::C2d => "c2d",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCompiler {
    tool: ExternalTool,
    path: PathBuf,
}

impl ExternalCompiler {
    /// Uses the tool's name as executable, resolved through `PATH`
    pub fn new(tool: ExternalTool) -> ExternalCompiler {
        ExternalCompiler {
            tool,
            path: PathBuf::from(tool.as_str()),
        }
    }

    pub fn with_path(tool: ExternalTool, path: impl Into<PathBuf>) -> ExternalCompiler {
        ExternalCompiler {
            tool,
            path: path.into(),
        }
    }

    pub fn tool(&self) -> ExternalTool {
        self.tool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The command compiling `cnf_path`, and the file it writes its circuit to
    fn command(&self, cnf_path: &Path, dir: &Path) -> (Command, PathBuf) {
        let mut cmd = Command::new(&self.path);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        match self.tool {
            ExternalTool::D4 => {
                let out = dir.join("program.nnf");
                cmd.arg("-dDNNF")
                    .arg(cnf_path)
                    .arg(format!("-out={}", out.display()));
                (cmd, out)
            }
            ExternalTool::C2d => {
                cmd.arg("-in").arg(cnf_path);
                // c2d appends `.nnf` to the input file name
                let mut out = cnf_path.as_os_str().to_owned();
                out.push(".nnf");
                (cmd, PathBuf::from(out))
            }
        }
    }
}

impl KnowledgeCompiler for ExternalCompiler {
    fn name(&self) -> &str {
        self.tool.as_str()
    }

    fn compile(&self, cnf: &Cnf) -> Result<NnfCircuit, CompileError> {
        let temp_dir = TempDir::new()?;
        let cnf_path = temp_dir.path().join("program.cnf");
        std::fs::write(&cnf_path, cnf.to_dimacs())?;

        let (mut cmd, out_path) = self.command(&cnf_path, temp_dir.path());
        info!(
            tool = self.tool.as_str(),
            vars = cnf.num_vars(),
            clauses = cnf.clauses().len(),
            "running external compiler"
        );
        let output = cmd.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} stdout: {}", self.tool.as_str(), stdout);
        debug!("{} stderr: {}", self.tool.as_str(), stderr);

        if !output.status.success() {
            return Err(CompileError::ToolFailed {
                tool: self.tool.as_str().to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !out_path.exists() {
            return Err(CompileError::MissingOutput {
                tool: self.tool.as_str().to_string(),
                path: out_path,
            });
        }
        let text = std::fs::read_to_string(&out_path)?;
        let circuit = match self.tool {
            ExternalTool::D4 => NnfCircuit::parse_d4(&text, cnf.num_vars())?,
            ExternalTool::C2d => NnfCircuit::parse_c2d(&text, cnf.num_vars())?,
        };
        debug!(nodes = circuit.num_nodes(), "parsed compiled circuit");
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d4_arguments() {
        let c = ExternalCompiler::new(ExternalTool::D4);
        let (cmd, out) = c.command(Path::new("/tmp/x/program.cnf"), Path::new("/tmp/x"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["-dDNNF", "/tmp/x/program.cnf", "-out=/tmp/x/program.nnf"]
        );
        assert_eq!(out, PathBuf::from("/tmp/x/program.nnf"));
    }

    #[test]
    fn c2d_output_path() {
        let c = ExternalCompiler::with_path(ExternalTool::C2d, "/opt/c2d/c2d_linux");
        let (cmd, out) = c.command(Path::new("/tmp/y/program.cnf"), Path::new("/tmp/y"));
        assert_eq!(cmd.get_program(), "/opt/c2d/c2d_linux");
        assert_eq!(out, PathBuf::from("/tmp/y/program.cnf.nnf"));
    }

    #[test]
    fn missing_tool_is_an_io_error() {
        let c = ExternalCompiler::with_path(
            ExternalTool::D4,
            "/nonexistent/definitely-not-a-compiler",
        );
        let cnf = Cnf::from_dimacs("p cnf 1 1\n1 0\n").unwrap();
        assert!(matches!(c.compile(&cnf), Err(CompileError::Io(_))));
    }
}
