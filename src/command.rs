use std::process::{Command, Stdio};

use crate::errors::BenchmarkError;
use crate::types::Benchmarkable;

/// Runs an external command as the workload. Output is discarded and the
/// parent environment is inherited.
#[derive(Debug, Clone)]
pub struct CommandWorkload {
    program: String,
    args: Vec<String>,
}

impl CommandWorkload {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandWorkload {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawns the command once and waits for it. A non-zero exit is an error.
    pub fn run(&self) -> Result<(), BenchmarkError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| BenchmarkError::CommandSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BenchmarkError::CommandFailed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl Benchmarkable for CommandWorkload {
    fn benchmark(&mut self) -> anyhow::Result<()> {
        self.run()?;
        Ok(())
    }
}
