// llama.cpp CLI invocation
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::errors::{RagError, Result};

/// Captured output of one generator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Runs `llama-cli` (or a compatible binary) with greedy decoding
pub struct LlamaCliGenerator {
    executable: String,
    model: String,
    n_predict: u32,
    ctx_size: u32,
    timeout: Duration,
}

impl LlamaCliGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            model: config.model.clone(),
            n_predict: config.n_predict,
            ctx_size: config.ctx_size,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Argument vector passed to the executable
    pub fn args(&self, prompt: &str) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.model.clone(),
            "-p".to_string(),
            prompt.to_string(),
            "-n".to_string(),
            self.n_predict.to_string(),
            "-c".to_string(),
            self.ctx_size.to_string(),
            "--temp".to_string(),
            "0".to_string(),
            "-r".to_string(),
            "###".to_string(),
        ]
    }

    /// Run the generator on `prompt`.
    ///
    /// A binary that cannot be started or exceeds the timeout is an
    /// `ExternalToolFailure`; a non-zero exit still returns its output.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratorOutput> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(executable = %self.executable, model = %self.model, "running generator");
        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(RagError::ExternalToolFailure {
                    raw: format!("failed to start {}: {}", self.executable, e),
                })
            }
            Err(_) => {
                return Err(RagError::ExternalToolFailure {
                    raw: format!(
                        "{} timed out after {}s",
                        self.executable,
                        self.timeout.as_secs()
                    ),
                })
            }
        };

        let result = GeneratorOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };
        debug!(
            exit_code = ?result.exit_code,
            stdout_bytes = result.stdout.len(),
            "generator finished"
        );
        Ok(result)
    }
}
