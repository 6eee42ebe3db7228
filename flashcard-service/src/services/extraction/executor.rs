use service_core::error::AppError;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Runs external tools with a hard timeout.
#[derive(Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn execute(&self, program: &str, args: &[&str]) -> Result<Output, AppError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %program,
            args = ?args,
            timeout_secs = %self.timeout.as_secs(),
            "Executing command"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::InternalError(anyhow::anyhow!(
                    "Command {} timed out after {} seconds",
                    program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to run {}: {}", program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                program = %program,
                args = ?args,
                stderr = %stderr,
                "Command failed"
            );
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Command failed: {}",
                stderr
            )));
        }

        tracing::debug!(
            program = %program,
            output_size = output.stdout.len(),
            "Command succeeded"
        );

        Ok(output)
    }

    pub async fn execute_on(
        &self,
        program: &str,
        file: &Path,
        extra_args: &[&str],
    ) -> Result<Output, AppError> {
        let path = file.to_str().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Non UTF-8 path: {}", file.display()))
        })?;
        let mut args = vec![path];
        args.extend_from_slice(extra_args);
        self.execute(program, &args).await
    }
}
