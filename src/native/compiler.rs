use std::io::ErrorKind;
use std::process::Stdio;

use tokio::fs;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

use crate::core::{
    config::ExecConfig,
    domain::{CompileResult, ExecutionTarget},
    traits::compiler::{CompileError, Compiler},
};

#[derive(Clone, Debug)]
pub struct NativeCompiler {
    config: ExecConfig,
}

impl NativeCompiler {
    pub fn new(config: ExecConfig) -> Self {
        NativeCompiler { config }
    }
}

#[async_trait::async_trait]
impl Compiler for NativeCompiler {
    #[tracing::instrument(skip(self), fields(source = %target.source_path().display()))]
    async fn compile(&self, target: &ExecutionTarget) -> Result<CompileResult, CompileError> {
        let language = target.language();
        let (Some(compiler), Some(executable_path)) = (
            self.config.compiler_for(language),
            target.executable_path(),
        ) else {
            return Err(CompileError::NotCompiled { language });
        };

        // A stale artifact must not survive a failed compile
        match fs::remove_file(executable_path).await {
            Ok(()) => tracing::debug!("Removed stale executable {}", executable_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CompileError::Internal {
                    msg: format!(
                        "Failed to remove stale executable {}: {}",
                        executable_path.display(),
                        e
                    ),
                });
            }
        }

        let mut cmd = Command::new(compiler);
        cmd.arg("-o")
            .arg(executable_path)
            .arg(target.source_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(
            compiler = %compiler.display(),
            executable = %executable_path.display(),
            "Start compilation"
        );

        let compile_future = cmd.output();
        let result = if let Some(time_limit_ms) = self.config.compile_timeout_ms {
            match timeout(Duration::from_millis(time_limit_ms), compile_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Compilation exceeded {} ms", time_limit_ms);
                    return Err(CompileError::TimedOut {
                        timeout_ms: time_limit_ms,
                    });
                }
            }
        } else {
            compile_future.await
        };

        let output = result.map_err(|e| CompileError::Internal {
            msg: format!("Failed to execute {}: {}", compiler.display(), e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            tracing::debug!(status = ?output.status, "Compilation failed");
            return Err(CompileError::CompilationFailed { stdout, stderr });
        }

        if !fs::try_exists(executable_path).await.unwrap_or(false) {
            return Err(CompileError::Internal {
                msg: format!(
                    "Executable file was not created at: {}",
                    executable_path.display()
                ),
            });
        }

        if !stderr.is_empty() {
            tracing::debug!("Compiled with warnings");
        }

        Ok(CompileResult { stdout, stderr })
    }
}
