use std::io::{self, ErrorKind};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::time::{Duration, Instant, sleep_until, timeout};

use crate::constants::{OUTPUT_GRACE_MS, READ_CHUNK_SIZE};
use crate::core::{
    config::ExecConfig,
    domain::{ExecutionResult, ExecutionTarget, Language},
    traits::runner::{RunError, Runner},
};

#[derive(Clone, Debug)]
pub struct NativeRunner {
    config: ExecConfig,
}

/// Output of a child that exited on its own, before any size lookup.
/// Streams hold what was read by exit time plus the grace period.
#[derive(Debug)]
struct Exited {
    stdout: Drained,
    stderr: Drained,
    status: io::Result<ExitStatus>,
    elapsed: Duration,
}

#[derive(Debug, Default)]
struct Drained {
    bytes: Vec<u8>,
    error: Option<io::Error>,
}

impl Drained {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl NativeRunner {
    pub fn new(config: ExecConfig) -> Self {
        NativeRunner { config }
    }

    fn command(&self, target: &ExecutionTarget) -> Result<Command, RunError> {
        let language = target.language();
        let cmd = match language {
            Language::Python => {
                let interpreter = self
                    .config
                    .interpreter_for(language)
                    .ok_or_else(|| missing_image(target))?;
                let mut cmd = Command::new(interpreter);
                cmd.arg(target.source_path());
                cmd
            }
            Language::C | Language::Cpp => {
                let executable = target
                    .executable_path()
                    .ok_or_else(|| missing_image(target))?;
                Command::new(executable)
            }
        };
        Ok(cmd)
    }

    /// Spawns the child and races its exit against the deadline.
    async fn supervise(
        &self,
        target: &ExecutionTarget,
        input: &str,
        timeout_ms: u64,
    ) -> Result<Exited, RunError> {
        let mut cmd = self.command(target)?;
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        tracing::debug!("Spawning {}", program);

        let mut child = cmd.spawn().map_err(|e| RunError::Spawn {
            program: program.clone(),
            kind: e.kind(),
            msg: e.to_string(),
            stdout: String::new(),
            stderr: String::new(),
        })?;
        let started = Instant::now();
        let deadline = sleep_until(started + Duration::from_millis(timeout_ms));
        tokio::pin!(deadline);

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut stdout_drained = Drained::default();
        let mut stderr_drained = Drained::default();

        let exit = {
            let io = async {
                tokio::join!(
                    feed_stdin(stdin, input),
                    drain(stdout, &mut stdout_drained),
                    drain(stderr, &mut stderr_drained),
                );
            };
            tokio::pin!(io);
            let mut io_done = false;

            // Only the exit wait and the deadline can end the race;
            // pipes held open by a grandchild must not delay the exit
            let exit = loop {
                tokio::select! {
                    biased;
                    status = child.wait() => break Some((status, started.elapsed())),
                    _ = &mut io, if !io_done => io_done = true,
                    _ = &mut deadline => break None,
                }
            };

            if exit.is_some()
                && !io_done
                && timeout(Duration::from_millis(OUTPUT_GRACE_MS), &mut io)
                    .await
                    .is_err()
            {
                tracing::debug!(
                    "Output pipes still open {} ms after exit, keeping what was read",
                    OUTPUT_GRACE_MS
                );
            }
            exit
        };

        let Some((status, elapsed)) = exit else {
            tracing::warn!("{} exceeded {} ms, killing it", program, timeout_ms);
            if let Err(e) = child.start_kill() {
                tracing::debug!("Kill after timeout failed: {}", e);
            }
            if let Err(e) = child.wait().await {
                tracing::debug!("Failed to reap killed process: {}", e);
            }
            return Err(RunError::Timeout { timeout_ms });
        };

        let exited = Exited {
            stdout: stdout_drained,
            stderr: stderr_drained,
            status,
            elapsed,
        };
        tracing::debug!(elapsed = ?exited.elapsed, status = ?exited.status, "Process exited");
        Ok(exited)
    }
}

#[async_trait::async_trait]
impl Runner for NativeRunner {
    #[tracing::instrument(skip(self, input), fields(source = %target.source_path().display(), language = %target.language()))]
    async fn execute(
        &self,
        target: &ExecutionTarget,
        input: &str,
        timeout_ms: u64,
    ) -> Result<ExecutionResult, RunError> {
        let (exited, source_size_bytes) = futures::future::try_join(
            self.supervise(target, input, timeout_ms),
            source_size(target.source_path()),
        )
        .await?;

        let stdout = exited.stdout.text();
        let stderr = exited.stderr.text();

        let status = match exited.status {
            Ok(status) => status,
            Err(e) => {
                return Err(RunError::ProcessExit {
                    exit_code: None,
                    msg: format!("Failed to wait for process: {}", e),
                    stdout,
                    stderr,
                });
            }
        };

        if let Some(e) = exited.stdout.error.as_ref().or(exited.stderr.error.as_ref()) {
            return Err(RunError::ProcessExit {
                exit_code: status.code(),
                msg: format!("Failed to read process output: {}", e),
                stdout,
                stderr,
            });
        }

        if self.config.fail_on_nonzero_exit && !status.success() {
            return Err(RunError::ProcessExit {
                exit_code: status.code(),
                msg: format!("non-zero exit ({})", status),
                stdout,
                stderr,
            });
        }

        let result = ExecutionResult {
            stdout,
            stderr,
            elapsed_ms: exited.elapsed.as_millis() as u64,
            source_size_bytes,
            exit_code: status.code(),
        };
        tracing::info!(
            elapsed_ms = result.elapsed_ms,
            exit_code = ?result.exit_code,
            "Execution completed"
        );

        Ok(result)
    }
}

/// Writes the whole input and closes the pipe. Runs alongside the output
/// drains so a child that never reads cannot stall the runner.
async fn feed_stdin(stdin: Option<ChildStdin>, input: &str) {
    let Some(mut stdin) = stdin else {
        return;
    };

    if let Err(e) = stdin.write_all(input.as_bytes()).await {
        if e.kind() == ErrorKind::BrokenPipe {
            tracing::debug!("Process closed stdin before reading all input");
        } else {
            tracing::warn!("Failed to write to stdin: {}", e);
        }
    }

    // Close stdin to signal EOF
    drop(stdin);
}

async fn drain<R>(stream: Option<R>, drained: &mut Drained)
where
    R: AsyncRead + Unpin,
{
    let Some(mut stream) = stream else {
        return;
    };

    // Chunked reads keep everything read so far if the drain is abandoned
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => drained.bytes.extend_from_slice(&chunk[..n]),
            Err(e) => {
                drained.error = Some(e);
                break;
            }
        }
    }
}

async fn source_size(path: &Path) -> Result<u64, RunError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| RunError::SourceMetadata {
            kind: e.kind(),
            msg: format!("{}: {}", path.display(), e),
        })?;
    Ok(metadata.len())
}

fn missing_image(target: &ExecutionTarget) -> RunError {
    RunError::Spawn {
        program: target.source_path().display().to_string(),
        kind: ErrorKind::NotFound,
        msg: format!("no launch image for {} target", target.language()),
        stdout: String::new(),
        stderr: String::new(),
    }
}
