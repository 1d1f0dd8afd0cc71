use std::io;

use crate::core::domain::{ExecutionResult, ExecutionTarget};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// The process image could not be started.
    #[error("failed to start {program}: {msg}")]
    Spawn {
        program: String,
        kind: io::ErrorKind,
        msg: String,
        stdout: String,
        stderr: String,
    },
    /// The child started but exiting or reading its output went wrong,
    /// or it exited non-zero while that is configured to count as failure.
    #[error("program exited abnormally: {msg}")]
    ProcessExit {
        exit_code: Option<i32>,
        msg: String,
        stdout: String,
        stderr: String,
    },
    #[error("program took too long to run (limit {timeout_ms} ms), check for infinite loops")]
    Timeout { timeout_ms: u64 },
    #[error("failed to read source file metadata: {msg}")]
    SourceMetadata { kind: io::ErrorKind, msg: String },
}

impl RunError {
    pub fn stdout(&self) -> &str {
        match self {
            RunError::Spawn { stdout, .. } | RunError::ProcessExit { stdout, .. } => stdout,
            RunError::Timeout { .. } | RunError::SourceMetadata { .. } => "",
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            RunError::Spawn { stderr, .. } | RunError::ProcessExit { stderr, .. } => stderr,
            RunError::Timeout { .. } | RunError::SourceMetadata { .. } => "",
        }
    }
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Runner: std::fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        target: &ExecutionTarget,
        input: &str,
        timeout_ms: u64,
    ) -> Result<ExecutionResult, RunError>;
}
