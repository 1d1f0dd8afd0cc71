use crate::core::domain::{CompileResult, ExecutionTarget, Language};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("compilation failed:\n{stderr}")]
    CompilationFailed { stdout: String, stderr: String },
    #[error("{language} is interpreted and has nothing to compile")]
    NotCompiled { language: Language },
    #[error("compilation exceeded {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },
    #[error("internal compiler error: {msg}")]
    Internal { msg: String },
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Compiler: std::fmt::Debug + Send + Sync {
    /// Builds `target.executable_path()` from `target.source_path()`.
    async fn compile(&self, target: &ExecutionTarget) -> Result<CompileResult, CompileError>;
}
