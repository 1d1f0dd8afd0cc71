use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use uuid::Uuid;

use crate::constants::DEFAULT_EXECUTABLE_NAME;
use crate::core::traits::compiler::CompileError;
use crate::core::traits::runner::RunError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    Python,
}

impl Language {
    /// Whether the language needs a compile step before it can run.
    pub fn is_compiled(&self) -> bool {
        match self {
            Language::C | Language::Cpp => true,
            Language::Python => false,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "c++" => Some(Language::Cpp),
            "py" => Some(Language::Python),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Python => "Python",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "py" | "python" => Ok(Language::Python),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Binds one source file to its language and, for compiled languages,
/// to the path of the executable produced from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionTarget {
    source_path: PathBuf,
    language: Language,
    executable_path: Option<PathBuf>,
}

impl ExecutionTarget {
    /// Executable (if any) is placed next to the source as `a.out` (`a.exe` on Windows).
    pub fn new<P: AsRef<Path>>(source_path: P, language: Language) -> Self {
        Self::with_executable_name(source_path, language, DEFAULT_EXECUTABLE_NAME)
    }

    pub fn with_executable_name<P: AsRef<Path>>(
        source_path: P,
        language: Language,
        executable_name: &str,
    ) -> Self {
        let source_path = source_path.as_ref().to_path_buf();
        let executable_path = language.is_compiled().then(|| {
            // A bare relative name would be looked up on PATH when launched
            source_path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .join(executable_name)
        });

        Self {
            source_path,
            language,
            executable_path,
        }
    }

    pub fn with_executable_path<P, Q>(source_path: P, language: Language, executable_path: Q) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            language,
            executable_path: language
                .is_compiled()
                .then(|| executable_path.as_ref().to_path_buf()),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Always `Some` for compiled languages, always `None` for interpreted ones.
    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileResult {
    pub stdout: String,
    /// Warnings only; a failed compile is reported as `CompileError`.
    pub stderr: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: u64,
    pub source_size_bytes: u64,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub target: ExecutionTarget,
    pub input: String,
    pub timeout_ms: u64,
    pub compile_warnings: String,
    pub state: SessionState,
}

impl Session {
    pub fn new(target: ExecutionTarget, input: String, timeout_ms: u64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            target,
            input,
            timeout_ms,
            compile_warnings: String::new(),
            state: SessionState::default(),
        }
    }

    pub fn change_state(&self, new_state: SessionState) -> Self {
        Self {
            state: new_state,
            updated_at: chrono::Utc::now(),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub enum SessionState {
    #[default]
    Pending,

    Compiling,
    CompilationFailed(CompileError),
    Compiled,

    Running,
    Done(ExecutionResult),
    Failed(RunError),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::CompilationFailed(_) | SessionState::Done(_) | SessionState::Failed(_)
        )
    }
}
