use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_EXECUTABLE_NAME, DEFAULT_TIMEOUT_MS, GCC, GPP, PYTHON};
use crate::core::domain::{ExecutionTarget, Language};

/// Toolchain and limit settings shared by the compiler, the runner and the session pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecConfig {
    pub gcc_path: PathBuf,
    pub gpp_path: PathBuf,
    pub python_path: PathBuf,
    pub default_executable_name: String,
    pub timeout_ms: u64,
    pub compile_timeout_ms: Option<u64>,
    pub fail_on_nonzero_exit: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            gcc_path: PathBuf::from(GCC),
            gpp_path: PathBuf::from(GPP),
            python_path: PathBuf::from(PYTHON),
            default_executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            compile_timeout_ms: None,
            fail_on_nonzero_exit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl ExecConfig {
    /// Defaults overridden by `CPRUNNER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("CPRUNNER_GCC") {
            config.gcc_path = v.into();
        }
        if let Some(v) = lookup("CPRUNNER_GPP") {
            config.gpp_path = v.into();
        }
        if let Some(v) = lookup("CPRUNNER_PYTHON") {
            config.python_path = v.into();
        }
        if let Some(v) = lookup("CPRUNNER_EXECUTABLE_NAME") {
            config.default_executable_name = v;
        }
        if let Some(v) = lookup("CPRUNNER_TIMEOUT_MS") {
            config.timeout_ms = parse_value("CPRUNNER_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("CPRUNNER_COMPILE_TIMEOUT_MS") {
            config.compile_timeout_ms = Some(parse_value("CPRUNNER_COMPILE_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("CPRUNNER_FAIL_ON_NONZERO_EXIT") {
            config.fail_on_nonzero_exit = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError {
                        key: "CPRUNNER_FAIL_ON_NONZERO_EXIT",
                        value: v,
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        Self { timeout_ms, ..self }
    }

    pub fn with_compile_timeout_ms(self, compile_timeout_ms: Option<u64>) -> Self {
        Self {
            compile_timeout_ms,
            ..self
        }
    }

    pub fn with_fail_on_nonzero_exit(self, fail_on_nonzero_exit: bool) -> Self {
        Self {
            fail_on_nonzero_exit,
            ..self
        }
    }

    /// Compiler binary for a language, `None` for interpreted languages.
    pub fn compiler_for(&self, language: Language) -> Option<&Path> {
        match language {
            Language::C => Some(&self.gcc_path),
            Language::Cpp => Some(&self.gpp_path),
            Language::Python => None,
        }
    }

    /// Interpreter binary for a language, `None` for compiled languages.
    pub fn interpreter_for(&self, language: Language) -> Option<&Path> {
        match language {
            Language::C | Language::Cpp => None,
            Language::Python => Some(&self.python_path),
        }
    }

    pub fn target<P: AsRef<Path>>(&self, source_path: P, language: Language) -> ExecutionTarget {
        ExecutionTarget::with_executable_name(source_path, language, &self.default_executable_name)
    }
}

fn parse_value(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        key,
        value: value.to_string(),
    })
}
