use std::path::PathBuf;

use clap::Parser;
use tokio::io::AsyncReadExt;

use crate::core::{
    config::ExecConfig,
    domain::{ExecutionTarget, Language},
};

#[derive(Parser, Debug)]
#[command(name = "cprunner")]
#[command(about = "Compile and run a C, C++ or Python source file with the given input", long_about = None)]
pub struct Cli {
    pub source: PathBuf,

    /// c, cpp or py; guessed from the file extension when omitted
    #[arg(short, long)]
    pub lang: Option<Language>,

    /// File with program input; stdin is used when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[arg(short = 'o', long)]
    pub executable: Option<PathBuf>,

    #[arg(short, long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub compile_timeout: Option<u64>,

    #[arg(long)]
    pub fail_on_nonzero_exit: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot infer language of {0}, pass --lang")]
    UnknownLanguage(PathBuf),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

impl Cli {
    /// Flags win over values already in `config`.
    pub fn apply(&self, config: ExecConfig) -> ExecConfig {
        let timeout_ms = self.timeout.unwrap_or(config.timeout_ms);
        let compile_timeout_ms = self.compile_timeout.or(config.compile_timeout_ms);
        let fail_on_nonzero_exit = self.fail_on_nonzero_exit || config.fail_on_nonzero_exit;

        config
            .with_timeout_ms(timeout_ms)
            .with_compile_timeout_ms(compile_timeout_ms)
            .with_fail_on_nonzero_exit(fail_on_nonzero_exit)
    }

    pub fn target(&self, config: &ExecConfig) -> Result<ExecutionTarget, CliError> {
        let language = match self.lang {
            Some(language) => language,
            None => Language::from_extension(&self.source)
                .ok_or_else(|| CliError::UnknownLanguage(self.source.clone()))?,
        };

        Ok(match &self.executable {
            Some(executable) => {
                ExecutionTarget::with_executable_path(&self.source, language, executable)
            }
            None => config.target(&self.source, language),
        })
    }

    pub async fn read_input(&self) -> Result<String, CliError> {
        let input = match &self.input {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => {
                let mut input = String::new();
                tokio::io::stdin().read_to_string(&mut input).await?;
                input
            }
        };
        Ok(input)
    }
}
