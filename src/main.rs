use std::panic;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::core::config::ExecConfig;
use crate::core::domain::{Session, SessionState};
use crate::core::pipeline::{render::render, session::handle_sessions};
use crate::native::{compiler::NativeCompiler, runner::NativeRunner};

mod cli;
mod constants;
mod core;
mod native;

#[cfg(test)]
mod integration_test;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let config = cli.apply(ExecConfig::from_env()?);
    let target = cli.target(&config)?;
    let input = cli.read_input().await?;
    tracing::debug!("Config: {:?}", config);

    let (res_tx, mut res_rx) = mpsc::channel(16);
    let (session_tx, session_rx) = mpsc::channel(1);
    handle_sessions(
        res_tx,
        session_rx,
        Arc::new(NativeCompiler::new(config.clone())),
        Arc::new(NativeRunner::new(config.clone())),
    );

    session_tx
        .send(Session::new(target, input, config.timeout_ms))
        .await?;

    while let Some(session) = res_rx.recv().await {
        tracing::debug!(id = %session.id, state = ?session.state, "Session update");
        if session.state.is_terminal() {
            println!("{}", render(&session));
            return Ok(match session.state {
                SessionState::Done(_) => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    }

    tracing::error!("Session ended without a result");
    Ok(ExitCode::FAILURE)
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
