use std::sync::Arc;

use tokio::{
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};

use crate::{
    constants::SESSION_TX_ERR,
    core::{
        domain::{Session, SessionState},
        traits::{compiler::Compiler, runner::Runner},
    },
};

/// Accepts sessions and drives each one through compile and run on its own task.
///
/// Every state change is published on `res_tx`. Sessions are independent of
/// each other; nothing here stops two runs of the same source overlapping.
#[tracing::instrument(skip_all)]
pub fn handle_sessions(
    res_tx: Sender<Session>,
    mut session_rx: Receiver<Session>,
    compiler: Arc<dyn Compiler>,
    runner: Arc<dyn Runner>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(session) = session_rx.recv().await {
            let res_tx = res_tx.clone();
            let compiler = compiler.clone();
            let runner = runner.clone();

            tokio::spawn(async move {
                process_session(session, &res_tx, &compiler, &runner).await;
            });
        }
    })
}

/// Runs one session to a terminal state and returns it.
pub async fn process_session(
    session: Session,
    res_tx: &Sender<Session>,
    compiler: &Arc<dyn Compiler>,
    runner: &Arc<dyn Runner>,
) -> Session {
    tracing::debug!(id = %session.id, "Processing session");

    let mut session = session;
    if session.target.language().is_compiled() {
        session = session.change_state(SessionState::Compiling);
        publish(res_tx, &session).await;

        let compilation_result = compiler.compile(&session.target).await;
        tracing::debug!("Compilation result: {:?}", compilation_result);

        match compilation_result {
            Ok(result) => {
                session.compile_warnings = result.stderr;
                session = session.change_state(SessionState::Compiled);
                publish(res_tx, &session).await;
            }
            Err(e) => {
                tracing::info!(id = %session.id, "Compilation failed: {}", e);
                let session = session.change_state(SessionState::CompilationFailed(e));
                publish(res_tx, &session).await;
                return session;
            }
        }
    }

    let session = session.change_state(SessionState::Running);
    publish(res_tx, &session).await;

    let state = match runner
        .execute(&session.target, &session.input, session.timeout_ms)
        .await
    {
        Ok(result) => SessionState::Done(result),
        Err(e) => {
            tracing::info!(id = %session.id, "Execution failed: {}", e);
            SessionState::Failed(e)
        }
    };

    let session = session.change_state(state);
    tracing::info!(
        id = %session.id,
        took_ms = (session.updated_at - session.created_at).num_milliseconds(),
        "Session finished"
    );
    publish(res_tx, &session).await;
    session
}

async fn publish(res_tx: &Sender<Session>, session: &Session) {
    if res_tx.send(session.clone()).await.is_err() {
        tracing::warn!(id = %session.id, "{}", SESSION_TX_ERR);
    }
}
