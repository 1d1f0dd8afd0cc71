use crate::core::{
    domain::{ExecutionResult, Session, SessionState},
    traits::runner::RunError,
};

/// Text for the results pane.
pub fn render(session: &Session) -> String {
    match &session.state {
        SessionState::Pending => String::new(),
        SessionState::Compiling => format!("Compiling {}...", session.target.language()),
        SessionState::Compiled | SessionState::Running => "Running...".to_string(),
        SessionState::CompilationFailed(e) => format!("Messages:\n{}", e),
        SessionState::Done(result) => render_result(result, &session.compile_warnings),
        SessionState::Failed(e) => render_failure(e),
    }
}

fn render_result(result: &ExecutionResult, compile_warnings: &str) -> String {
    let mut text = format!("Output:\n{}", result.stdout);

    let messages = [compile_warnings, result.stderr.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if !messages.is_empty() {
        text.push_str("\n\nCompiler/Interpreter Messages:\n");
        text.push_str(&messages);
    }

    text.push_str(&format!(
        "\n\nFinished in {} ms, source size {} bytes",
        result.elapsed_ms, result.source_size_bytes
    ));
    match result.exit_code {
        Some(0) => {}
        Some(code) => text.push_str(&format!(", exit code {}", code)),
        None => text.push_str(", terminated by signal"),
    }

    text
}

fn render_failure(error: &RunError) -> String {
    let mut text = format!("Messages:\n{}", error);
    if !error.stdout().is_empty() {
        text.push_str(&format!("\n\nOutput:\n{}", error.stdout()));
    }
    if !error.stderr().is_empty() {
        text.push_str(&format!("\n\nInterpreter Messages:\n{}", error.stderr()));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;
    use crate::core::{
        domain::{ExecutionTarget, Language},
        traits::compiler::CompileError,
    };

    fn session(state: SessionState) -> Session {
        Session::new(
            ExecutionTarget::new("/tmp/echo.py", Language::Python),
            String::new(),
            1000,
        )
        .change_state(state)
    }

    fn result(stdout: &str, stderr: &str, exit_code: Option<i32>) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            elapsed_ms: 7,
            source_size_bytes: 42,
            exit_code,
        }
    }

    #[test]
    fn test_render_clean_output() {
        let text = render(&session(SessionState::Done(result("HELLO\n", "", Some(0)))));
        assert_eq!(
            text,
            "Output:\nHELLO\n\n\nFinished in 7 ms, source size 42 bytes"
        );
    }

    #[test]
    fn test_render_with_messages() {
        let mut session = session(SessionState::Done(result("1\n", "trace", Some(2))));
        session.compile_warnings = "warning: x".to_string();

        let text = render(&session);

        assert!(text.starts_with("Output:\n1\n"));
        assert!(text.contains("\n\nCompiler/Interpreter Messages:\nwarning: x\ntrace"));
        assert!(text.ends_with(", exit code 2"));
    }

    #[test]
    fn test_render_timeout_is_distinct() {
        let text = render(&session(SessionState::Failed(RunError::Timeout {
            timeout_ms: 200,
        })));
        assert!(text.starts_with("Messages:\n"));
        assert!(text.contains("took too long"));
        assert!(!text.contains("Output:"));
    }

    #[test]
    fn test_render_spawn_failure() {
        let text = render(&session(SessionState::Failed(RunError::Spawn {
            program: "python3".to_string(),
            kind: ErrorKind::NotFound,
            msg: "No such file or directory".to_string(),
            stdout: String::new(),
            stderr: String::new(),
        })));
        assert_eq!(
            text,
            "Messages:\nfailed to start python3: No such file or directory"
        );
    }

    #[test]
    fn test_render_compilation_failure() {
        let text = render(&session(SessionState::CompilationFailed(
            CompileError::CompilationFailed {
                stdout: String::new(),
                stderr: "bad.c:4: error: expected ';'".to_string(),
            },
        )));
        assert_eq!(
            text,
            "Messages:\ncompilation failed:\nbad.c:4: error: expected ';'"
        );
    }
}
