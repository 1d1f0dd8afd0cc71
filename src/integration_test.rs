use std::sync::Arc;
use std::time::Instant;

use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::core::config::ExecConfig;
use crate::core::domain::{ExecutionTarget, Language, Session, SessionState};
use crate::core::pipeline::{render::render, session::process_session};
use crate::core::traits::compiler::{CompileError, Compiler};
use crate::core::traits::runner::{RunError, Runner};
use crate::native::compiler::NativeCompiler;
use crate::native::runner::NativeRunner;

fn config() -> ExecConfig {
    ExecConfig::from_env().expect("Invalid CPRUNNER_* environment")
}

fn write_target(dir: &TempDir, name: &str, code: &str) -> ExecutionTarget {
    let source = dir.path().join(name);
    std::fs::write(&source, code).expect("Failed to write source");
    let language = Language::from_extension(&source).expect("Unknown extension");
    config().target(source, language)
}

#[tokio::test]
async fn test_hello_world_compilation_and_execution() {
    let dir = TempDir::new().unwrap();
    let compiler = NativeCompiler::new(config());
    let runner = NativeRunner::new(config());

    let source_code = r#"
#include <iostream>
using namespace std;

int main() {
    cout << "Hello, Integration Test!" << endl;
    return 0;
}
"#;
    let target = write_target(&dir, "hello.cpp", source_code);

    let compiled = compiler
        .compile(&target)
        .await
        .expect("Compilation should succeed");
    assert!(compiled.stderr.is_empty());

    let result = runner
        .execute(&target, "", 5000)
        .await
        .expect("Execution should succeed");

    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, "Hello, Integration Test!\n");
    assert!(result.stderr.is_empty());
    assert_eq!(result.source_size_bytes, source_code.len() as u64);
}

#[tokio::test]
async fn test_c_input_output_handling() {
    let dir = TempDir::new().unwrap();
    let source_code = r#"
#include <stdio.h>

int main(void) {
    int a, b;
    if (scanf("%d %d", &a, &b) != 2) return 1;
    printf("%d\n", a + b);
    return 0;
}
"#;
    let target = write_target(&dir, "sum.c", source_code);

    NativeCompiler::new(config())
        .compile(&target)
        .await
        .expect("Compilation should succeed");

    let result = NativeRunner::new(config())
        .execute(&target, "5 3\n", 5000)
        .await
        .expect("Execution should succeed");

    assert_eq!(result.stdout, "8\n");
}

#[tokio::test]
async fn test_empty_c_and_cpp_programs() {
    let dir = TempDir::new().unwrap();
    let compiler = NativeCompiler::new(config());
    let runner = NativeRunner::new(config());

    for name in ["empty.c", "empty.cpp"] {
        let target = write_target(&dir, name, "int main(void) { return 0; }\n");
        compiler
            .compile(&target)
            .await
            .unwrap_or_else(|e| panic!("{} should compile: {}", name, e));

        let result = runner
            .execute(&target, "", 5000)
            .await
            .unwrap_or_else(|e| panic!("{} should run: {}", name, e));

        assert_eq!(result.stdout, "", "{}", name);
        assert_eq!(result.stderr, "", "{}", name);
        assert_eq!(result.exit_code, Some(0), "{}", name);
    }
}

#[tokio::test]
async fn test_c_compilation_error() {
    let dir = TempDir::new().unwrap();
    let invalid_source = r#"
#include <stdio.h>

int main(void) {
    printf("Missing semicolon here\n")
    return 0;
}
"#;
    let target = write_target(&dir, "bad.c", invalid_source);

    let result = NativeCompiler::new(config()).compile(&target).await;

    match result {
        Err(CompileError::CompilationFailed { stderr, .. }) => {
            assert!(stderr.contains("error"));
        }
        other => panic!("Expected CompilationFailed error, got {:?}", other),
    }
    assert!(!target.executable_path().unwrap().exists());
}

#[tokio::test]
async fn test_cpp_infinite_loop_times_out() {
    let dir = TempDir::new().unwrap();
    let source_code = r#"
int main() {
    volatile unsigned long counter = 0;
    while (true) {
        counter++;
    }
}
"#;
    let target = write_target(&dir, "loop.cpp", source_code);
    NativeCompiler::new(config())
        .compile(&target)
        .await
        .expect("Compilation should succeed");

    let started = Instant::now();
    let result = NativeRunner::new(config()).execute(&target, "", 200).await;
    let wall_ms = started.elapsed().as_millis();

    assert_eq!(result, Err(RunError::Timeout { timeout_ms: 200 }));
    assert!(wall_ms >= 200, "returned after {} ms", wall_ms);
    assert!(wall_ms < 1000, "returned after {} ms", wall_ms);
}

#[tokio::test]
async fn test_crashing_program_is_not_a_timeout() {
    let dir = TempDir::new().unwrap();
    let source_code = r#"
#include <stdio.h>
#include <stdlib.h>

int main(void) {
    fprintf(stderr, "giving up\n");
    abort();
}
"#;
    let target = write_target(&dir, "crash.c", source_code);
    NativeCompiler::new(config())
        .compile(&target)
        .await
        .expect("Compilation should succeed");

    let result = NativeRunner::new(config())
        .execute(&target, "", 5000)
        .await
        .expect("A crash is still a completed run");

    assert_eq!(result.stderr, "giving up\n");
    assert_ne!(result.exit_code, Some(0));
}

#[tokio::test]
async fn test_python_session_end_to_end() {
    let dir = TempDir::new().unwrap();
    let target = write_target(&dir, "echo.py", "print(input().upper())\n");

    let compiler: Arc<dyn Compiler> = Arc::new(NativeCompiler::new(config()));
    let runner: Arc<dyn Runner> = Arc::new(NativeRunner::new(config()));
    let (res_tx, _res_rx) = mpsc::channel(10);

    let session = Session::new(target, "hello\n".to_string(), 5000);
    let session = process_session(session, &res_tx, &compiler, &runner).await;

    let SessionState::Done(result) = &session.state else {
        panic!("Expected Done, got {:?}", session.state);
    };
    assert_eq!(result.stdout, "HELLO\n");
    assert_eq!(result.stderr, "");
    assert!(render(&session).starts_with("Output:\nHELLO\n"));
}

#[tokio::test]
async fn test_cpp_session_end_to_end() {
    let dir = TempDir::new().unwrap();
    let source_code = r#"
#include <iostream>
#include <string>

int main() {
    std::string line;
    while (std::getline(std::cin, line)) {
        std::cout << "Echo: " << line << "\n";
    }
}
"#;
    let target = write_target(&dir, "echo.cpp", source_code);

    let compiler: Arc<dyn Compiler> = Arc::new(NativeCompiler::new(config()));
    let runner: Arc<dyn Runner> = Arc::new(NativeRunner::new(config()));
    let (res_tx, mut res_rx) = mpsc::channel(10);

    let session = Session::new(target, "a\nb\n".to_string(), 5000);
    let session = process_session(session, &res_tx, &compiler, &runner).await;
    drop(res_tx);

    let SessionState::Done(result) = &session.state else {
        panic!("Expected Done, got {:?}", session.state);
    };
    assert_eq!(result.stdout, "Echo: a\nEcho: b\n");

    let mut updates = 0;
    while res_rx.recv().await.is_some() {
        updates += 1;
    }
    // Compiling, Compiled, Running, Done
    assert_eq!(updates, 4);
}
