/// Implementations of the core traits that launch the configured
/// toolchains directly as child processes.
pub mod compiler;
pub mod runner;
