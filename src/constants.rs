pub const SESSION_TX_ERR: &str = "Failed to send session update";

pub const GCC: &str = "gcc";
pub const GPP: &str = "g++";

#[cfg(windows)]
pub const PYTHON: &str = "python";
#[cfg(not(windows))]
pub const PYTHON: &str = "python3";

#[cfg(windows)]
pub const DEFAULT_EXECUTABLE_NAME: &str = "a.exe";
#[cfg(not(windows))]
pub const DEFAULT_EXECUTABLE_NAME: &str = "a.out";

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// How long output pipes are still drained after the child has exited.
pub const OUTPUT_GRACE_MS: u64 = 200;
pub const READ_CHUNK_SIZE: usize = 8192;
