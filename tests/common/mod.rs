//! Common test utilities shared across integration tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Write `yaml` as the `tasks.yaml` module of `dir`.
pub fn write_module(dir: &Path, yaml: &str) -> PathBuf {
    let module = dir.join("tasks.yaml");
    std::fs::write(&module, yaml).unwrap();
    module
}

/// A command running the `rb` binary.
pub fn rb() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rb"))
}

/// Poll until `path` holds non-empty content, returning it.
///
/// # Panics
///
/// Panics if the timeout is reached first.
pub fn wait_for_content(path: &Path, timeout: Duration) -> String {
    let start = Instant::now();
    loop {
        if let Ok(content) = std::fs::read_to_string(path) {
            if !content.is_empty() {
                return content;
            }
        }
        if start.elapsed() > timeout {
            panic!("Timeout waiting for content in {}", path.display());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Poll a child until it exits, returning its exit code.
///
/// # Panics
///
/// Panics if the timeout is reached first.
pub fn wait_for_exit(child: &mut std::process::Child, timeout: Duration) -> Option<i32> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status.code();
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            panic!("Timeout waiting for child {} to exit", child.id());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
