//! Run timeouts.

use std::time::{Duration, Instant};

use crate::common::{rb, write_module};
use runbook::{RunOptions, Runner};
use tempfile::TempDir;

const SLEEPY: &str = r#"
tasks:
  sleepy:
    cmds:
      - argv: ["sleep", "10"]
      - embeddedScript: ["echo never > $(RUNBOOK_MODULEDIR)/never.txt"]
"#;

#[tokio::test]
async fn test_timeout_stops_run() {
    let dir = TempDir::new().unwrap();
    let module = write_module(dir.path(), SLEEPY);

    let start = Instant::now();
    let err = Runner::default()
        .run(
            "sleepy",
            &RunOptions::new()
                .module(&module)
                .timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_ne!(err.exit_code(), 0);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!dir.path().join("never.txt").exists());
}

#[test]
fn test_binary_timeout_flag() {
    let dir = TempDir::new().unwrap();
    let module = write_module(dir.path(), SLEEPY);

    let start = Instant::now();
    let output = rb()
        .args(["sleepy", "-t", "200ms", "-m"])
        .arg(&module)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("timed out"));
}
