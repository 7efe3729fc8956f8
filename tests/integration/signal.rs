//! Termination signals sent to the binary.

#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::common::{rb, wait_for_content, wait_for_exit, write_module};
use tempfile::TempDir;

fn spawn_rb(task: &str, module: &Path) -> std::process::Child {
    rb().args([task, "-m"])
        .arg(module)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn terminate(child: &std::process::Child) {
    let status = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn test_sigterm_removes_files_and_exits() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  wait:
    inheritEnv: true
    files:
      secret:
        content: "s3cr3t"
    cmds:
      - embeddedScript: ["printf '%s' \"$RUNBOOK_FILES_DIR\" > $(RUNBOOK_MODULEDIR)/dir.txt; sleep 30"]
"#,
    );

    let mut child = spawn_rb("wait", &module);

    let files_dir = wait_for_content(&dir.path().join("dir.txt"), Duration::from_secs(10));
    assert!(Path::new(&files_dir).join("secret").exists());

    terminate(&child);

    let code = wait_for_exit(&mut child, Duration::from_secs(10));
    assert_eq!(code, Some(128));
    assert!(!Path::new(&files_dir).exists());
}

#[test]
fn test_sigterm_removes_every_live_directory() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  outer:
    files:
      a: {content: "outer"}
    cmds:
      - task: inner
  inner:
    inheritEnv: true
    files:
      b: {content: "inner"}
    cmds:
      - embeddedScript: ["printf '%s\n%s' \"`dirname \"$RUNBOOK_FILES_PATH_0\"`\" \"$RUNBOOK_FILES_DIR\" > $(RUNBOOK_MODULEDIR)/dirs.txt; sleep 30"]
"#,
    );

    let mut child = spawn_rb("outer", &module);

    let content = wait_for_content(&dir.path().join("dirs.txt"), Duration::from_secs(10));
    let dirs: Vec<&str> = content.lines().collect();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs[0], dirs[1]);
    assert!(Path::new(dirs[0]).join("a").exists());
    assert!(Path::new(dirs[1]).join("b").exists());

    terminate(&child);

    let code = wait_for_exit(&mut child, Duration::from_secs(10));
    assert_eq!(code, Some(128));
    for dir in dirs {
        assert!(!Path::new(dir).exists());
    }
}

#[test]
fn test_signal_wins_over_failing_command() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  plain:
    cmds:
      - embeddedScript: ["kill -TERM $PPID; exit 3"]
  with_files:
    files:
      f: {content: "x"}
    cmds:
      - embeddedScript: ["kill -TERM $PPID; exit 3"]
"#,
    );

    for task in ["plain", "with_files"] {
        for _ in 0..5 {
            let mut child = spawn_rb(task, &module);
            let code = wait_for_exit(&mut child, Duration::from_secs(10));
            assert_eq!(code, Some(128), "task {}", task);
        }
    }
}
