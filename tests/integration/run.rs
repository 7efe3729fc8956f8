//! Running YAML modules end to end.

use crate::common::{rb, write_module};
use runbook::{DagError, Error, RunOptions, Runner};
use tempfile::TempDir;

#[tokio::test]
async fn test_run_echo_task() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  c:
    cmds:
      - argv: ["echo", "hi"]
"#,
    );

    Runner::default()
        .run("c", &RunOptions::new().module(&module))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_commands_run_in_order_with_task_variables() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  build:
    inheritEnv: true
    workingDir: $(RUNBOOK_MODULEDIR)
    env:
      TARGET: ${prop:target}
    cmds:
      - embeddedScript: ["echo \"one $TARGET\" >> out.txt"]
      - task: package
  package:
    cmds:
      - embeddedScript: ["echo \"two $1 $2\" >> $(RUNBOOK_MODULEDIR)/out.txt", "$(TARGET)", "$(RUNBOOK_CURRENT_TASK)"]
"#,
    );

    let options = RunOptions::new()
        .module(&module)
        .property("target", "linux");
    Runner::default().run("build", &options).await.unwrap();

    let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(out, "one linux\ntwo linux package\n");
}

#[tokio::test]
async fn test_must_succeed_failure_keeps_exit_code() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  failing:
    workingDir: $(RUNBOOK_MODULEDIR)
    cmds:
      - embeddedScript: ["exit 3"]
      - embeddedScript: ["echo never > never.txt"]
"#,
    );

    let err = Runner::default()
        .run("failing", &RunOptions::new().module(&module))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert!(!dir.path().join("never.txt").exists());
}

#[tokio::test]
async fn test_ignored_failure_continues() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  tolerant:
    workingDir: $(RUNBOOK_MODULEDIR)
    cmds:
      - argv: ["/bin/sh", "-c", "exit 4"]
        mustSucceed: false
      - embeddedScript: ["echo after > after.txt"]
"#,
    );

    Runner::default()
        .run("tolerant", &RunOptions::new().module(&module))
        .await
        .unwrap();

    assert!(dir.path().join("after.txt").exists());
}

#[tokio::test]
async fn test_cycle_fails_before_any_side_effect() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  a:
    workingDir: $(RUNBOOK_MODULEDIR)
    files:
      f:
        content: x
    cmds:
      - embeddedScript: ["echo ran > witness.txt"]
      - task: b
  b:
    cmds:
      - task: a
"#,
    );

    let err = Runner::default()
        .run("a", &RunOptions::new().module(&module))
        .await
        .unwrap_err();

    match err {
        Error::Plan(DagError::CycleDetected { start, .. }) => assert_eq!(start.as_str(), "a"),
        other => panic!("Expected CycleDetected, got {:?}", other),
    }
    assert!(!dir.path().join("witness.txt").exists());
}

#[tokio::test]
async fn test_unknown_task() {
    let dir = TempDir::new().unwrap();
    let module = write_module(dir.path(), "tasks:\n  c: {}\n");

    let err = Runner::default()
        .run("nope", &RunOptions::new().module(&module))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Plan(DagError::UnknownTask { .. })));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_module_is_config_error() {
    let dir = TempDir::new().unwrap();

    let err = Runner::default()
        .run("c", &RunOptions::new().module(dir.path().join("tasks.yaml")))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_binary_runs_default_command() {
    let dir = TempDir::new().unwrap();
    write_module(
        dir.path(),
        r#"
tasks:
  c:
    cmds:
      - argv: ["echo", "hi"]
"#,
    );

    let output = rb().arg("c").current_dir(dir.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");
}

#[test]
fn test_binary_exit_code_and_task_args() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  code:
    cmds:
      - embeddedScript: ["exit $1", "$(RUNBOOK_TASK_ARG_0)"]
"#,
    );

    let status = rb()
        .args(["run", "code", "-m"])
        .arg(&module)
        .args(["--", "7"])
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(7));
}

#[test]
fn test_binary_env_override() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  show:
    cmds:
      - embeddedScript: ["printf '%s|%s' \"$GREETING\" \"$EMPTY\""]
"#,
    );

    let output = rb()
        .args(["show", "-e", "GREETING=hello", "-e", "EMPTY", "-m"])
        .arg(&module)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello|");
}
