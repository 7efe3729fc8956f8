//! Ephemeral task files through a real run.

use crate::common::write_module;
use runbook::{RunOptions, Runner};
use tempfile::TempDir;

#[tokio::test]
async fn test_files_written_then_removed() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  files:
    inheritEnv: true
    workingDir: $(RUNBOOK_MODULEDIR)
    files:
      greeting:
        content: "hello ${prop:who}\n"
        varname: GREETING_FILE
      config:
        content: "key = value\n"
        filename: app.conf
    cmds:
      - embeddedScript:
          - |
            cat "$GREETING_FILE" > seen.txt
            cat "$RUNBOOK_FILE_config" >> seen.txt
            ls "$RUNBOOK_FILES_DIR" | wc -l | tr -d ' ' >> seen.txt
            echo "$RUNBOOK_FILES_COUNT $RUNBOOK_FILES_KEY_0 $RUNBOOK_FILES_KEY_1" >> seen.txt
            printf '%s' "$RUNBOOK_FILES_DIR" > dir.txt
"#,
    );

    Runner::default()
        .run("files", &RunOptions::new().module(&module).property("who", "world"))
        .await
        .unwrap();

    let seen = std::fs::read_to_string(dir.path().join("seen.txt")).unwrap();
    assert_eq!(seen, "hello world\nkey = value\n2\n2 config greeting\n");

    let files_dir = std::fs::read_to_string(dir.path().join("dir.txt")).unwrap();
    assert!(!files_dir.is_empty());
    assert!(!std::path::Path::new(&files_dir).exists());
}

#[tokio::test]
async fn test_files_removed_when_task_fails() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  failing:
    workingDir: $(RUNBOOK_MODULEDIR)
    files:
      f:
        content: x
    cmds:
      - embeddedScript: ["printf '%s' \"$RUNBOOK_FILES_DIR\" > dir.txt; exit 9"]
"#,
    );

    let err = Runner::default()
        .run("failing", &RunOptions::new().module(&module))
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 9);

    let files_dir = std::fs::read_to_string(dir.path().join("dir.txt")).unwrap();
    assert!(!std::path::Path::new(&files_dir).exists());
}

#[tokio::test]
async fn test_nested_task_counts_ancestor_files() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        r#"
tasks:
  outer:
    files:
      a: {content: "1"}
      b: {content: "2"}
    cmds:
      - task: inner
  inner:
    inheritEnv: true
    workingDir: $(RUNBOOK_MODULEDIR)
    files:
      c: {content: "3"}
    cmds:
      - embeddedScript: ["echo \"$RUNBOOK_FILES_COUNT $RUNBOOK_FILES_KEY_2\" > count.txt; cat \"$RUNBOOK_FILES_PATH_0\" >> count.txt"]
"#,
    );

    Runner::default()
        .run("outer", &RunOptions::new().module(&module))
        .await
        .unwrap();

    let count = std::fs::read_to_string(dir.path().join("count.txt")).unwrap();
    assert_eq!(count, "3 c\n1");
}
