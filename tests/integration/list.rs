//! Listing task sets.

use crate::common::{rb, write_module};
use runbook::{ListFormat, ListOptions, Runner};
use tempfile::TempDir;

const MODULE: &str = r#"
tasks:
  c:
    cmds:
      - argv: ["echo", "hi"]
"#;

#[test]
fn test_list_names() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        "tasks:\n  zeta: {}\n  alpha: {}\n  mid: {}\n",
    );

    let mut out = Vec::new();
    Runner::default()
        .list(ListFormat::Name, &ListOptions::new().module(&module), &mut out)
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "alpha\nmid\nzeta\n");
}

#[test]
fn test_list_json_single_task() {
    let dir = TempDir::new().unwrap();
    let module = write_module(dir.path(), MODULE);

    let mut out = Vec::new();
    Runner::default()
        .list(ListFormat::Json, &ListOptions::new().module(&module), &mut out)
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(object["c"]["cmds"][0]["argv"][1], "hi");
}

#[test]
fn test_list_sees_listing_property() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        dir.path(),
        "tasks:\n  ${prop:RUNBOOK_LIST_COMMAND_RUNNING}: {}\n",
    );

    let mut out = Vec::new();
    Runner::default()
        .list(ListFormat::Name, &ListOptions::new().module(&module), &mut out)
        .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "true\n");
}

#[test]
fn test_binary_list_outputs() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), MODULE);

    let output = rb().arg("list").current_dir(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "c\n");

    let output = rb()
        .args(["list", "-o", "json"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 1);
}

#[test]
fn test_binary_list_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), MODULE);

    let output = rb()
        .args(["list", "-o", "yaml"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_binary_list_without_module_fails() {
    let dir = TempDir::new().unwrap();

    let output = rb().arg("list").current_dir(dir.path()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
}
