//! Testing utilities for users of the runbook library.
//!
//! This module provides helpers for testing task sets without a module file
//! or real script interpreter:
//!
//! - [`StaticTaskSource`]: A task source returning a fixed task set
//! - [`RecordingScriptEngine`]: A script engine recording every run
//! - [`ScriptRun`]: One recorded script run

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigError, SourceRequest, TaskSource};
use crate::core::frame::Vars;
use crate::core::task::TaskSet;
use crate::execution::{CommandError, CommandFailure, LaunchContext, Script, ScriptEngine};

/// A task source that ignores the module and returns a fixed task set.
///
/// Every request is recorded so tests can check the environment and
/// properties handed to the source.
///
/// # Example
///
/// ```
/// use runbook::testing::StaticTaskSource;
/// use runbook::{Command, Task, TaskSet};
///
/// let source = StaticTaskSource::new(
///     TaskSet::new().with_task("c", Task::new().with_command(Command::process(["echo", "hi"]))),
/// );
/// assert!(source.requests().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct StaticTaskSource {
    tasks: TaskSet,
    requests: Mutex<Vec<SourceRequest>>,
}

impl StaticTaskSource {
    /// Create a source returning `tasks`.
    pub fn new(tasks: TaskSet) -> Self {
        Self {
            tasks,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SourceRequest> {
        self.requests.lock().clone()
    }
}

impl TaskSource for StaticTaskSource {
    fn load(&self, request: &SourceRequest) -> Result<TaskSet, ConfigError> {
        self.requests.lock().push(request.clone());
        Ok(self.tasks.clone())
    }
}

/// A recorded embedded script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRun {
    /// Script name, `<task>[<command index>]`.
    pub name: String,
    /// Expanded script source.
    pub source: String,
    /// Expanded positional parameters.
    pub args: Vec<String>,
    /// Environment the script received.
    pub env: Vars,
    /// Working directory override.
    pub working_dir: Option<PathBuf>,
}

/// A script engine that runs nothing and records every script.
///
/// Scripts succeed unless their source was registered with
/// [`fail_with`](Self::fail_with).
///
/// # Example
///
/// ```
/// use runbook::testing::RecordingScriptEngine;
///
/// let engine = RecordingScriptEngine::new();
/// engine.fail_with("exit 3", 3);
/// assert!(engine.runs().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RecordingScriptEngine {
    runs: Mutex<Vec<ScriptRun>>,
    failures: Mutex<HashMap<String, i32>>,
}

impl RecordingScriptEngine {
    /// Create an engine where every script succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make scripts whose expanded source is `source` exit with `code`.
    pub fn fail_with(&self, source: impl Into<String>, code: i32) {
        self.failures.lock().insert(source.into(), code);
    }

    /// Recorded runs, in order.
    pub fn runs(&self) -> Vec<ScriptRun> {
        self.runs.lock().clone()
    }

    /// Recorded script sources, in order.
    pub fn sources(&self) -> Vec<String> {
        self.runs.lock().iter().map(|r| r.source.clone()).collect()
    }
}

#[async_trait]
impl ScriptEngine for RecordingScriptEngine {
    async fn run(&self, script: Script<'_>, ctx: &LaunchContext) -> Result<(), CommandError> {
        if ctx.cancel.is_cancelled() {
            return Err(CommandError::cancelled());
        }

        self.runs.lock().push(ScriptRun {
            name: script.name.to_string(),
            source: script.source.to_string(),
            args: script.args.to_vec(),
            env: ctx.env.as_ref().clone(),
            working_dir: ctx.working_dir.clone(),
        });

        match self.failures.lock().get(script.source) {
            Some(&code) => Err(CommandError::new(code, CommandFailure::Exited(code))),
            None => Ok(()),
        }
    }
}

/// Shared handle to a [`RecordingScriptEngine`], usable as a script engine.
pub fn recording_engine() -> (Arc<RecordingScriptEngine>, Arc<dyn ScriptEngine>) {
    let engine = Arc::new(RecordingScriptEngine::new());
    let shared: Arc<dyn ScriptEngine> = Arc::clone(&engine) as Arc<dyn ScriptEngine>;
    (engine, shared)
}
