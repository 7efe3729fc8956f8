//! runbook - run named tasks declared in a YAML module.
//!
//! A task set maps task names to tasks: ordered commands (external
//! processes, embedded scripts, calls to other tasks) with scoped variables
//! and ephemeral input files. Running a task validates its call graph first,
//! then executes it depth-first.
//!
//! ```no_run
//! use runbook::{RunOptions, Runner};
//!
//! # async fn demo() -> Result<(), runbook::Error> {
//! let runner = Runner::default();
//! runner.run("build", &RunOptions::new().module("tasks.yaml")).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod execution;
pub mod logging;
pub mod testing;

pub use commands::{ListFormat, ListOptions, RunOptions, Runner};
pub use config::{ConfigError, SourceRequest, TaskSource, YamlTaskSource};
pub use crate::core::dag::{DagError, plan};
pub use crate::core::frame::{Frame, Vars};
pub use crate::core::task::{Command, CommandKind, Task, TaskFile, TaskSet};
pub use crate::core::types::TaskName;
pub use error::Error;
pub use execution::{
    CommandError, CommandFailure, Executor, ScriptEngine, ShellEngine, TaskFiles, Termination,
};
