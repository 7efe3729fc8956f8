//! Task execution engine.
//!
//! This module provides the execution infrastructure for running tasks:
//! process and script launching, ephemeral task files, signal-driven
//! shutdown and the recursive executor.

mod command;
mod executor;
mod files;
mod termination;

pub use command::{
    CommandError, CommandFailure, DISPLAY_LEN, LaunchContext, Script, ScriptEngine, ShellEngine,
    display_command, run_process,
};
pub use executor::{Executor, TaskFuture};
pub use files::{DIR_PREFIX, FILES_COUNT, TaskFiles};
pub use termination::{EXIT_TERMINATED, SignalListener, Termination};
