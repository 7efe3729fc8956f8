//! Options of the run and list entry points.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::frame::Vars;

/// Options for [`Runner::run`](super::Runner::run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Arguments following the task name.
    pub args: Vec<String>,
    /// Variables set in the top-level frame.
    pub env: Vars,
    /// Module to load; searched from the current directory when unset.
    pub module: Option<PathBuf>,
    /// Properties handed to the task source.
    pub properties: Vars,
    /// Deadline for the whole run; zero means none.
    pub timeout: Option<Duration>,
}

impl RunOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the task arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set a top-level variable.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Builder: set the module.
    pub fn module(mut self, module: impl Into<PathBuf>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Builder: set a property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder: set the run deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for [`Runner::list`](super::Runner::list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Variables visible to the task source.
    pub env: Vars,
    /// Module to load; searched from the current directory when unset.
    pub module: Option<PathBuf>,
    /// Properties handed to the task source.
    pub properties: Vars,
}

impl ListOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a variable.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Builder: set the module.
    pub fn module(mut self, module: impl Into<PathBuf>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Builder: set a property.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Split a `NAME=VALUE` assignment; a missing `=VALUE` yields `default`.
pub fn parse_assignment(assignment: &str, default: &str) -> (String, String) {
    match assignment.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (assignment.to_string(), default.to_string()),
    }
}
