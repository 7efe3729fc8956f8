//! Task-set sources.
//!
//! The engine never parses task declarations itself. A [`TaskSource`] turns a
//! module locator plus environment and property overrides into a [`TaskSet`].

use std::path::{Path, PathBuf};

use crate::core::frame::Vars;
use crate::core::task::TaskSet;

use super::error::ConfigError;

/// Default module file name searched for when no module is given.
pub const MODULE_FILENAME: &str = "tasks.yaml";

/// What a source needs to produce a task set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRequest {
    /// Module locator.
    pub module: PathBuf,
    /// Environment overrides visible to the module.
    pub env: Vars,
    /// External properties visible to the module.
    pub properties: Vars,
}

/// Produces the task set for one invocation.
pub trait TaskSource: Send + Sync {
    /// Evaluate the module described by `request`.
    fn load(&self, request: &SourceRequest) -> Result<TaskSet, ConfigError>;
}

/// Find [`MODULE_FILENAME`] in `from` or the closest ancestor holding one.
pub fn find_module(from: &Path) -> Result<PathBuf, ConfigError> {
    from.ancestors()
        .map(|dir| dir.join(MODULE_FILENAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConfigError::NoModule {
            filename: MODULE_FILENAME.to_string(),
            from: from.to_path_buf(),
        })
}

/// Resolve the module to use: the given one, else the closest from the
/// current directory.
pub fn resolve_module(module: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match module {
        Some(module) => Ok(module.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
            find_module(&cwd)
        }
    }
}

/// Directory holding `module`; `.` for a bare file name.
pub fn module_dir(module: &Path) -> PathBuf {
    match module.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
