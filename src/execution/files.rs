//! Ephemeral task files.
//!
//! A task declaring files gets one private temporary directory holding one
//! file per declaration. The directory is removed exactly once, by whichever
//! comes first:
//!
//! - [`TaskFiles::cleanup`] (or drop) when the task invocation returns,
//! - the cleanup worker registered with [`Termination`] when a signal arrives.
//!
//! Tasks without files create no directory and register nothing.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::frame::{Frame, prefixed};
use crate::core::task::TaskFile;
use crate::error::Error;

use super::termination::Termination;

/// Prefix of every task-files directory name.
pub const DIR_PREFIX: &str = "runbook_taskfiles_";

/// Name of the variable counting the files visible to a task.
pub const FILES_COUNT: &str = "FILES_COUNT";

type SharedDir = Arc<Mutex<Option<TempDir>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WrittenFile {
    path: PathBuf,
    varname: Option<String>,
}

/// Materialized files of one task invocation.
#[derive(Debug)]
pub struct TaskFiles {
    dir: SharedDir,
    path: Option<PathBuf>,
    files: BTreeMap<String, WrittenFile>,
    released: CancellationToken,
}

impl TaskFiles {
    fn empty() -> Self {
        Self {
            dir: SharedDir::default(),
            path: None,
            files: BTreeMap::new(),
            released: CancellationToken::new(),
        }
    }

    /// Create the directory and write every declared file, in key order.
    ///
    /// Must be called within a Tokio runtime when `declared` is not empty.
    /// On error, anything already created is removed.
    pub fn materialize(
        declared: &BTreeMap<String, TaskFile>,
        termination: &Termination,
    ) -> Result<Self, Error> {
        if declared.is_empty() {
            return Ok(Self::empty());
        }

        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir()
            .map_err(|e| Error::task_file("error creating temporary directory", e))?;
        let path = dir.path().to_path_buf();

        let mut files = Self {
            dir: Arc::new(Mutex::new(Some(dir))),
            path: Some(path.clone()),
            files: BTreeMap::new(),
            released: CancellationToken::new(),
        };

        let shared = Arc::clone(&files.dir);
        termination.register(files.released.clone(), move || {
            if let Err(err) = remove(&shared) {
                warn!(error = %err, "removing task files on shutdown");
            }
        });

        for (key, file) in declared {
            let name = file.filename.as_deref().unwrap_or(key);
            if !is_plain_file_name(name) {
                return Err(Error::task_file(
                    format!("invalid file name `{}` for `{}`", name, key),
                    std::io::Error::from(std::io::ErrorKind::InvalidInput),
                ));
            }

            let file_path = path.join(name);
            std::fs::write(&file_path, &file.content).map_err(|e| {
                Error::task_file(
                    format!("writing to temporary file: {}", file_path.display()),
                    e,
                )
            })?;

            files.files.insert(
                key.clone(),
                WrittenFile {
                    path: file_path,
                    varname: file.varname.clone(),
                },
            );
        }

        debug!(dir = %path.display(), count = files.files.len(), "task files written");
        Ok(files)
    }

    /// The directory holding the files, if one was created.
    pub fn dir(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Path of the file declared under `key`.
    pub fn path(&self, key: &str) -> Option<&Path> {
        self.files.get(key).map(|f| f.path.as_path())
    }

    /// Number of files written.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no file was declared.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Publish the file variables into `frame`.
    ///
    /// `FILES_COUNT` adds this task's files to the count visible from the
    /// enclosing frame, and the `FILES_KEY_<i>` / `FILES_PATH_<i>` indices
    /// continue from it.
    pub fn publish(&self, frame: &Frame) -> Result<(), Error> {
        if self.files.is_empty() {
            return Ok(());
        }

        let count_name = prefixed(FILES_COUNT);
        let enclosing_count = match frame.enclosing().and_then(|f| f.get(&count_name)) {
            Some(value) => value.parse::<usize>().map_err(|e| {
                Error::task_file(
                    format!("converting environment variable `{}` value to integer", count_name),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                )
            })?,
            None => 0,
        };

        let mut vars = vec![(count_name, (enclosing_count + self.files.len()).to_string())];

        if let Some(dir) = &self.path {
            vars.push((prefixed("FILES_DIR"), dir.display().to_string()));
        }

        for (index, (key, file)) in self.files.iter().enumerate() {
            let index = enclosing_count + index;
            let path = file.path.display().to_string();

            vars.push((prefixed(&format!("FILE_{}", key)), path.clone()));
            vars.push((prefixed(&format!("FILES_KEY_{}", index)), key.clone()));
            vars.push((prefixed(&format!("FILES_PATH_{}", index)), path.clone()));

            if let Some(varname) = &file.varname {
                vars.push((varname.clone(), path));
            }
        }

        frame.set_vars(vars);
        Ok(())
    }

    /// Remove the directory now, if not already removed.
    pub fn cleanup(&mut self) -> Result<(), Error> {
        self.released.cancel();

        remove(&self.dir).map_err(|e| {
            let dir = self.path.as_deref().unwrap_or(Path::new(""));
            Error::task_file(
                format!("removing temporary directory: {}", dir.display()),
                e,
            )
        })
    }
}

impl Drop for TaskFiles {
    fn drop(&mut self) {
        if let Err(err) = self.cleanup() {
            warn!(error = %err, "task files cleanup failed");
        }
    }
}

fn remove(dir: &SharedDir) -> std::io::Result<()> {
    match dir.lock().take() {
        Some(dir) => dir.close(),
        None => Ok(()),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
