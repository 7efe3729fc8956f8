//! Recursive task execution.
//!
//! The [`Executor`] runs a task of a planned task set depth-first:
//!
//! 1. a new [`Frame`] enclosed in the caller's gets the task's variables,
//! 2. the task's files are materialized and published into that frame,
//! 3. every command word and the working directory are expanded against the
//!    frame,
//! 4. commands run strictly one after the other.
//!
//! A task reference runs the referenced task with the current task's frame as
//! its enclosing scope. A failing command aborts the task only when it must
//! succeed; other failures are logged and execution continues.
//!
//! The task's files are removed when the invocation returns, whatever the
//! outcome.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::core::dag::DagError;
use crate::core::expand::expand;
use crate::core::frame::Frame;
use crate::core::task::{CommandKind, Task, TaskSet};
use crate::core::types::TaskName;
use crate::error::Error;

use super::command::{
    CommandError, LaunchContext, Script, ScriptEngine, ShellEngine, display_command, run_process,
};
use super::files::TaskFiles;
use super::termination::Termination;

/// Future returned by [`Executor::run_task`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// Runs tasks of a task set.
pub struct Executor {
    tasks: Arc<TaskSet>,
    engine: Arc<dyn ScriptEngine>,
    termination: Termination,
    cancel: CancellationToken,
}

impl Executor {
    /// Create an executor running embedded scripts with [`ShellEngine`].
    pub fn new(tasks: Arc<TaskSet>, termination: Termination) -> Self {
        Self {
            tasks,
            engine: Arc::new(ShellEngine::default()),
            termination,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder: use another script engine.
    pub fn with_engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Builder: cancel in-flight commands when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The task set being executed.
    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Run task `name` enclosed in `parent`.
    ///
    /// The task set is expected to be planned already; an unknown name still
    /// fails cleanly.
    pub fn run_task<'a>(&'a self, name: &'a str, parent: &'a Arc<Frame>) -> TaskFuture<'a> {
        Box::pin(async move {
            info!(cur = name, "task");

            let Some(task) = self.tasks.get(name) else {
                return Err(DagError::UnknownTask {
                    name: TaskName::new(name),
                }
                .into());
            };

            let frame = Arc::new(task_frame(name, task, parent));

            let mut files = TaskFiles::materialize(&task.files, &self.termination)?;
            let result = match files.publish(&frame) {
                Ok(()) => self.run_commands(name, task, &frame).await,
                Err(err) => Err(err),
            };

            if let Err(err) = files.cleanup() {
                warn!(cur = name, error = %err, "task files cleanup failed");
            }

            result
        })
    }

    async fn run_commands(&self, name: &str, task: &Task, frame: &Arc<Frame>) -> Result<(), Error> {
        let mapping = frame.expand_mapping();
        let mut cmds = task.cmds.clone();
        for cmd in &mut cmds {
            for word in cmd.words_mut() {
                *word = expand(word, &mapping);
            }
        }

        let working_dir = task
            .working_dir
            .as_ref()
            .map(|dir| PathBuf::from(expand(&dir.to_string_lossy(), &mapping)));

        let launch = LaunchContext {
            env: frame.merge(),
            working_dir,
            cancel: self.cancel.clone(),
        };
        trace!(cur = name, env = ?frame.env_list(), "task environment");

        for (index, cmd) in cmds.iter().enumerate() {
            let outcome = match &cmd.kind {
                CommandKind::Task(callee) => self.run_task(callee.as_str(), frame).await,
                CommandKind::Script(words) => {
                    info!(cur = name, run = "script", "{}", display_command(words));
                    self.run_script(name, index, words, &launch).await
                }
                CommandKind::Process(argv) => {
                    info!(cur = name, run = "command", "{}", display_command(argv));
                    run_process(argv, &launch).await.map_err(Error::from)
                }
            };

            if let Err(err) = outcome {
                if cmd.must_succeed {
                    error!(cur = name, error = %err, "command failed");
                    return Err(err);
                }
                info!(cur = name, error = %err, "ignoring failed command");
            }
        }

        Ok(())
    }

    async fn run_script(
        &self,
        task: &str,
        index: usize,
        words: &[String],
        launch: &LaunchContext,
    ) -> Result<(), Error> {
        let Some((source, args)) = words.split_first() else {
            return Err(CommandError::empty().into());
        };

        let name = format!("{}[{}]", task, index);
        let script = Script {
            name: &name,
            source,
            args,
        };

        Ok(self.engine.run(script, launch).await?)
    }
}

fn task_frame(name: &str, task: &Task, parent: &Arc<Frame>) -> Frame {
    let frame = Frame::enclosed(Arc::clone(parent));

    frame.set_vars(task.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if task.inherit_env {
        frame.inherit_environ();
    }
    frame.set_prefixed_var("CURRENT_TASK", name);

    frame
}
