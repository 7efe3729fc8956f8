//! Entry points: run a task, list a task set.
//!
//! A [`Runner`] composes the whole engine against a [`TaskSource`]:
//!
//! ```text
//! run:  module -> top frame -> source -> plan -> termination -> executor
//! list: module -> top frame -> source -> render
//! ```

mod list;
mod options;

pub use list::ListFormat;
pub use options::{ListOptions, RunOptions, parse_assignment};

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{SourceRequest, TaskSource, YamlTaskSource, module_dir, resolve_module};
use crate::core::dag;
use crate::core::frame::{Frame, Vars, prefixed};
use crate::core::task::TaskSet;
use crate::error::Error;
use crate::execution::{Executor, ScriptEngine, ShellEngine, Termination};

/// Runs and lists tasks obtained from a task source.
pub struct Runner {
    source: Arc<dyn TaskSource>,
    engine: Arc<dyn ScriptEngine>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Arc::new(YamlTaskSource::new()))
    }
}

impl Runner {
    /// Create a runner over `source`, running scripts with [`ShellEngine`].
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self {
            source,
            engine: Arc::new(ShellEngine::default()),
        }
    }

    /// Builder: use another script engine.
    pub fn with_engine(mut self, engine: Arc<dyn ScriptEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Run task `task`.
    ///
    /// Planning errors are returned before anything runs. When the timeout
    /// expires, in-flight commands are cancelled and the result is a
    /// [`Error::Timeout`] wrapping whatever the cancelled command returned.
    pub async fn run(&self, task: &str, options: &RunOptions) -> Result<(), Error> {
        let module = resolve_module(options.module.as_deref())?;
        let frame = Arc::new(top_frame(task, &module, &options.env, &options.args));

        let request = SourceRequest {
            module,
            env: frame.merge().as_ref().clone(),
            properties: options.properties.clone(),
        };
        let tasks = Arc::new(self.source.load(&request)?);

        dag::plan(&tasks, task)?;

        let termination = Termination::new();
        let listener = termination.install()?;

        let timeout = options.timeout.filter(|after| !after.is_zero());
        let cancel = CancellationToken::new();
        let timer = timeout.map(|after| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                info!(?after, "run timed out");
                token.cancel();
            })
        });

        let executor = Executor::new(tasks, termination)
            .with_engine(Arc::clone(&self.engine))
            .with_cancellation(cancel.clone());
        let result = executor.run_task(task, &frame).await;

        if let Some(timer) = timer {
            timer.abort();
        }
        // A signal caught meanwhile wins over the run's own result.
        listener.stop().await;

        match timeout {
            Some(after) if cancel.is_cancelled() => Err(Error::Timeout {
                after,
                source: result.err().map(Box::new),
            }),
            _ => result,
        }
    }

    /// Load the task set and write it to `out` in `format`.
    pub fn list<W: Write>(
        &self,
        format: ListFormat,
        options: &ListOptions,
        out: &mut W,
    ) -> Result<(), Error> {
        let tasks = self.load_for_listing(options)?;
        format.render(&tasks, out)
    }

    fn load_for_listing(&self, options: &ListOptions) -> Result<TaskSet, Error> {
        let module = resolve_module(options.module.as_deref())?;
        let frame = top_frame("", &module, &options.env, &[]);

        let mut properties = options.properties.clone();
        properties.insert(prefixed("LIST_COMMAND_RUNNING"), "true".to_string());

        let request = SourceRequest {
            module,
            env: frame.merge().as_ref().clone(),
            properties,
        };
        let tasks = self.source.load(&request)?;
        debug!(tasks = tasks.len(), "task set loaded");

        Ok(tasks)
    }
}

/// Top-level frame of an invocation: `env` plus the identification variables.
pub fn top_frame(task: &str, module: &Path, env: &Vars, args: &[String]) -> Frame {
    let frame = Frame::new();
    frame.set_vars(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let process_args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let mut vars = vec![(prefixed("ARGC"), process_args.len().to_string())];
    vars.extend(
        process_args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| (prefixed(&format!("ARG_{}", i)), arg)),
    );

    vars.push((prefixed("TASK_ARGC"), args.len().to_string()));
    vars.extend(
        args.iter()
            .enumerate()
            .map(|(i, arg)| (prefixed(&format!("TASK_ARG_{}", i)), arg.clone())),
    );

    vars.push((prefixed("MODULE"), module.display().to_string()));
    vars.push((prefixed("MODULEDIR"), module_dir(module).display().to_string()));
    vars.push((prefixed("TASK"), task.to_string()));

    frame.set_vars(vars);
    frame
}
