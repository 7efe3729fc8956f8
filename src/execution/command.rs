//! Process and script launching.
//!
//! Both external processes and embedded scripts run with:
//!
//! - exactly the variables of the task's frame (the inherited environment is
//!   cleared first),
//! - the task's working directory, or the runner's own,
//! - standard streams connected to the runner's.
//!
//! Every launch observes the run's [`CancellationToken`]: when it fires the
//! child is killed and reaped, and its status is reported as the command's
//! failure. A launch attempted after cancellation spawns nothing.
//!
//! # Exit codes
//!
//! | Outcome                     | Exit code        |
//! |-----------------------------|------------------|
//! | exited with status `n != 0` | `n`              |
//! | killed by signal `s`        | `128 + s`        |
//! | could not be launched       | `1`              |
//! | cancelled before launch     | `1`              |

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::frame::Vars;
use crate::error::EXIT_FAILURE;

/// Maximum length of a command line shown in logs.
pub const DISPLAY_LEN: usize = 72;

/// Why a command failed.
#[derive(Debug, Error)]
pub enum CommandFailure {
    /// The child exited with a non-zero status.
    #[error("exit status {0}")]
    Exited(i32),

    /// The child was terminated by a signal.
    #[error("terminated by signal {0}")]
    Signaled(i32),

    /// The child could not be spawned or waited for.
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before the command started.
    #[error("cancelled")]
    Cancelled,

    /// A command without program or script source.
    #[error("empty command")]
    EmptyCommand,

    /// The script engine rejected the script.
    #[error("script `{name}`: {message}")]
    Script { name: String, message: String },
}

/// A failed command and the exit code it maps to.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct CommandError {
    /// Exit code to report at the process boundary.
    pub exit_code: i32,
    /// What went wrong.
    #[source]
    pub cause: CommandFailure,
}

impl CommandError {
    /// Create a command error.
    pub fn new(exit_code: i32, cause: CommandFailure) -> Self {
        Self { exit_code, cause }
    }

    /// A command cancelled before it started.
    pub fn cancelled() -> Self {
        Self::new(EXIT_FAILURE, CommandFailure::Cancelled)
    }

    /// A command with nothing to run.
    pub fn empty() -> Self {
        Self::new(EXIT_FAILURE, CommandFailure::EmptyCommand)
    }

    fn launch(program: &str, source: std::io::Error) -> Self {
        Self::new(
            EXIT_FAILURE,
            CommandFailure::Launch {
                program: program.to_string(),
                source,
            },
        )
    }

    /// Map a child's exit status, `Ok` on success.
    pub fn check(status: ExitStatus) -> Result<(), Self> {
        if status.success() {
            return Ok(());
        }

        if let Some(code) = status.code() {
            return Err(Self::new(code, CommandFailure::Exited(code)));
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signo) = status.signal() {
                return Err(Self::new(128 + signo, CommandFailure::Signaled(signo)));
            }
        }

        Err(Self::new(EXIT_FAILURE, CommandFailure::Exited(EXIT_FAILURE)))
    }
}

/// Where and how a command runs.
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    /// Complete environment of the child.
    pub env: Arc<Vars>,
    /// Working directory; the runner's own when unset.
    pub working_dir: Option<PathBuf>,
    /// Cancels the in-flight child.
    pub cancel: CancellationToken,
}

impl LaunchContext {
    fn configure(&self, cmd: &mut Command) {
        cmd.env_clear();
        cmd.envs(self.env.iter());

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);
    }
}

/// Spawn `cmd` and wait for it, killing it if `cancel` fires first.
async fn supervise(
    mut cmd: Command,
    program: &str,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    if cancel.is_cancelled() {
        return Err(CommandError::cancelled());
    }

    let mut child = cmd
        .spawn()
        .map_err(|source| CommandError::launch(program, source))?;

    let status = tokio::select! {
        status = child.wait() => status,
        _ = cancel.cancelled() => {
            debug!(program, "cancelling command");
            if let Err(err) = child.start_kill() {
                debug!(program, error = %err, "child already gone");
            }
            child.wait().await
        }
    };

    let status = status.map_err(|source| CommandError::launch(program, source))?;
    CommandError::check(status)
}

/// Run an external process: `argv[0]` with arguments `argv[1..]`.
pub async fn run_process(argv: &[String], ctx: &LaunchContext) -> Result<(), CommandError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(CommandError::empty());
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    ctx.configure(&mut cmd);

    supervise(cmd, program, &ctx.cancel).await
}

/// An embedded script ready to run.
#[derive(Debug, Clone, Copy)]
pub struct Script<'a> {
    /// Name used in diagnostics and as `$0`: `<task>[<command index>]`.
    pub name: &'a str,
    /// Script source.
    pub source: &'a str,
    /// Positional parameters.
    pub args: &'a [String],
}

/// Interpreter for embedded scripts.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Run `script`, mapping its exit status into a [`CommandError`].
    async fn run(&self, script: Script<'_>, ctx: &LaunchContext) -> Result<(), CommandError>;
}

/// Runs embedded scripts with a POSIX shell: `sh -c <source> <name> <args...>`.
#[derive(Debug, Clone)]
pub struct ShellEngine {
    shell: PathBuf,
}

impl ShellEngine {
    /// Use the given shell binary.
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellEngine {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl ScriptEngine for ShellEngine {
    async fn run(&self, script: Script<'_>, ctx: &LaunchContext) -> Result<(), CommandError> {
        let program = self.shell.to_string_lossy();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(script.source).arg(script.name).args(script.args);
        ctx.configure(&mut cmd);

        supervise(cmd, &program, &ctx.cancel).await
    }
}

/// One-line rendering of a command for logs.
///
/// Newline runs become single spaces and the result is cut at the last space
/// before [`DISPLAY_LEN`] characters, with `...` appended.
pub fn display_command(words: &[String]) -> String {
    let mut line = String::with_capacity(DISPLAY_LEN);

    for word in words {
        line.push(' ');
        let mut in_newlines = false;
        for c in word.chars() {
            if c == '\n' {
                if !in_newlines {
                    line.push(' ');
                }
                in_newlines = true;
            } else {
                line.push(c);
                in_newlines = false;
            }
        }
    }

    truncate(line.trim(), DISPLAY_LEN)
}

fn truncate(text: &str, max_len: usize) -> String {
    let mut last_space = None;

    for (count, (index, c)) in text.char_indices().enumerate() {
        if c.is_whitespace() {
            last_space = Some(index);
        }

        if count == max_len {
            let end = last_space.unwrap_or(index);
            return format!("{}...", &text[..end]);
        }
    }

    text.to_string()
}
