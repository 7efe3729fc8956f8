//! Task declarations.
//!
//! A [`TaskSet`] maps task names to [`Task`] declarations. It is handed to the
//! engine wholesale by a task source and never mutated during a run; the
//! executor works on expanded copies of each task's commands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::PathBuf;

use super::types::TaskName;

/// A named unit of work: ordered commands plus scoped environment and files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Commands, run in declared order.
    #[serde(default)]
    pub cmds: Vec<Command>,
    /// Variables set in the task's frame.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Whether the task's frame sees the process environment.
    #[serde(default)]
    pub inherit_env: bool,
    /// Working directory for processes and scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Ephemeral input files keyed by declaration key.
    #[serde(default)]
    pub files: BTreeMap<String, TaskFile>,
}

impl Task {
    /// Create an empty task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a command.
    pub fn with_command(mut self, cmd: Command) -> Self {
        self.cmds.push(cmd);
        self
    }

    /// Builder: set a task variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Builder: capture the process environment into the task's frame.
    pub fn inherit_env(mut self) -> Self {
        self.inherit_env = true;
        self
    }

    /// Builder: set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Builder: declare an ephemeral file.
    pub fn with_file(mut self, key: impl Into<String>, file: TaskFile) -> Self {
        self.files.insert(key.into(), file);
        self
    }

    /// Names of the tasks referenced by this task's commands, in order.
    pub fn referenced_tasks(&self) -> impl Iterator<Item = &TaskName> {
        self.cmds.iter().filter_map(Command::referenced_task)
    }
}

/// A single command of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// What the command does.
    #[serde(flatten)]
    pub kind: CommandKind,
    /// Abort the task when this command fails.
    #[serde(default = "default_true")]
    pub must_succeed: bool,
}

fn default_true() -> bool {
    true
}

/// The three command variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// External process: program followed by its arguments.
    #[serde(rename = "argv")]
    Process(Vec<String>),
    /// Embedded script: source followed by its positional parameters.
    #[serde(rename = "embeddedScript")]
    Script(Vec<String>),
    /// Call into another task of the same task set.
    #[serde(rename = "task")]
    Task(TaskName),
}

impl Command {
    /// An external process command.
    pub fn process<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: CommandKind::Process(argv.into_iter().map(Into::into).collect()),
            must_succeed: true,
        }
    }

    /// An embedded script with positional parameters.
    pub fn script<I, S>(source: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = vec![source.into()];
        words.extend(args.into_iter().map(Into::into));
        Self {
            kind: CommandKind::Script(words),
            must_succeed: true,
        }
    }

    /// A reference to another task.
    pub fn task(name: impl Into<TaskName>) -> Self {
        Self {
            kind: CommandKind::Task(name.into()),
            must_succeed: true,
        }
    }

    /// Builder: log and continue when this command fails.
    pub fn allow_failure(mut self) -> Self {
        self.must_succeed = false;
        self
    }

    /// The referenced task, for task references.
    pub fn referenced_task(&self) -> Option<&TaskName> {
        match &self.kind {
            CommandKind::Task(name) => Some(name),
            _ => None,
        }
    }

    /// The words subject to variable expansion.
    pub fn words(&self) -> &[String] {
        match &self.kind {
            CommandKind::Process(words) | CommandKind::Script(words) => words,
            CommandKind::Task(_) => &[],
        }
    }

    /// Mutable access to the words subject to variable expansion.
    pub fn words_mut(&mut self) -> &mut [String] {
        match &mut self.kind {
            CommandKind::Process(words) | CommandKind::Script(words) => words,
            CommandKind::Task(_) => &mut [],
        }
    }
}

/// An ephemeral input file declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFile {
    /// File content, written verbatim.
    pub content: String,
    /// File name inside the task's directory; defaults to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Variable bound to the file's path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varname: Option<String>,
}

impl TaskFile {
    /// A file with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Builder: set the file name.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Builder: bind the file path to a variable.
    pub fn varname(mut self, varname: impl Into<String>) -> Self {
        self.varname = Some(varname.into());
        self
    }
}

/// All tasks of one invocation, keyed by unique name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSet(BTreeMap<TaskName, Task>);

impl TaskSet {
    /// Create an empty task set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a task, replacing any task with the same name.
    pub fn with_task(mut self, name: impl Into<TaskName>, task: Task) -> Self {
        self.insert(name, task);
        self
    }

    /// Add a task, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<TaskName>, task: Task) -> Option<Task> {
        self.0.insert(name.into(), task)
    }

    /// Look a task up by name.
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.0.get(name)
    }

    /// Look a task up by name, along with its stored name.
    pub fn entry(&self, name: &str) -> Option<(&TaskName, &Task)> {
        self.0.get_key_value(name)
    }

    /// Check if a task exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Task names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &TaskName> {
        self.0.keys()
    }

    /// Iterate over tasks in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, TaskName, Task> {
        self.0.iter()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TaskName, Task)> for TaskSet {
    fn from_iter<I: IntoIterator<Item = (TaskName, Task)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = (&'a TaskName, &'a Task);
    type IntoIter = btree_map::Iter<'a, TaskName, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
