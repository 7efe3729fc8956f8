//! YAML task modules.
//!
//! A module is a YAML document whose root holds a `tasks:` mapping:
//!
//! ```yaml
//! tasks:
//!   build:
//!     env:
//!       PROFILE: release
//!     cmds:
//!       - argv: ["cargo", "build", "--profile", "$(PROFILE)"]
//!       - embeddedScript: ["echo built for $1", "${prop:target}"]
//!         mustSucceed: false
//!       - task: package
//!   package:
//!     files:
//!       manifest:
//!         content: "name = ${env:USER}"
//!         varname: MANIFEST
//!     cmds:
//!       - argv: ["cat", "$(MANIFEST)"]
//! ```
//!
//! Every string is interpolated before the task set is built: `${env:NAME}`
//! reads the request environment (then the process environment),
//! `${prop:NAME}` reads the request properties and `$${` is a literal `${`.
//! Any other `${...}` is shell syntax and is kept as written. `$(NAME)`
//! references are left alone; they are expanded per task at run time.

use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

use crate::core::frame::os_environ;
use crate::core::task::{CommandKind, TaskSet};

use super::error::ConfigError;
use super::source::{SourceRequest, TaskSource};

#[derive(Debug, Deserialize)]
struct Module {
    tasks: TaskSet,
}

/// YAML module loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlTaskSource;

impl YamlTaskSource {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate a module from a YAML string.
    ///
    /// `path` is only used to name the module in errors.
    pub fn parse(
        yaml: &str,
        path: &Path,
        request: &SourceRequest,
    ) -> Result<TaskSet, ConfigError> {
        let mut value: Value =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;

        let resolver = Resolver { path, request };
        resolver.interpolate_value(&mut value)?;

        let module: Module =
            serde_yaml::from_value(value).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;

        Self::validate(&module.tasks, path)?;
        Ok(module.tasks)
    }

    fn validate(tasks: &TaskSet, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            message,
        };

        for (name, task) in tasks {
            if name.as_str().is_empty() {
                return Err(invalid("empty task name".into()));
            }

            for (index, cmd) in task.cmds.iter().enumerate() {
                match &cmd.kind {
                    CommandKind::Process(argv) if argv.is_empty() => {
                        return Err(invalid(format!(
                            "task `{}` command {}: empty argv",
                            name, index
                        )));
                    }
                    CommandKind::Script(words) if words.is_empty() => {
                        return Err(invalid(format!(
                            "task `{}` command {}: empty embedded script",
                            name, index
                        )));
                    }
                    CommandKind::Task(callee) if callee.as_str().is_empty() => {
                        return Err(invalid(format!(
                            "task `{}` command {}: empty task reference",
                            name, index
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

impl TaskSource for YamlTaskSource {
    fn load(&self, request: &SourceRequest) -> Result<TaskSet, ConfigError> {
        let content = std::fs::read_to_string(&request.module).map_err(|source| {
            ConfigError::FileReadError {
                path: request.module.clone(),
                source,
            }
        })?;

        Self::parse(&content, &request.module, request)
    }
}

struct Resolver<'a> {
    path: &'a Path,
    request: &'a SourceRequest,
}

impl Resolver<'_> {
    fn interpolate_value(&self, value: &mut Value) -> Result<(), ConfigError> {
        match value {
            Value::String(s) => {
                *s = self.interpolate(s)?;
            }
            Value::Sequence(items) => {
                for item in items {
                    self.interpolate_value(item)?;
                }
            }
            Value::Mapping(mapping) => {
                let entries = std::mem::take(mapping);
                for (mut key, mut item) in entries {
                    self.interpolate_value(&mut key)?;
                    self.interpolate_value(&mut item)?;
                    mapping.insert(key, item);
                }
            }
            Value::Tagged(tagged) => {
                self.interpolate_value(&mut tagged.value)?;
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }

    fn interpolate(&self, input: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start..];

            if let Some(tail) = after.strip_prefix("$${") {
                out.push_str("${");
                rest = tail;
            } else if let Some(tail) = after.strip_prefix("${").filter(|t| is_reference(t)) {
                let Some(end) = tail.find('}') else {
                    return Err(ConfigError::InvalidReference {
                        path: self.path.to_path_buf(),
                        reference: tail.to_string(),
                    });
                };
                out.push_str(&self.resolve(&tail[..end])?);
                rest = &tail[end + 1..];
            } else {
                // Shell syntax such as `${HOME}` or `${X:-d}` is not ours.
                out.push('$');
                rest = &after[1..];
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        let value = match reference.split_once(':') {
            Some((_, "")) => None,
            Some(("env", name)) => self
                .request
                .env
                .get(name)
                .cloned()
                .or_else(|| os_environ().get(name).cloned()),
            Some(("prop", name)) => self.request.properties.get(name).cloned(),
            _ => {
                return Err(ConfigError::InvalidReference {
                    path: self.path.to_path_buf(),
                    reference: reference.to_string(),
                });
            }
        };

        value.ok_or_else(|| ConfigError::UnresolvedReference {
            path: self.path.to_path_buf(),
            reference: reference.to_string(),
        })
    }
}

fn is_reference(tail: &str) -> bool {
    tail.starts_with("env:") || tail.starts_with("prop:")
}
