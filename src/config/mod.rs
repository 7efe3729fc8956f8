//! Task-set sources.
//!
//! This module provides the source contract and the bundled YAML module loader.

mod error;
mod source;
mod yaml;

pub use error::ConfigError;
pub use source::{
    MODULE_FILENAME, SourceRequest, TaskSource, find_module, module_dir, resolve_module,
};
pub use yaml::YamlTaskSource;
