//! Configuration error types.
//!
//! This module defines the errors raised while obtaining a task set from a
//! task module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when evaluating a task module.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No module given and none found while walking up the directory tree.
    #[error("no module: cannot find `{filename}` from '{from}' upward")]
    NoModule { filename: String, from: PathBuf },

    /// The working directory could not be determined.
    #[error("no module: cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// Failed to read a specific file with context.
    #[error("failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML from a specific file.
    #[error("error evaluating module '{path}': {source}")]
    YamlFileError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A `${env:..}` or `${prop:..}` reference without a value.
    #[error("error evaluating module '{path}': unresolved reference `${{{reference}}}`")]
    UnresolvedReference { path: PathBuf, reference: String },

    /// A malformed `${env:..}` or `${prop:..}` reference.
    #[error("error evaluating module '{path}': invalid reference `${{{reference}}}`")]
    InvalidReference { path: PathBuf, reference: String },

    /// Invalid configuration value.
    #[error("invalid configuration in '{path}': {message}")]
    InvalidConfig { path: PathBuf, message: String },
}
