// src/error.rs

//! Error types for depslist generation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading packages and producing depslists
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading inputs or writing outputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A package file could not be parsed
    #[error("Failed to parse package '{path}': {reason}")]
    PackageParse { path: PathBuf, reason: String },

    /// A catalog file could not be parsed
    #[error("Failed to parse catalog '{path}': {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Too many requirements had no provider
    #[error("Too many unresolved requirements ({count}, limit {limit}), leaving")]
    TooManyUnresolved { count: usize, limit: usize },

    /// An output sink could not be opened
    #[error("Can't open output file '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A depslist line could not be parsed back
    #[error("Invalid depslist line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
