//! Configuration errors.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Anything that can go wrong loading, saving or checking a [`SynthConfig`](crate::SynthConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// File that was being read.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// The config file could not be written.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// File that was being written.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// A parent directory for the config file could not be created.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// The configuration could not be turned into TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The TOML is well formed but a value is out of bounds.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl ConfigError {
    pub(crate) fn read_file(path: &Path, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write_file(path: &Path, source: io::Error) -> Self {
        Self::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create_dir(path: &Path, source: io::Error) -> Self {
        Self::CreateDir {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}
