use std::path::PathBuf;
use thiserror::Error;

use crate::logger::LoggerError;

#[derive(Debug, Error)]
pub enum ZtatError {
    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Cannot determine the home directory of the current user")]
    HomeDirUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Logger error: {0}")]
    Logger(#[from] LoggerError),
}
