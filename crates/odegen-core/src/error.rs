//! Error types for odegen

use thiserror::Error;

/// odegen error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grammar pattern: {0}")]
    Pattern(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A binding cannot be generated without producing a wrong wrapper.
    #[error("Cannot bind function {function}: {detail}")]
    Binding { function: String, detail: String },

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Result type alias for odegen
pub type Result<T> = std::result::Result<T, Error>;
