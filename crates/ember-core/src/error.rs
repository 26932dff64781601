//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    #[error("Invalid definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Unknown behavior: {0}")]
    UnknownBehavior(String),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}
