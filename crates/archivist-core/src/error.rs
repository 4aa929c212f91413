use thiserror::Error;

/// Errors reported by the core engine.
///
/// Only caller contract violations surface here. Empty input and
/// undetectable language are handled in-band (a single empty chunk and the
/// `"unknown"` sentinel respectively), and lookups on unknown keys return
/// empty results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed chunking or embedding parameters.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl CoreError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
