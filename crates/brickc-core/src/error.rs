//! Core error types

/// Errors raised while constructing terms or resolving identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid IRI '{value}': {reason}")]
    InvalidIri { value: String, reason: String },

    #[error("Unknown namespace prefix '{prefix}' in '{value}'")]
    UnknownPrefix { prefix: String, value: String },

    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },
}
