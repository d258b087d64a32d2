//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The name is empty (or only whitespace).
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// The name exceeds the maximum length.
    #[error("{kind} is too long: {actual} characters (max {max})")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },

    /// The name contains a control character.
    #[error("{kind} contains a control character at position {position}")]
    ControlCharacter { kind: &'static str, position: usize },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }

    /// Returns the kind of identifier that failed to parse.
    pub fn kind(&self) -> &'static str {
        match self {
            IdError::Empty { kind }
            | IdError::TooLong { kind, .. }
            | IdError::ControlCharacter { kind, .. } => kind,
        }
    }
}
