//! Domain error types

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed cause reported by a dynamic variable resolver.
pub type ResolverError = Box<dyn StdError + Send + Sync>;

/// Errors raised by the variable registry and the substitution engine.
#[derive(Debug, Error, Clone)]
pub enum VariableError {
    /// An expression references a name registered in neither namespace.
    #[error("reference to undefined variable: {0}")]
    UndefinedVariable(String),

    /// A non-empty argument was supplied to a dynamic variable that takes none.
    #[error("variable {0} does not accept arguments")]
    UnsupportedArgument(String),

    /// A dynamic variable resolver (or its factory) failed.
    #[error("failed to resolve variable {name}: {cause}")]
    ResolutionFailed {
        /// Name of the dynamic variable being resolved.
        name: String,
        /// The resolver's own error.
        #[source]
        cause: Arc<dyn StdError + Send + Sync>,
    },

    /// A `${` was never closed by a matching `}`.
    #[error("unterminated variable reference at offset {offset}")]
    UnterminatedToken {
        /// Byte offset of the opening `${` in the scanned text.
        offset: usize,
    },

    /// Transitive expansion came back to a variable already being expanded.
    #[error("circular reference while expanding variable {0}")]
    CircularReference(String),

    /// A variable with the same name is already registered.
    #[error("variable already registered: {0}")]
    DuplicateVariable(String),

    /// A variable name is empty and cannot be registered.
    #[error("invalid variable name: {0:?}")]
    InvalidVariableName(String),

    /// Reading or writing the durable store failed.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl VariableError {
    /// Wraps a resolver failure together with the variable name.
    #[must_use]
    pub fn resolution_failed(name: impl Into<String>, cause: ResolverError) -> Self {
        Self::ResolutionFailed {
            name: name.into(),
            cause: Arc::from(cause),
        }
    }

    /// Returns the byte offset of the offending token for syntax errors.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::UnterminatedToken { offset } => Some(*offset),
            _ => None,
        }
    }

    /// Returns the variable name this error refers to, if any.
    #[must_use]
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::UndefinedVariable(name)
            | Self::UnsupportedArgument(name)
            | Self::ResolutionFailed { name, .. }
            | Self::CircularReference(name)
            | Self::DuplicateVariable(name)
            | Self::InvalidVariableName(name) => Some(name),
            Self::UnterminatedToken { .. } | Self::PersistenceFailure(_) => None,
        }
    }
}

/// Result type alias for registry operations.
pub type VariableResult<T> = Result<T, VariableError>;
