use thiserror::Error;

/// Errors produced while parsing or validating foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid partition name {name:?}: {reason}")]
    InvalidPartition { name: String, reason: String },

    #[error("invalid content identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("invalid upload session id: {0:?}")]
    InvalidSessionId(String),
}

/// Result alias for foundation type validation.
pub type TypeResult<T> = Result<T, TypeError>;
