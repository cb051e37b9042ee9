use thiserror::Error;

use crate::capability::MultipartOperation;

/// Errors from resolver operations.
///
/// Absence of a payload is never an error: it is reported as `false` by
/// `exists` and, for backends that can observe it cheaply, as `None` by
/// `get_content`. Everything else a caller must handle lands here.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The underlying storage failed after the operation was attempted.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend does not implement this operation's capability.
    #[error("{operation} is not supported by this resolver")]
    Unsupported { operation: MultipartOperation },

    /// A multipart operation named a session that is not open.
    #[error("upload session not found: {id}")]
    SessionNotFound { id: String },

    /// A multipart session is being completed and cannot change.
    #[error("upload session {id} is being completed")]
    SessionBusy { id: String },

    /// The partition is not part of this resolver's mapping.
    #[error("unknown partition: {0}")]
    UnknownPartition(String),

    /// The identifier's scheme is not served by this resolver.
    #[error("unsupported URI scheme {scheme:?} for {identifier}")]
    UnsupportedScheme { scheme: String, identifier: String },

    /// The identifier cannot be mapped to a storage location.
    #[error("invalid identifier {identifier}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Part numbers start at 1.
    #[error("invalid part number {0}: part numbers start at 1")]
    InvalidPartNumber(u32),

    /// The completion manifest does not match the received parts.
    #[error("invalid manifest for upload {id}: {reason}")]
    InvalidManifest { id: String, reason: String },

    /// Two backends claimed the same URI scheme.
    #[error("URI scheme {0:?} is already registered")]
    DuplicateScheme(String),
}

impl ResolverError {
    /// Shorthand for the capability-absence failure of `operation`.
    pub fn unsupported(operation: MultipartOperation) -> Self {
        Self::Unsupported { operation }
    }

    /// Returns `true` for capability-absence failures.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns `true` for underlying storage failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns `true` if a multipart operation referenced an unknown session.
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound { .. })
    }
}

/// Result alias for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;
