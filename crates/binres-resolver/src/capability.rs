//! Optional capability surface of a resolver.
//!
//! Backends declare multipart support through
//! [`Resolver::supports_multipart_upload`](crate::Resolver::supports_multipart_upload).
//! A backend without it rejects every [`MultipartOperation`] with
//! [`ResolverError::Unsupported`](crate::ResolverError::Unsupported), so a
//! caller checks the flag once instead of special-casing each call.

use std::fmt;

/// The operations that make up the multipart upload capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultipartOperation {
    InitiateUpload,
    UploadPart,
    ListParts,
    CompleteUpload,
    AbortUpload,
    UploadSessionExists,
}

impl MultipartOperation {
    /// Every multipart operation, in lifecycle order.
    pub const ALL: [MultipartOperation; 6] = [
        Self::InitiateUpload,
        Self::UploadPart,
        Self::ListParts,
        Self::CompleteUpload,
        Self::AbortUpload,
        Self::UploadSessionExists,
    ];

    /// The operation's method name on [`Resolver`](crate::Resolver).
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitiateUpload => "initiate_upload",
            Self::UploadPart => "upload_part",
            Self::ListParts => "list_parts",
            Self::CompleteUpload => "complete_upload",
            Self::AbortUpload => "abort_upload",
            Self::UploadSessionExists => "upload_session_exists",
        }
    }
}

impl fmt::Display for MultipartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
