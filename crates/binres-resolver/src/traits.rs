//! The [`Resolver`] trait every binary content backend implements.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use binres_types::{ContentId, PartitionName, UploadSessionId};

use crate::capability::MultipartOperation;
use crate::error::{ResolverError, ResolverResult};

/// A readable handle on stored content.
pub type ContentStream = Box<dyn Read + Send>;

/// Lower-case hex BLAKE3 digest of one uploaded part.
pub type PartDigest = String;

/// Outcome of a committed multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedUpload {
    /// Partition the payload was written to.
    pub partition: PartitionName,
    /// Identifier the payload is now stored under.
    pub identifier: ContentId,
    /// Total payload size in bytes.
    pub size: u64,
    /// Hex BLAKE3 digest of the assembled payload.
    pub digest: String,
}

/// Storage backend for opaque binary payloads.
///
/// A resolver maps `(partition, identifier)` pairs to physical storage and
/// moves bytes in and out. All methods block. Implementations must be
/// `Send + Sync` and tolerate concurrent callers:
///
/// - Operations on different identifiers are independent.
/// - `set_content` is atomic per identifier: readers observe either the old
///   or the new payload, never a mixture, and a failed write leaves the old
///   payload in place.
/// - Absence is a value (`false` from `exists`), never an error.
/// - I/O failures are surfaced as [`ResolverError::Io`] and never folded
///   into a `false` or empty result.
///
/// Multipart upload is an optional capability. The provided method bodies
/// reject every multipart operation with [`ResolverError::Unsupported`];
/// a backend that implements the capability overrides all of them together
/// with [`supports_multipart_upload`](Resolver::supports_multipart_upload).
pub trait Resolver: Send + Sync {
    /// Whether a payload is currently stored at this location.
    fn exists(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<bool>;

    /// Open the payload for reading.
    ///
    /// Returns `Ok(Some(_))` iff `exists` would return `true` at the same
    /// instant (best-effort). Backends that only learn about absence by
    /// failing to open the payload report it as [`ResolverError::Io`].
    fn get_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<Option<ContentStream>>;

    /// Write or overwrite the payload, consuming `content` to its end.
    fn set_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
        content: &mut dyn Read,
    ) -> ResolverResult<()>;

    /// Remove the payload. Purging an absent payload succeeds.
    fn purge_content(&self, partition: &PartitionName, identifier: &ContentId)
        -> ResolverResult<()>;

    /// URI schemes this backend accepts.
    fn uri_schemes(&self) -> BTreeSet<String>;

    /// Whether `identifier`'s scheme is one of [`uri_schemes`](Resolver::uri_schemes).
    fn accepts(&self, identifier: &ContentId) -> bool {
        self.uri_schemes().contains(identifier.scheme())
    }

    /// Fail with [`ResolverError::UnsupportedScheme`] unless `identifier` is accepted.
    fn ensure_scheme(&self, identifier: &ContentId) -> ResolverResult<()> {
        if self.accepts(identifier) {
            Ok(())
        } else {
            Err(ResolverError::UnsupportedScheme {
                scheme: identifier.scheme().to_string(),
                identifier: identifier.to_string(),
            })
        }
    }

    /// Multipart upload capability flag.
    fn supports_multipart_upload(&self) -> bool {
        false
    }

    /// Open a multipart upload targeting `(partition, identifier)`.
    fn initiate_upload(
        &self,
        _partition: &PartitionName,
        _identifier: &ContentId,
        _mime_type: &str,
    ) -> ResolverResult<UploadSessionId> {
        Err(ResolverError::unsupported(MultipartOperation::InitiateUpload))
    }

    /// Upload part `part_number` (1-based) of an open session.
    ///
    /// Re-uploading a part number replaces the earlier part.
    fn upload_part(
        &self,
        _session_id: &str,
        _part_number: u32,
        _content: &mut dyn Read,
    ) -> ResolverResult<PartDigest> {
        Err(ResolverError::unsupported(MultipartOperation::UploadPart))
    }

    /// Parts received so far, ordered by part number.
    fn list_parts(&self, _session_id: &str) -> ResolverResult<BTreeMap<u32, PartDigest>> {
        Err(ResolverError::unsupported(MultipartOperation::ListParts))
    }

    /// Commit the session. `manifest` must list every received part with
    /// its digest; the payload is assembled in part-number order.
    fn complete_upload(
        &self,
        _session_id: &str,
        _manifest: &BTreeMap<u32, PartDigest>,
    ) -> ResolverResult<CompletedUpload> {
        Err(ResolverError::unsupported(MultipartOperation::CompleteUpload))
    }

    /// Discard the session and all part data received for it.
    fn abort_upload(&self, _session_id: &str) -> ResolverResult<()> {
        Err(ResolverError::unsupported(MultipartOperation::AbortUpload))
    }

    /// Whether `session_id` names an open session.
    ///
    /// Completed, aborted, and never-issued ids all report `false`.
    fn upload_session_exists(&self, _session_id: &str) -> ResolverResult<bool> {
        Err(ResolverError::unsupported(MultipartOperation::UploadSessionExists))
    }
}
