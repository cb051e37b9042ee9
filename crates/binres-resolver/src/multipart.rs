//! Multipart upload state machine shared by capable backends.
//!
//! ```text
//! absent --initiate--> open --upload_part--> open
//!                       |
//!                       +--abort--> gone
//!                       +--complete--> completing --write ok--> gone
//!                                          |
//!                                          +--write failed--> open
//! ```
//!
//! [`UploadSessions`] owns the bookkeeping: the set of open sessions and the
//! parts each has received. A backend plugs in its own atomic write path at
//! completion time through [`UploadSessions::complete_with`], so the
//! assembled payload goes through the same no-partial-visibility guarantee
//! as an ordinary `set_content`.
//!
//! Part bytes are read from the caller's stream outside the session lock.
//! Only the received-parts map is touched under the lock, so distinct parts
//! of the same session upload concurrently.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Mutex;

use bytes::Bytes;
use tracing::debug;

use binres_types::{ContentId, PartitionName, UploadSessionId};

use crate::error::{ResolverError, ResolverResult};
use crate::traits::{CompletedUpload, PartDigest};

/// Hex BLAKE3 digest used for parts and assembled payloads.
pub fn digest(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Open,
    /// Manifest accepted; the backend is writing the assembled payload.
    Completing,
}

#[derive(Debug)]
struct Part {
    digest: PartDigest,
    data: Bytes,
}

/// One multipart upload in progress.
#[derive(Debug)]
struct UploadSession {
    partition: PartitionName,
    identifier: ContentId,
    mime_type: String,
    state: SessionState,
    parts: BTreeMap<u32, Part>,
}

/// Where and what a completing upload writes.
#[derive(Debug)]
pub struct AssembledUpload {
    pub partition: PartitionName,
    pub identifier: ContentId,
    pub mime_type: String,
    pub payload: Bytes,
}

/// Registry of open upload sessions for one backend instance.
#[derive(Debug, Default)]
pub struct UploadSessions {
    sessions: Mutex<HashMap<UploadSessionId, UploadSession>>,
}

impl UploadSessions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session and return its id.
    pub fn open(
        &self,
        partition: PartitionName,
        identifier: ContentId,
        mime_type: &str,
    ) -> UploadSessionId {
        let mut sessions = self.sessions.lock().expect("upload session lock poisoned");
        let mut id = UploadSessionId::new();
        while sessions.contains_key(&id) {
            id = UploadSessionId::new();
        }
        debug!(session = %id, %partition, %identifier, mime_type, "upload session opened");
        sessions.insert(
            id,
            UploadSession {
                partition,
                identifier,
                mime_type: mime_type.to_string(),
                state: SessionState::Open,
                parts: BTreeMap::new(),
            },
        );
        id
    }

    /// Read `content` fully and record it as part `part_number`.
    pub fn put_part(
        &self,
        session_id: &str,
        part_number: u32,
        content: &mut dyn Read,
    ) -> ResolverResult<PartDigest> {
        let id = parse_session_id(session_id)?;
        // Fail fast before consuming the caller's stream.
        self.with_open_session(session_id, &id, |_| Ok(()))?;
        if part_number == 0 {
            return Err(ResolverError::InvalidPartNumber(part_number));
        }

        let mut buf = Vec::new();
        content.read_to_end(&mut buf)?;
        let data = Bytes::from(buf);
        let part_digest = digest(&data);
        let size = data.len();

        // The session may have been aborted or completed while we were reading.
        self.with_open_session(session_id, &id, |session| {
            session.parts.insert(
                part_number,
                Part {
                    digest: part_digest.clone(),
                    data,
                },
            );
            Ok(())
        })?;

        debug!(session = %id, part_number, size, "part received");
        Ok(part_digest)
    }

    /// Digests of received parts, ordered by part number.
    pub fn parts(&self, session_id: &str) -> ResolverResult<BTreeMap<u32, PartDigest>> {
        let id = parse_session_id(session_id)?;
        self.with_open_session(session_id, &id, |session| {
            Ok(session
                .parts
                .iter()
                .map(|(n, part)| (*n, part.digest.clone()))
                .collect())
        })
    }

    /// Whether `session_id` names an open session. Malformed ids are not open.
    pub fn is_open(&self, session_id: &str) -> bool {
        let Ok(id) = UploadSessionId::parse(session_id) else {
            return false;
        };
        let sessions = self.sessions.lock().expect("upload session lock poisoned");
        matches!(sessions.get(&id), Some(s) if s.state == SessionState::Open)
    }

    /// Drop the session and all its part data.
    pub fn abort(&self, session_id: &str) -> ResolverResult<()> {
        let id = parse_session_id(session_id)?;
        let mut sessions = self.sessions.lock().expect("upload session lock poisoned");
        match sessions.get(&id).map(|s| s.state) {
            None => Err(not_found(session_id)),
            Some(SessionState::Completing) => Err(ResolverError::SessionBusy {
                id: session_id.to_string(),
            }),
            Some(SessionState::Open) => {
                if let Some(session) = sessions.remove(&id) {
                    debug!(session = %id, parts = session.parts.len(), "upload session aborted");
                }
                Ok(())
            }
        }
    }

    /// Validate `manifest`, assemble the payload, and hand it to `write`.
    ///
    /// The session leaves the open state while `write` runs. If `write`
    /// succeeds the session is destroyed; if it fails the session reopens
    /// with its parts intact so the caller can retry or abort.
    pub fn complete_with<F>(
        &self,
        session_id: &str,
        manifest: &BTreeMap<u32, PartDigest>,
        write: F,
    ) -> ResolverResult<CompletedUpload>
    where
        F: FnOnce(&AssembledUpload) -> ResolverResult<()>,
    {
        let id = parse_session_id(session_id)?;
        let assembled = self.begin_completion(session_id, &id, manifest)?;

        if let Err(e) = write(&assembled) {
            let mut sessions = self.sessions.lock().expect("upload session lock poisoned");
            if let Some(session) = sessions.get_mut(&id) {
                session.state = SessionState::Open;
            }
            return Err(e);
        }

        self.sessions
            .lock()
            .expect("upload session lock poisoned")
            .remove(&id);

        let completed = CompletedUpload {
            partition: assembled.partition,
            identifier: assembled.identifier,
            size: assembled.payload.len() as u64,
            digest: digest(&assembled.payload),
        };
        debug!(session = %id, size = completed.size, "upload session completed");
        Ok(completed)
    }

    /// Number of sessions currently tracked (open or completing).
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("upload session lock poisoned").len()
    }

    /// Returns `true` if no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin_completion(
        &self,
        session_id: &str,
        id: &UploadSessionId,
        manifest: &BTreeMap<u32, PartDigest>,
    ) -> ResolverResult<AssembledUpload> {
        self.with_open_session(session_id, id, |session| {
            validate_manifest(session_id, &session.parts, manifest)?;

            let total: usize = session.parts.values().map(|p| p.data.len()).sum();
            let mut payload = Vec::with_capacity(total);
            for part in session.parts.values() {
                payload.extend_from_slice(&part.data);
            }

            session.state = SessionState::Completing;
            Ok(AssembledUpload {
                partition: session.partition.clone(),
                identifier: session.identifier.clone(),
                mime_type: session.mime_type.clone(),
                payload: Bytes::from(payload),
            })
        })
    }

    fn with_open_session<T>(
        &self,
        session_id: &str,
        id: &UploadSessionId,
        f: impl FnOnce(&mut UploadSession) -> ResolverResult<T>,
    ) -> ResolverResult<T> {
        let mut sessions = self.sessions.lock().expect("upload session lock poisoned");
        let session = sessions.get_mut(id).ok_or_else(|| not_found(session_id))?;
        if session.state != SessionState::Open {
            return Err(ResolverError::SessionBusy {
                id: session_id.to_string(),
            });
        }
        f(session)
    }
}

fn parse_session_id(session_id: &str) -> ResolverResult<UploadSessionId> {
    UploadSessionId::parse(session_id).map_err(|_| not_found(session_id))
}

fn not_found(session_id: &str) -> ResolverError {
    ResolverError::SessionNotFound {
        id: session_id.to_string(),
    }
}

fn validate_manifest(
    session_id: &str,
    received: &BTreeMap<u32, Part>,
    manifest: &BTreeMap<u32, PartDigest>,
) -> ResolverResult<()> {
    let reject = |reason: String| ResolverError::InvalidManifest {
        id: session_id.to_string(),
        reason,
    };

    if manifest.is_empty() {
        return Err(reject("manifest lists no parts".into()));
    }
    for (n, expected) in manifest {
        if *n == 0 {
            return Err(ResolverError::InvalidPartNumber(0));
        }
        let part = received
            .get(n)
            .ok_or_else(|| reject(format!("part {n} was never uploaded")))?;
        if !part.digest.eq_ignore_ascii_case(expected) {
            return Err(reject(format!("digest mismatch for part {n}")));
        }
    }
    if let Some(n) = received.keys().find(|n| !manifest.contains_key(n)) {
        return Err(reject(format!("part {n} was uploaded but is missing from the manifest")));
    }
    Ok(())
}
