use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Read};
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use binres_types::{ContentId, PartitionName, UploadSessionId};

use crate::error::{ResolverError, ResolverResult};
use crate::multipart::UploadSessions;
use crate::traits::{CompletedUpload, ContentStream, PartDigest, Resolver};

/// URI scheme served by [`InMemoryResolver`].
pub const MEMORY_SCHEME: &str = "mem";

type PayloadKey = (PartitionName, String);

/// In-memory, HashMap-based resolver with multipart support.
///
/// Intended for tests and embedding. The partition set is fixed at
/// construction. Payloads are held behind a `RwLock`; a write reads its
/// input to the end before taking the lock, so a failing input stream never
/// disturbs the stored payload.
pub struct InMemoryResolver {
    partitions: BTreeSet<PartitionName>,
    payloads: RwLock<HashMap<PayloadKey, Bytes>>,
    uploads: UploadSessions,
}

impl InMemoryResolver {
    /// Create a resolver serving exactly `partitions`.
    pub fn new(partitions: impl IntoIterator<Item = PartitionName>) -> Self {
        Self {
            partitions: partitions.into_iter().collect(),
            payloads: RwLock::new(HashMap::new()),
            uploads: UploadSessions::new(),
        }
    }

    /// Number of payloads currently stored across all partitions.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.payloads
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    fn key(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<PayloadKey> {
        self.ensure_scheme(identifier)?;
        if !self.partitions.contains(partition) {
            return Err(ResolverError::UnknownPartition(partition.to_string()));
        }
        Ok((partition.clone(), identifier.scheme_specific_part().to_string()))
    }

    fn store(&self, key: PayloadKey, data: Bytes) {
        let size = data.len();
        self.payloads.write().expect("lock poisoned").insert(key, data);
        debug!(size, "memory payload stored");
    }
}

impl Resolver for InMemoryResolver {
    fn exists(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<bool> {
        let key = self.key(partition, identifier)?;
        Ok(self.payloads.read().expect("lock poisoned").contains_key(&key))
    }

    fn get_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<Option<ContentStream>> {
        let key = self.key(partition, identifier)?;
        let payloads = self.payloads.read().expect("lock poisoned");
        Ok(payloads
            .get(&key)
            .cloned()
            .map(|data| Box::new(Cursor::new(data)) as ContentStream))
    }

    fn set_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
        content: &mut dyn Read,
    ) -> ResolverResult<()> {
        let key = self.key(partition, identifier)?;
        let mut buf = Vec::new();
        content.read_to_end(&mut buf)?;
        self.store(key, Bytes::from(buf));
        Ok(())
    }

    fn purge_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<()> {
        let key = self.key(partition, identifier)?;
        self.payloads.write().expect("lock poisoned").remove(&key);
        Ok(())
    }

    fn uri_schemes(&self) -> BTreeSet<String> {
        BTreeSet::from([MEMORY_SCHEME.to_string()])
    }

    fn supports_multipart_upload(&self) -> bool {
        true
    }

    fn initiate_upload(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
        mime_type: &str,
    ) -> ResolverResult<UploadSessionId> {
        self.key(partition, identifier)?;
        Ok(self
            .uploads
            .open(partition.clone(), identifier.clone(), mime_type))
    }

    fn upload_part(
        &self,
        session_id: &str,
        part_number: u32,
        content: &mut dyn Read,
    ) -> ResolverResult<PartDigest> {
        self.uploads.put_part(session_id, part_number, content)
    }

    fn list_parts(&self, session_id: &str) -> ResolverResult<BTreeMap<u32, PartDigest>> {
        self.uploads.parts(session_id)
    }

    fn complete_upload(
        &self,
        session_id: &str,
        manifest: &BTreeMap<u32, PartDigest>,
    ) -> ResolverResult<CompletedUpload> {
        self.uploads.complete_with(session_id, manifest, |assembled| {
            let key = self.key(&assembled.partition, &assembled.identifier)?;
            debug!(mime_type = %assembled.mime_type, "committing multipart payload");
            self.store(key, assembled.payload.clone());
            Ok(())
        })
    }

    fn abort_upload(&self, session_id: &str) -> ResolverResult<()> {
        self.uploads.abort(session_id)
    }

    fn upload_session_exists(&self, session_id: &str) -> ResolverResult<bool> {
        Ok(self.uploads.is_open(session_id))
    }
}

impl std::fmt::Debug for InMemoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryResolver")
            .field("partitions", &self.partitions)
            .field("payload_count", &self.len())
            .field("open_uploads", &self.uploads.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{self, Read};
    use std::sync::Arc;
    use std::thread;

    use crate::capability::MultipartOperation;

    fn partition() -> PartitionName {
        PartitionName::new("partition").unwrap()
    }

    fn resolver() -> InMemoryResolver {
        InMemoryResolver::new([partition(), PartitionName::new("archive").unwrap()])
    }

    fn mem(path: &str) -> ContentId {
        ContentId::parse(&format!("mem:{path}")).unwrap()
    }

    fn read_all(resolver: &InMemoryResolver, id: &ContentId) -> Vec<u8> {
        let mut stream = resolver
            .get_content(&partition(), id)
            .unwrap()
            .expect("content should be present");
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("Expected error"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"half");
            Ok(4)
        }
    }

    // -----------------------------------------------------------------------
    // Core content operations
    // -----------------------------------------------------------------------

    #[test]
    fn set_get_purge() {
        let r = resolver();
        let id = mem("doc.txt");
        assert!(!r.exists(&partition(), &id).unwrap());
        assert!(r.get_content(&partition(), &id).unwrap().is_none());

        r.set_content(&partition(), &id, &mut Cursor::new(b"A new file".to_vec()))
            .unwrap();
        assert!(r.exists(&partition(), &id).unwrap());
        assert_eq!(read_all(&r, &id), b"A new file");

        r.purge_content(&partition(), &id).unwrap();
        assert!(!r.exists(&partition(), &id).unwrap());
        r.purge_content(&partition(), &id).unwrap();
    }

    #[test]
    fn partitions_are_isolated() {
        let r = resolver();
        let archive = PartitionName::new("archive").unwrap();
        let id = mem("shared");
        r.set_content(&partition(), &id, &mut Cursor::new(b"one".to_vec()))
            .unwrap();
        assert!(!r.exists(&archive, &id).unwrap());
    }

    #[test]
    fn unknown_partition_and_scheme_fail() {
        let r = resolver();
        let other = PartitionName::new("elsewhere").unwrap();
        assert!(matches!(
            r.exists(&other, &mem("x")),
            Err(ResolverError::UnknownPartition(ref p)) if p == "elsewhere"
        ));
        let file = ContentId::parse("file:test.txt").unwrap();
        assert!(matches!(
            r.exists(&partition(), &file),
            Err(ResolverError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn failed_write_keeps_previous_payload() {
        let r = resolver();
        let id = mem("doc.txt");
        r.set_content(&partition(), &id, &mut Cursor::new(b"old".to_vec()))
            .unwrap();
        let err = r
            .set_content(&partition(), &id, &mut FailingReader { sent: false })
            .unwrap_err();
        assert!(err.is_io());
        assert_eq!(read_all(&r, &id), b"old");
    }

    #[test]
    fn schemes_and_capability() {
        let r = resolver();
        assert_eq!(r.uri_schemes(), BTreeSet::from(["mem".to_string()]));
        assert!(r.supports_multipart_upload());
    }

    // -----------------------------------------------------------------------
    // Multipart
    // -----------------------------------------------------------------------

    #[test]
    fn multipart_lifecycle_commits_payload() {
        let r = resolver();
        let id = mem("big.bin");
        let session = r
            .initiate_upload(&partition(), &id, "application/octet-stream")
            .unwrap()
            .to_string();
        assert!(r.upload_session_exists(&session).unwrap());

        let d2 = r.upload_part(&session, 2, &mut Cursor::new(b"world".to_vec())).unwrap();
        let d1 = r.upload_part(&session, 1, &mut Cursor::new(b"hello ".to_vec())).unwrap();
        assert_eq!(
            r.list_parts(&session).unwrap(),
            BTreeMap::from([(1, d1.clone()), (2, d2.clone())])
        );
        assert!(!r.exists(&partition(), &id).unwrap());

        let done = r
            .complete_upload(&session, &BTreeMap::from([(1, d1), (2, d2)]))
            .unwrap();
        assert_eq!(done.partition, partition());
        assert_eq!(done.identifier, id);
        assert_eq!(done.size, 11);
        assert_eq!(read_all(&r, &id), b"hello world");
        assert!(!r.upload_session_exists(&session).unwrap());
        assert!(r.list_parts(&session).unwrap_err().is_session_not_found());
    }

    #[test]
    fn abort_discards_parts_and_leaves_target_untouched() {
        let r = resolver();
        let id = mem("big.bin");
        let session = r
            .initiate_upload(&partition(), &id, "text/plain")
            .unwrap()
            .to_string();
        r.upload_part(&session, 1, &mut Cursor::new(b"data".to_vec())).unwrap();
        r.abort_upload(&session).unwrap();

        assert!(!r.upload_session_exists(&session).unwrap());
        assert!(!r.exists(&partition(), &id).unwrap());
        assert!(r.abort_upload(&session).unwrap_err().is_session_not_found());
    }

    #[test]
    fn unknown_session_is_not_unsupported() {
        let r = resolver();
        let err = r
            .upload_part("test-identifier", 1, &mut Cursor::new(b"x".to_vec()))
            .unwrap_err();
        assert!(err.is_session_not_found());
        assert!(!err.is_unsupported());
        assert!(!r.upload_session_exists("test-identifier").unwrap());
    }

    #[test]
    fn initiate_validates_target() {
        let r = resolver();
        let other = PartitionName::new("elsewhere").unwrap();
        assert!(matches!(
            r.initiate_upload(&other, &mem("x"), "text/plain"),
            Err(ResolverError::UnknownPartition(_))
        ));
    }

    #[test]
    fn capable_backend_never_reports_unsupported() {
        let r = resolver();
        let manifest = BTreeMap::from([(1, "d".to_string())]);
        let errors = [
            r.upload_part("x", 1, &mut Cursor::new(Vec::new())).err(),
            r.list_parts("x").err(),
            r.complete_upload("x", &manifest).err(),
            r.abort_upload("x").err(),
        ];
        for (err, op) in errors.into_iter().zip(&MultipartOperation::ALL[1..]) {
            let err = err.expect("unknown session should fail");
            assert!(!err.is_unsupported(), "{op} reported unsupported");
        }
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_writers_never_mix_payloads() {
        let r = Arc::new(resolver());
        let id = mem("contended");
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|n| vec![n; 4096]).collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|data| {
                let r = Arc::clone(&r);
                let id = id.clone();
                thread::spawn(move || {
                    r.set_content(&partition(), &id, &mut Cursor::new(data)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        let stored = read_all(&r, &id);
        assert!(payloads.contains(&stored));
    }

    #[test]
    fn debug_format() {
        let r = resolver();
        let debug = format!("{r:?}");
        assert!(debug.contains("InMemoryResolver"));
        assert!(debug.contains("payload_count"));
    }

    proptest! {
        #[test]
        fn roundtrip_any_payload(path in "[a-z0-9/]{1,24}", data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let r = resolver();
            let id = mem(&path);
            r.set_content(&partition(), &id, &mut Cursor::new(data.clone())).unwrap();
            prop_assert!(r.exists(&partition(), &id).unwrap());
            prop_assert_eq!(read_all(&r, &id), data);
        }

        #[test]
        fn never_written_is_absent(path in "[a-z0-9/]{1,24}") {
            let r = resolver();
            prop_assert!(!r.exists(&partition(), &mem(&path)).unwrap());
        }
    }
}
