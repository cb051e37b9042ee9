use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use binres_resolver::{ContentStream, Resolver, ResolverError, ResolverResult};
use binres_types::{ContentId, PartitionName};

use crate::config::FileResolverConfig;
use crate::error::ConfigResult;
use crate::partitions::PartitionMap;

/// URI scheme served by [`FileResolver`].
pub const FILE_SCHEME: &str = "file";

/// Resolver backed by the local filesystem.
///
/// Does not support multipart upload; every multipart operation fails with
/// [`ResolverError::Unsupported`].
#[derive(Clone, Debug)]
pub struct FileResolver {
    partitions: PartitionMap,
}

impl FileResolver {
    pub fn new(partitions: PartitionMap) -> Self {
        Self { partitions }
    }

    /// Build a resolver from configuration, creating partition roots when
    /// the configuration asks for it.
    pub fn from_config(config: &FileResolverConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.build_partitions()?))
    }

    pub fn partitions(&self) -> &PartitionMap {
        &self.partitions
    }

    /// Filesystem path `identifier` maps to within `partition`.
    pub fn path_for(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<PathBuf> {
        self.ensure_scheme(identifier)?;
        self.partitions.locate(partition, identifier)
    }
}

impl Resolver for FileResolver {
    fn exists(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<bool> {
        let path = self.path_for(partition, identifier)?;
        let readable = fs::metadata(&path).and_then(|meta| {
            if meta.is_file() {
                File::open(&path).map(|_| true)
            } else {
                Ok(false)
            }
        });
        match readable {
            Ok(found) => Ok(found),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::PermissionDenied
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<Option<ContentStream>> {
        let path = self.path_for(partition, identifier)?;
        let file = File::open(&path)?;
        if !file.metadata()?.is_file() {
            return Err(ResolverError::Io(io::Error::new(
                ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        debug!(path = %path.display(), "opened file content");
        Ok(Some(Box::new(file)))
    }

    fn set_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
        content: &mut dyn Read,
    ) -> ResolverResult<()> {
        let path = self.path_for(partition, identifier)?;
        let written = write_atomically(&path, content)?;
        debug!(path = %path.display(), bytes = written, "file content written");
        Ok(())
    }

    fn purge_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<()> {
        let path = self.path_for(partition, identifier)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "file content purged");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ResolverError::Io(e)),
        }
    }

    fn uri_schemes(&self) -> BTreeSet<String> {
        BTreeSet::from([FILE_SCHEME.to_string()])
    }
}

/// Stream `content` into a temporary file beside `path`, sync it, and
/// rename it over `path`. Returns the number of bytes written.
fn write_atomically(path: &Path, content: &mut dyn Read) -> io::Result<u64> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"))?;
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".binres-")
        .suffix(".tmp")
        .tempfile_in(parent)?;

    let copied = io::copy(content, tmp.as_file_mut()).and_then(|n| {
        tmp.as_file().sync_all()?;
        Ok(n)
    });
    let written = match copied {
        Ok(n) => n,
        Err(e) => {
            discard(tmp);
            return Err(e);
        }
    };

    if let Err(e) = tmp.persist(path) {
        discard(e.file);
        return Err(e.error);
    }
    Ok(written)
}

fn discard(tmp: NamedTempFile) {
    let path = tmp.path().to_path_buf();
    if let Err(e) = tmp.close() {
        warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}
