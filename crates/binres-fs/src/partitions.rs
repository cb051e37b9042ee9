use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use binres_resolver::{ResolverError, ResolverResult};
use binres_types::{ContentId, PartitionName};

/// Immutable routing table from partition name to directory root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionMap {
    roots: BTreeMap<PartitionName, PathBuf>,
}

impl PartitionMap {
    /// Build a map from `(name, root)` pairs. Later duplicates win.
    pub fn new(entries: impl IntoIterator<Item = (PartitionName, PathBuf)>) -> Self {
        Self {
            roots: entries.into_iter().collect(),
        }
    }

    /// The directory root of `partition`.
    pub fn root(&self, partition: &PartitionName) -> ResolverResult<&Path> {
        self.roots
            .get(partition)
            .map(PathBuf::as_path)
            .ok_or_else(|| ResolverError::UnknownPartition(partition.to_string()))
    }

    /// The file path of `identifier` within `partition`.
    pub fn locate(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<PathBuf> {
        let root = self.root(partition)?;
        Ok(root.join(relative_path(identifier)?))
    }

    /// Iterate `(name, root)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&PartitionName, &Path)> {
        self.roots.iter().map(|(name, root)| (name, root.as_path()))
    }

    pub fn contains(&self, partition: &PartitionName) -> bool {
        self.roots.contains_key(partition)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl FromIterator<(PartitionName, PathBuf)> for PartitionMap {
    fn from_iter<I: IntoIterator<Item = (PartitionName, PathBuf)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Map an identifier's scheme-specific part to a path relative to a
/// partition root.
///
/// Leading slashes are stripped, so `file:a.txt` and `file:///a.txt` land
/// on the same file. Segments must be non-empty and must not be `.` or `..`,
/// which keeps every mapped path inside its root.
pub fn relative_path(identifier: &ContentId) -> ResolverResult<PathBuf> {
    let reject = |reason: &str| ResolverError::InvalidIdentifier {
        identifier: identifier.to_string(),
        reason: reason.into(),
    };

    let trimmed = identifier.scheme_specific_part().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(reject("path is empty"));
    }

    let mut path = PathBuf::new();
    for segment in trimmed.split('/') {
        match segment {
            "" => return Err(reject("path contains an empty segment")),
            "." | ".." => return Err(reject("path contains a relative segment")),
            s if s.contains('\\') => return Err(reject("path contains a backslash")),
            s => path.push(s),
        }
    }
    Ok(path)
}
