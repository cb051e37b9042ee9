use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use tracing::debug;

use binres_types::{ContentId, PartitionName};

use crate::error::{ResolverError, ResolverResult};
use crate::traits::{ContentStream, Resolver};

/// Routes identifiers to the backend that declares their URI scheme.
///
/// Built once from a fixed list of backends and immutable afterwards, so it
/// can be shared across threads without locking.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    by_scheme: BTreeMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Build a registry. Fails if two backends declare the same scheme.
    pub fn new(resolvers: impl IntoIterator<Item = Arc<dyn Resolver>>) -> ResolverResult<Self> {
        let mut by_scheme: BTreeMap<String, Arc<dyn Resolver>> = BTreeMap::new();
        for resolver in resolvers {
            for scheme in resolver.uri_schemes() {
                if by_scheme.contains_key(&scheme) {
                    return Err(ResolverError::DuplicateScheme(scheme));
                }
                debug!(%scheme, "resolver registered");
                by_scheme.insert(scheme, Arc::clone(&resolver));
            }
        }
        Ok(Self { by_scheme })
    }

    /// The backend responsible for `identifier`.
    pub fn resolver_for(&self, identifier: &ContentId) -> ResolverResult<&Arc<dyn Resolver>> {
        self.by_scheme
            .get(identifier.scheme())
            .ok_or_else(|| ResolverError::UnsupportedScheme {
                scheme: identifier.scheme().to_string(),
                identifier: identifier.to_string(),
            })
    }

    /// All registered schemes, sorted.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.by_scheme.keys().map(String::as_str)
    }

    pub fn exists(&self, partition: &PartitionName, identifier: &ContentId) -> ResolverResult<bool> {
        self.resolver_for(identifier)?.exists(partition, identifier)
    }

    pub fn get_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<Option<ContentStream>> {
        self.resolver_for(identifier)?.get_content(partition, identifier)
    }

    pub fn set_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
        content: &mut dyn Read,
    ) -> ResolverResult<()> {
        self.resolver_for(identifier)?
            .set_content(partition, identifier, content)
    }

    pub fn purge_content(
        &self,
        partition: &PartitionName,
        identifier: &ContentId,
    ) -> ResolverResult<()> {
        self.resolver_for(identifier)?
            .purge_content(partition, identifier)
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("schemes", &self.by_scheme.keys().collect::<Vec<_>>())
            .finish()
    }
}
