//! Local filesystem backend for binres.
//!
//! [`FileResolver`] serves the `file` URI scheme. Each partition maps to a
//! directory root and each identifier to a path beneath it:
//!
//! ```text
//! partition "partition" -> /srv/binaries
//! file:test.txt         -> /srv/binaries/test.txt
//! file:///a/b.bin       -> /srv/binaries/a/b.bin
//! ```
//!
//! Files are stored as-is with no sidecar metadata. Writes go to a
//! temporary file in the destination directory which is synced and then
//! renamed over the destination, so readers never observe a partial payload.
//!
//! The partition mapping is fixed at construction, either in code through
//! [`PartitionMap`] or from TOML through [`FileResolverConfig`].

pub mod config;
pub mod error;
pub mod partitions;
pub mod resolver;

pub use config::FileResolverConfig;
pub use error::{ConfigError, ConfigResult};
pub use partitions::PartitionMap;
pub use resolver::{FileResolver, FILE_SCHEME};
