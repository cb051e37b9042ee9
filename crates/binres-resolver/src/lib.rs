//! Binary content resolution for binres.
//!
//! A *resolver* stores opaque binary payloads addressed by a
//! `(partition, identifier)` pair, where the identifier is a URI whose
//! scheme selects the backend. Resolvers never interpret payload bytes.
//!
//! # Backends
//!
//! All backends implement the [`Resolver`] trait:
//!
//! - [`InMemoryResolver`] -- `HashMap`-based store with multipart support,
//!   for tests and embedding
//! - `binres_fs::FileResolver` -- local filesystem, one directory per partition
//!
//! [`ResolverRegistry`] routes identifiers to backends by scheme.
//!
//! # Multipart Upload
//!
//! Multipart upload is an optional capability advertised by
//! [`Resolver::supports_multipart_upload`]. Backends without it reject every
//! multipart operation with [`ResolverError::Unsupported`]. Backends with it
//! can build on [`UploadSessions`], which owns the session state machine.
//!
//! # Design Rules
//!
//! 1. Absence is a value, never an error.
//! 2. Writes are atomic per identifier; a failed write keeps the old payload.
//! 3. All I/O errors are propagated, never folded into `false` or empty data.
//! 4. A capable backend never answers a multipart call with `Unsupported`.

pub mod capability;
pub mod error;
pub mod memory;
pub mod multipart;
pub mod registry;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use capability::MultipartOperation;
pub use error::{ResolverError, ResolverResult};
pub use memory::{InMemoryResolver, MEMORY_SCHEME};
pub use multipart::{digest, AssembledUpload, UploadSessions};
pub use registry::ResolverRegistry;
pub use traits::{CompletedUpload, ContentStream, PartDigest, Resolver};
