//! Foundation types for binres.
//!
//! Every other binres crate depends on `binres-types`. The types here carry
//! no behavior beyond validation: they name *where* a payload lives, never
//! *how* it is stored.
//!
//! # Key Types
//!
//! - [`PartitionName`] -- Logical storage bucket routed to one backend location
//! - [`ContentId`] -- Opaque, caller-generated URI naming a binary payload
//! - [`UploadSessionId`] -- Handle for an open multipart upload (UUID v7)

pub mod error;
pub mod identifier;
pub mod partition;
pub mod session;

pub use error::{TypeError, TypeResult};
pub use identifier::ContentId;
pub use partition::PartitionName;
pub use session::UploadSessionId;
