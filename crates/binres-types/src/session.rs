use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of an open multipart upload session (UUID v7).
///
/// Callers hold only this handle; the session itself is owned by the backend
/// that created it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UploadSessionId(uuid::Uuid);

impl UploadSessionId {
    /// Generate a new time-ordered session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a session ID from its string form.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        uuid::Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| TypeError::InvalidSessionId(value.to_string()))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for UploadSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UploadSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadSessionId({})", self.0)
    }
}

impl fmt::Display for UploadSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UploadSessionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(UploadSessionId::new(), UploadSessionId::new());
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = UploadSessionId::new();
        let parsed: UploadSessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            UploadSessionId::parse("test-identifier"),
            Err(TypeError::InvalidSessionId("test-identifier".into()))
        );
    }
}
