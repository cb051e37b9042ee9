use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Name of a logical storage bucket.
///
/// A partition name is a plain key: it is routed to exactly one backend
/// location by whoever builds the resolver, and is never interpreted as a
/// path. Names must be non-empty and may not contain whitespace, control
/// characters, or path separators.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionName(String);

impl PartitionName {
    /// Validate and wrap a partition name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    /// The partition name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<(), TypeError> {
    let reject = |reason: &str| TypeError::InvalidPartition {
        name: name.to_string(),
        reason: reason.into(),
    };

    if name.is_empty() {
        return Err(reject("must not be empty"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(reject("must not contain whitespace or control characters"));
    }
    if name.contains(['/', '\\']) {
        return Err(reject("must not contain path separators"));
    }
    if name == "." || name == ".." {
        return Err(reject("must not be a relative path component"));
    }
    Ok(())
}

impl fmt::Debug for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionName({})", self.0)
    }
}

impl fmt::Display for PartitionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PartitionName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PartitionName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PartitionName {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PartitionName> for String {
    fn from(name: PartitionName) -> Self {
        name.0
    }
}

impl AsRef<str> for PartitionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by `PartitionName` be queried with a plain `&str`.
impl Borrow<str> for PartitionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
