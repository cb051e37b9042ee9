use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque, URI-shaped reference to a binary payload.
///
/// A `ContentId` has the form `scheme ":" scheme-specific-part`. The scheme
/// selects which backend handles the payload; the remainder is handed to that
/// backend uninterpreted. Identifiers are generated by the caller and are
/// never derived from the payload's content.
///
/// The scheme is normalized to lower case on parse, so `FILE:a.txt` and
/// `file:a.txt` are the same identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId {
    value: String,
    scheme_len: usize,
}

impl ContentId {
    /// Parse a content identifier.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let reject = |reason: &str| TypeError::InvalidIdentifier {
            value: value.to_string(),
            reason: reason.into(),
        };

        let (scheme, rest) = value
            .split_once(':')
            .ok_or_else(|| reject("missing scheme"))?;

        let mut chars = scheme.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            Some(_) => return Err(reject("scheme must start with a letter")),
            None => return Err(reject("scheme must not be empty")),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return Err(reject("scheme contains invalid characters"));
        }
        if rest.is_empty() {
            return Err(reject("scheme-specific part must not be empty"));
        }
        if rest.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(reject("must not contain whitespace or control characters"));
        }

        Ok(Self {
            value: format!("{}:{}", scheme.to_ascii_lowercase(), rest),
            scheme_len: scheme.len(),
        })
    }

    /// Mint a fresh identifier under `scheme` (`scheme:<uuid-v7>`).
    ///
    /// UUID v7 keeps freshly minted identifiers roughly time-ordered.
    pub fn generate(scheme: &str) -> Result<Self, TypeError> {
        Self::parse(&format!("{}:{}", scheme, uuid::Uuid::now_v7()))
    }

    /// The lower-cased scheme, without the trailing `:`.
    pub fn scheme(&self) -> &str {
        &self.value[..self.scheme_len]
    }

    /// Everything after the first `:`.
    pub fn scheme_specific_part(&self) -> &str {
        &self.value[self.scheme_len + 1..]
    }

    /// The full identifier string.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.value)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for ContentId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.value
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_opaque_file_uri() {
        let id = ContentId::parse("file:test.txt").unwrap();
        assert_eq!(id.scheme(), "file");
        assert_eq!(id.scheme_specific_part(), "test.txt");
        assert_eq!(id.as_str(), "file:test.txt");
    }

    #[test]
    fn parses_hierarchical_uri() {
        let id = ContentId::parse("file:///var/data/a.bin").unwrap();
        assert_eq!(id.scheme(), "file");
        assert_eq!(id.scheme_specific_part(), "///var/data/a.bin");
    }

    #[test]
    fn scheme_is_lowercased() {
        let id = ContentId::parse("FILE:Doc.TXT").unwrap();
        assert_eq!(id.scheme(), "file");
        assert_eq!(id.scheme_specific_part(), "Doc.TXT");
        assert_eq!(id, ContentId::parse("file:Doc.TXT").unwrap());
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "no-scheme", ":rest", "1abc:x", "fi le:x", "file:", "file:a b"] {
            assert!(
                matches!(ContentId::parse(bad), Err(TypeError::InvalidIdentifier { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn generate_produces_unique_ids_with_scheme() {
        let a = ContentId::generate("file").unwrap();
        let b = ContentId::generate("file").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.scheme(), "file");
        assert_eq!(a.scheme_specific_part().len(), 36);
    }

    #[test]
    fn serde_as_string() {
        let id = ContentId::parse("mem:obj/1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"mem:obj/1\"");
        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ContentId>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn scheme_and_rest_recombine(
            scheme in "[a-z][a-z0-9+.-]{0,8}",
            rest in "[A-Za-z0-9/._~-]{1,32}",
        ) {
            let raw = format!("{scheme}:{rest}");
            let id = ContentId::parse(&raw).unwrap();
            prop_assert_eq!(id.scheme(), scheme.as_str());
            prop_assert_eq!(id.scheme_specific_part(), rest.as_str());
            prop_assert_eq!(id.as_str(), raw.as_str());
        }
    }
}
