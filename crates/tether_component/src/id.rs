//! Namespaced component names.
//!
//! A [`ComponentId`] is the `"namespace:path"` name under which a component
//! kind is registered, e.g. `"vitality:vita"`. The namespace is the owning
//! extension; the path names the component kind within it. Ids are the keys
//! of persisted component records, so they order deterministically and
//! serialise as their display string.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidId;

/// A namespaced component name, e.g. `"vitality:vita"`.
///
/// Namespaces accept `[a-z0-9_.-]`; paths additionally accept `/`. Both parts
/// must be non-empty. Two ids are equal iff their namespace and path are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    namespace: String,
    path: String,
}

impl ComponentId {
    /// Create an id from separate namespace and path parts.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidId`] if either part is empty or contains a character
    /// outside its allowed set.
    pub fn new(namespace: &str, path: &str) -> Result<Self, InvalidId> {
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(InvalidId {
                input: format!("{namespace}:{path}"),
                reason: "namespace must be non-empty [a-z0-9_.-]",
            });
        }
        if path.is_empty() || !path.chars().all(is_path_char) {
            return Err(InvalidId {
                input: format!("{namespace}:{path}"),
                reason: "path must be non-empty [a-z0-9_.-/]",
            });
        }
        Ok(Self {
            namespace: namespace.to_owned(),
            path: path.to_owned(),
        })
    }

    /// The namespace part (before the `:`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path part (after the `:`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ComponentId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((namespace, path)) = s.split_once(':') else {
            return Err(InvalidId {
                input: s.to_owned(),
                reason: "missing `:` separator",
            });
        };
        Self::new(namespace, path)
    }
}

impl Serialize for ComponentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ComponentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id: ComponentId = "vitality:vita".parse().unwrap();
        assert_eq!(id.namespace(), "vitality");
        assert_eq!(id.path(), "vita");
        assert_eq!(id.to_string(), "vitality:vita");
    }

    #[test]
    fn test_parse_path_with_slash() {
        let id: ComponentId = "mod:stats/mana".parse().unwrap();
        assert_eq!(id.path(), "stats/mana");
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!("no_namespace".parse::<ComponentId>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_characters() {
        assert!("Upper:case".parse::<ComponentId>().is_err());
        assert!("mod:spa ce".parse::<ComponentId>().is_err());
        assert!("mod:".parse::<ComponentId>().is_err());
        assert!(":path".parse::<ComponentId>().is_err());
    }

    #[test]
    fn test_slash_not_allowed_in_namespace() {
        assert!(ComponentId::new("a/b", "path").is_err());
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let id: ComponentId = "mod:counter".parse().unwrap();
        let bytes = rmp_serde::to_vec(&id).unwrap();
        let restored: ComponentId = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(id, restored);

        // Encodes as a plain string on the wire.
        let as_str: String = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(as_str, "mod:counter");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let bytes = rmp_serde::to_vec("not-an-id").unwrap();
        assert!(rmp_serde::from_slice::<ComponentId>(&bytes).is_err());
    }

    #[test]
    fn test_ordering_is_by_namespace_then_path() {
        let a: ComponentId = "alpha:z".parse().unwrap();
        let b: ComponentId = "beta:a".parse().unwrap();
        assert!(a < b);
    }
}
