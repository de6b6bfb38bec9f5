//! Hierarchical cache keys.
//!
//! A key is an ordered list of segments, e.g. `["students", 42]` or
//! `["students", "paged", 0, 20, null]`. Invalidation and removal match by
//! prefix, so `["students"]` covers every student query.

use std::fmt;

use crate::domain::foundation::{Collection, ResourceKind};

/// One key segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    Text(String),
    Int(i64),
    Null,
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Text(s) => write!(f, "{:?}", s),
            KeySegment::Int(i) => write!(f, "{}", i),
            KeySegment::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Text(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Text(value)
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        KeySegment::Int(value)
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        KeySegment::Int(i64::from(value))
    }
}

impl From<ResourceKind> for KeySegment {
    fn from(value: ResourceKind) -> Self {
        KeySegment::Text(value.as_str().to_string())
    }
}

impl From<Collection> for KeySegment {
    fn from(value: Collection) -> Self {
        KeySegment::Text(value.as_str().to_string())
    }
}

impl<T: Into<KeySegment>> From<Option<T>> for KeySegment {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeySegment::Null, Into::into)
    }
}

/// Cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// Starts a key with its root segment.
    pub fn new(root: impl Into<KeySegment>) -> Self {
        Self(vec![root.into()])
    }

    /// Appends a segment.
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// `[kind]` - every query for a collection.
    pub fn collection(kind: impl Into<Collection>) -> Self {
        Self::new(kind.into())
    }

    /// `[kind, id]` - a single record.
    pub fn entity(kind: impl Into<Collection>, id: i64) -> Self {
        Self::new(kind.into()).with(id)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// True when `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", segment)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_key_is_prefixed_by_collection_key() {
        let collection = QueryKey::collection(ResourceKind::Students);
        let entity = QueryKey::entity(ResourceKind::Students, 42);

        assert!(entity.starts_with(&collection));
        assert!(!collection.starts_with(&entity));
    }

    #[test]
    fn keys_for_different_kinds_do_not_overlap() {
        let students = QueryKey::collection(ResourceKind::Students);
        let batches = QueryKey::entity(ResourceKind::Batches, 1);
        assert!(!batches.starts_with(&students));
    }

    #[test]
    fn batch_type_keys_sit_beside_batch_keys() {
        let batch_types = QueryKey::collection(Collection::BatchTypes);
        assert_eq!(batch_types.to_string(), r#"["batchTypes"]"#);
        assert!(!QueryKey::entity(ResourceKind::Batches, 1).starts_with(&batch_types));
        assert!(QueryKey::entity(Collection::BatchTypes, 1).starts_with(&batch_types));
    }

    #[test]
    fn every_key_starts_with_itself() {
        let key = QueryKey::new("students").with("paged").with(0i64);
        assert!(key.starts_with(&key));
    }

    #[test]
    fn optional_segments_become_null() {
        let key = QueryKey::new("students").with(None::<i64>);
        assert_eq!(key.segments()[1], KeySegment::Null);
        assert_ne!(key, QueryKey::new("students"));
    }

    #[test]
    fn display_reads_like_a_list() {
        let key = QueryKey::new("students")
            .with("paged")
            .with(0u32)
            .with(20u32)
            .with(None::<String>);
        assert_eq!(key.to_string(), r#"["students", "paged", 0, 20, null]"#);
    }
}
