//! REST collections the console reads and mutates.
//!
//! Every [`ResourceKind`] is a collection. Batch types are served over REST
//! too but have no push topic, so they live here rather than in
//! [`ResourceKind::ALL`].

use std::fmt;

use super::resource_kind::ResourceKind;

/// A REST collection, also the root segment of its query keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Resource(ResourceKind),
    BatchTypes,
}

impl Collection {
    /// Root query-key segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Resource(kind) => kind.as_str(),
            Collection::BatchTypes => "batchTypes",
        }
    }

    /// REST collection path relative to the API base.
    pub fn rest_path(&self) -> &'static str {
        match self {
            Collection::Resource(kind) => kind.rest_path(),
            Collection::BatchTypes => "/batch-types",
        }
    }

    /// Human label for a single record, used in notifications.
    pub fn singular_label(&self) -> &'static str {
        match self {
            Collection::Resource(kind) => kind.singular_label(),
            Collection::BatchTypes => "Batch type",
        }
    }

    /// The push topic this collection is broadcast on, if any.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            Collection::Resource(kind) => Some(*kind),
            Collection::BatchTypes => None,
        }
    }
}

impl From<ResourceKind> for Collection {
    fn from(kind: ResourceKind) -> Self {
        Collection::Resource(kind)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_collections_defer_to_their_kind() {
        let mentors = Collection::from(ResourceKind::MentorSessions);
        assert_eq!(mentors.as_str(), "mentorSessions");
        assert_eq!(mentors.rest_path(), "/mentor-sessions");
        assert_eq!(mentors.resource_kind(), Some(ResourceKind::MentorSessions));
    }

    #[test]
    fn batch_types_are_rest_only() {
        assert_eq!(Collection::BatchTypes.as_str(), "batchTypes");
        assert_eq!(Collection::BatchTypes.rest_path(), "/batch-types");
        assert_eq!(Collection::BatchTypes.singular_label(), "Batch type");
        assert_eq!(Collection::BatchTypes.resource_kind(), None);
        assert!("batchTypes".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::ALL.len(), 5);
    }
}
