//! The five record kinds the console manages.
//!
//! Each kind has one REST collection and one push topic. The topic name is the
//! camel-case string the backend broadcasts on (`/topic/<name>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A record kind managed by the console. Doubles as the push topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Students,
    Batches,
    Classes,
    Mentors,
    MentorSessions,
}

impl ResourceKind {
    /// All kinds, in the order the backend documents them.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Students,
        ResourceKind::Batches,
        ResourceKind::Classes,
        ResourceKind::Mentors,
        ResourceKind::MentorSessions,
    ];

    /// Topic name, also the first segment of every query key for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Students => "students",
            ResourceKind::Batches => "batches",
            ResourceKind::Classes => "classes",
            ResourceKind::Mentors => "mentors",
            ResourceKind::MentorSessions => "mentorSessions",
        }
    }

    /// Broker destination the backend publishes this kind's events to.
    pub fn destination(&self) -> String {
        format!("/topic/{}", self.as_str())
    }

    /// Resolves a broker destination back to its kind.
    pub fn from_destination(destination: &str) -> Option<Self> {
        destination
            .strip_prefix("/topic/")
            .and_then(|name| name.parse().ok())
    }

    /// REST collection path relative to the API base.
    pub fn rest_path(&self) -> &'static str {
        match self {
            ResourceKind::Students => "/students",
            ResourceKind::Batches => "/batches",
            ResourceKind::Classes => "/classes",
            ResourceKind::Mentors => "/mentors",
            ResourceKind::MentorSessions => "/mentor-sessions",
        }
    }

    /// Upper-case prefix of this kind's event tags (`MENTOR_SESSION` etc).
    pub fn event_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Students => "STUDENT",
            ResourceKind::Batches => "BATCH",
            ResourceKind::Classes => "CLASS",
            ResourceKind::Mentors => "MENTOR",
            ResourceKind::MentorSessions => "MENTOR_SESSION",
        }
    }

    /// Human label for a single record, used in notifications.
    pub fn singular_label(&self) -> &'static str {
        match self {
            ResourceKind::Students => "Student",
            ResourceKind::Batches => "Batch",
            ResourceKind::Classes => "Class",
            ResourceKind::Mentors => "Mentor",
            ResourceKind::MentorSessions => "Mentor session",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known resource kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownResourceKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_follow_topic_prefix() {
        assert_eq!(ResourceKind::Students.destination(), "/topic/students");
        assert_eq!(
            ResourceKind::MentorSessions.destination(),
            "/topic/mentorSessions"
        );
    }

    #[test]
    fn from_destination_resolves_every_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_destination(&kind.destination()), Some(kind));
        }
    }

    #[test]
    fn from_destination_rejects_foreign_destinations() {
        assert_eq!(ResourceKind::from_destination("/queue/students"), None);
        assert_eq!(ResourceKind::from_destination("/topic/instructors"), None);
        assert_eq!(ResourceKind::from_destination("students"), None);
    }

    #[test]
    fn mentor_sessions_use_kebab_case_rest_path() {
        assert_eq!(ResourceKind::MentorSessions.rest_path(), "/mentor-sessions");
    }

    #[test]
    fn serde_uses_topic_names() {
        let json = serde_json::to_string(&ResourceKind::MentorSessions).unwrap();
        assert_eq!(json, r#""mentorSessions""#);

        let kind: ResourceKind = serde_json::from_str(r#""batches""#).unwrap();
        assert_eq!(kind, ResourceKind::Batches);
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let err = "instructors".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown resource kind: instructors");
    }
}
