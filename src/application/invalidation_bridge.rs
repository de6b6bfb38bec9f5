//! CacheInvalidationBridge - Turns push events into cache staleness and notifications.
//!
//! One handler per topic. Every event marks the topic's queries stale
//! (`[topic]` is a prefix of all of them); updates and deletions also mark
//! the record's own entry. Nothing is refetched here; the next read does it.
//!
//! The realtime client knows nothing about the cache. This bridge is the
//! host-side glue registered onto it.

use std::sync::Arc;

use crate::domain::cache::QueryKey;
use crate::domain::foundation::ResourceKind;
use crate::domain::realtime::{EventAction, RealtimeEvent};
use crate::ports::{Notification, Notifier};

use super::query_cache::QueryCache;
use super::realtime_client::RealtimeClient;

pub struct CacheInvalidationBridge {
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl CacheInvalidationBridge {
    pub fn new(cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    /// Registers this bridge as the handler for every topic.
    pub fn register(self: &Arc<Self>, client: &RealtimeClient) {
        for topic in ResourceKind::ALL {
            let bridge = Arc::clone(self);
            client.subscribe(topic, move |event: RealtimeEvent| bridge.handle_event(&event));
        }
        tracing::debug!("Cache invalidation bridge registered for all topics");
    }

    pub fn handle_event(&self, event: &RealtimeEvent) {
        let kind = event.kind.resource;
        let id = event.record_id();

        self.cache.invalidate(&QueryKey::collection(kind));
        if matches!(event.kind.action, EventAction::Updated | EventAction::Deleted) {
            self.cache.invalidate(&QueryKey::entity(kind, id));
        }

        tracing::debug!(kind = %event.kind, id, "Applied realtime event to cache");

        if let Some(notification) = notification_for(event) {
            self.notifier.notify(notification);
        }
    }
}

/// User-facing notice for an event, if that kind of change is announced.
///
/// Creations and deletions are always announced; updates only for students.
pub fn notification_for(event: &RealtimeEvent) -> Option<Notification> {
    let kind = event.kind.resource;
    let title = match (kind, event.kind.action) {
        (ResourceKind::Students, EventAction::Created) => "New Student",
        (ResourceKind::Students, EventAction::Updated) => "Student Updated",
        (ResourceKind::Students, EventAction::Deleted) => "Student Deleted",
        (ResourceKind::Batches, EventAction::Created) => "New Batch",
        (ResourceKind::Batches, EventAction::Deleted) => "Batch Deleted",
        (ResourceKind::Classes, EventAction::Created) => "New Class",
        (ResourceKind::Classes, EventAction::Deleted) => "Class Deleted",
        (ResourceKind::Mentors, EventAction::Created) => "New Mentor",
        (ResourceKind::Mentors, EventAction::Deleted) => "Mentor Deleted",
        (ResourceKind::MentorSessions, EventAction::Created) => "New Session",
        (ResourceKind::MentorSessions, EventAction::Deleted) => "Session Deleted",
        (_, EventAction::Updated) => return None,
    };

    let verb = match event.kind.action {
        EventAction::Created => "created",
        EventAction::Updated => "updated",
        EventAction::Deleted => "deleted",
    };

    Some(Notification::info(
        title,
        format!("{} {} has been {}", kind.singular_label(), event.record_id(), verb),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notifications::RecordingNotifier;
    use crate::domain::realtime::{EventKind, EventPayload};

    fn event(kind: ResourceKind, action: EventAction, id: i64) -> RealtimeEvent {
        RealtimeEvent::new(
            EventKind::new(kind, action),
            EventPayload::new(id),
            "2024-01-01T00:00:00Z",
        )
    }

    fn bridge() -> (CacheInvalidationBridge, QueryCache, Arc<RecordingNotifier>) {
        let cache = QueryCache::default();
        let notifier = Arc::new(RecordingNotifier::new());
        (
            CacheInvalidationBridge::new(cache.clone(), notifier.clone()),
            cache,
            notifier,
        )
    }

    #[test]
    fn created_marks_collection_but_not_entity_stale() {
        let (bridge, cache, _) = bridge();
        let list = QueryKey::collection(ResourceKind::Students).with("paged").with(0_i64);
        let entity = QueryKey::entity(ResourceKind::Students, 7);
        cache.set_query_data(list.clone(), 1_i64);
        cache.set_query_data(entity.clone(), 2_i64);

        bridge.handle_event(&event(ResourceKind::Students, EventAction::Created, 42));

        assert!(cache.is_stale(&list));
        // `[students]` is a prefix of the entity key too
        assert!(cache.is_stale(&entity));
    }

    #[test]
    fn deleted_marks_entity_stale_and_leaves_other_kinds() {
        let (bridge, cache, _) = bridge();
        let entity = QueryKey::entity(ResourceKind::Mentors, 3);
        let other = QueryKey::collection(ResourceKind::Classes);
        cache.set_query_data(entity.clone(), 1_i64);
        cache.set_query_data(other.clone(), 1_i64);

        bridge.handle_event(&event(ResourceKind::Mentors, EventAction::Deleted, 3));

        assert!(cache.is_stale(&entity));
        assert!(cache.get_query_data::<i64>(&entity).is_some());
        assert!(!cache.is_stale(&other));
    }

    #[test]
    fn notification_table() {
        for kind in ResourceKind::ALL {
            assert!(notification_for(&event(kind, EventAction::Created, 1)).is_some());
            assert!(notification_for(&event(kind, EventAction::Deleted, 1)).is_some());
            let updated = notification_for(&event(kind, EventAction::Updated, 1));
            assert_eq!(updated.is_some(), kind == ResourceKind::Students);
        }
    }

    #[test]
    fn notification_text() {
        let notice = notification_for(&event(ResourceKind::MentorSessions, EventAction::Created, 5)).unwrap();
        assert_eq!(notice.title, "New Session");
        assert_eq!(notice.description, "Mentor session 5 has been created");

        let notice = notification_for(&event(ResourceKind::Students, EventAction::Updated, 9)).unwrap();
        assert_eq!(notice.title, "Student Updated");
        assert_eq!(notice.description, "Student 9 has been updated");
    }

    #[test]
    fn silent_update_still_invalidates() {
        let (bridge, cache, notifier) = bridge();
        let entity = QueryKey::entity(ResourceKind::Batches, 4);
        cache.set_query_data(entity.clone(), 1_i64);

        bridge.handle_event(&event(ResourceKind::Batches, EventAction::Updated, 4));

        assert!(cache.is_stale(&entity));
        assert_eq!(notifier.count(), 0);
    }
}
