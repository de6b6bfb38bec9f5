//! Application layer - the realtime client, the query cache, and the glue
//! between them and the REST port.

mod invalidation_bridge;
mod query_cache;
mod realtime_client;
mod resources;

pub use invalidation_bridge::{notification_for, CacheInvalidationBridge};
pub use query_cache::{QueryCache, DEFAULT_STALE_TIME};
pub use realtime_client::{RealtimeClient, RealtimeSettings, TopicHandler};
pub use resources::{ResourceService, Resources};
