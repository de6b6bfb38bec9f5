//! Notifier adapters.

mod recording;
mod tracing_notifier;

pub use recording::RecordingNotifier;
pub use tracing_notifier::TracingNotifier;
