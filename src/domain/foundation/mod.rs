//! Foundation module - Shared domain primitives.
//!
//! Contains value objects and enums that form the vocabulary of the
//! academy console domain.

mod collection;
mod resource_kind;
mod timestamp;

pub use collection::Collection;
pub use resource_kind::{ResourceKind, UnknownResourceKind};
pub use timestamp::Timestamp;
