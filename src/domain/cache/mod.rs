//! Query cache vocabulary.

mod query_key;

pub use query_key::{KeySegment, QueryKey};
