//! Synchronized query cache.
//!
//! Keyed, in-memory cache of fetched collections with staleness windows,
//! single-flight deduplication, invalidation triggered by successful
//! mutations, and status-transition subscriptions for reactive consumers.

pub mod query;

pub use query::{
    QueryCache, QueryHandle, QueryKey, QueryStatus, ResourceKind, SubscriptionHandle,
};
