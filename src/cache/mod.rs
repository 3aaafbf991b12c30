//! Cache Module
//!
//! Provides the in-memory store with per-entry TTL expiration, numeric
//! increments, and eviction callbacks.

mod entry;
mod increment;
mod stats;
mod store;
mod value;


// Re-export public types
pub use entry::Entry;
pub use stats::CacheStats;
pub use store::{EvictionCallback, Store, Ttl};
pub use value::{AsNumber, Number, NumberKind, Value};
