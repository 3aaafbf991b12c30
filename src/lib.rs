//! Mini TTL Cache - An embedded, thread-safe key-value cache
//!
//! Provides a concurrent map with per-entry time-to-live, lazy expiration on
//! reads, an optional background sweeper, and eviction callbacks.
//!
//! ```
//! use std::time::Duration;
//! use mini_ttl_cache::{Store, Ttl};
//!
//! let store: Store<String> =
//!     Store::new(Duration::from_secs(300), Duration::from_secs(1)).unwrap();
//!
//! store.set("session", "abc", Ttl::Default);
//! assert!(store.add("session", "xyz", Ttl::Never).is_err());
//! assert_eq!(store.get("session").as_deref(), Some("abc"));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, Entry, Number, Store, Ttl, Value};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::Sweeper;
