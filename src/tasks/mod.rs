//! Background Tasks Module
//!
//! Contains background tasks that run alongside a cache store.
//!
//! # Tasks
//! - Sweeper: Periodically purges expired entries from its store

mod sweeper;

pub(crate) use sweeper::Purge;
pub use sweeper::Sweeper;
