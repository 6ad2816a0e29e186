//! Multi-source content resolution for hashmesh.
//!
//! Objects are content addressed and may live on any of several backends.
//! This crate finds them without the caller knowing where they are:
//!
//! - [`MultiSourceResolver`] races the backends that may hold a hash, learns
//!   which backend answered, forgets hints that turned out stale, and
//!   imports the winner's knowledge about the object's links.
//! - [`CachedResolver`] puts a local cache in front, writes remote hits
//!   through, and creates new objects optimistically: on one backend and the
//!   cache at once, then replicated to the rest in the background.
//! - [`race_to_success`] is the first-success-or-all-fail combinator both
//!   are built on.
//!
//! # Outcomes
//!
//! `get` returns the payload or `None`. Backend failures and "not found"
//! answers are never surfaced individually; they only shape the
//! known-source index. Replication failures are reported through
//! [`ReplicationEvent`]s and the log, never as call failures.

pub mod cached;
pub mod config;
pub mod error;
pub mod multi;
pub mod race;
pub mod replication;

#[cfg(test)]
mod testing;

pub use cached::CachedResolver;
pub use config::{ResolverConfig, TargetPolicy};
pub use error::{AttemptError, ResolveError, ResolveResult};
pub use multi::MultiSourceResolver;
pub use race::{race_to_success, RaceExhausted};
pub use replication::{ReplicationEvent, ReplicationStream};
