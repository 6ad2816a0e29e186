//! Storage backend interfaces for hashmesh.
//!
//! A [`Source`] answers one question: "give me the object stored under this
//! hash, or tell me you don't have it". Each storage system (local cache,
//! peer-to-peer store, ledger-backed store) implements it once.
//!
//! # Modules
//!
//! - [`traits`]: [`Source`] and the writable [`CacheStore`]
//! - [`discoverable`]: [`DiscoverableSource`], a source paired with its own
//!   known-source index
//! - [`links`]: link extraction with [`LinkPattern`], [`PatternRegistry`],
//!   [`FieldLinks`]
//! - [`memory`]: [`InMemorySource`] for tests and embedding
//! - [`fs`]: [`FsSource`], one JSON file per object
//!
//! Sources never interpret payloads. Link extraction is a separate
//! capability selected by payload shape.

pub mod discoverable;
pub mod error;
pub mod fs;
pub mod links;
pub mod memory;
pub mod traits;

pub use discoverable::DiscoverableSource;
pub use error::{SourceError, SourceResult};
pub use fs::FsSource;
pub use links::{FieldLinks, LinkPattern, PatternRegistry};
pub use memory::InMemorySource;
pub use traits::{CacheStore, Source};
