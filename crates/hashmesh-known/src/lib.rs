//! Known-source index for hashmesh.
//!
//! A known-source index maps a content hash to the ordered set of backends
//! believed to hold it. It is a hint cache: entries may be stale (the backend
//! no longer has the object) or incomplete (a backend has it but is not
//! listed). Resolvers tolerate both; a bad hint only costs latency.
//!
//! # Modules
//!
//! - [`error`]: Error types for index operations
//! - [`traits`]: The [`KnownSources`] trait
//! - [`memory`]: In-memory [`InMemoryKnownSources`]
//!
//! # Rules
//!
//! 1. No duplicate backend ids within one hash's record.
//! 2. Merge and eviction are idempotent, so concurrent resolutions may
//!    interleave freely.
//! 3. Each resolver owns its index; peers only ever read it.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{KnownError, KnownResult};
pub use memory::InMemoryKnownSources;
pub use traits::KnownSources;
