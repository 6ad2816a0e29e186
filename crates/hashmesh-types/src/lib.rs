//! Foundation types for hashmesh.
//!
//! Every other hashmesh crate depends on `hashmesh-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`]: Opaque content address assigned by a backend
//! - [`BackendId`]: Name of a configured storage backend
//! - [`HashedObject`]: A payload paired with its content hash

pub mod backend;
pub mod error;
pub mod hash;
pub mod object;

pub use backend::BackendId;
pub use error::TypeError;
pub use hash::ContentHash;
pub use object::HashedObject;
