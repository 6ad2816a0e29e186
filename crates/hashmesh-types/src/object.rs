use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::hash::ContentHash;

/// A payload together with the content hash it is stored under.
///
/// The payload is trusted to be identical on every backend that holds `id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HashedObject {
    pub id: ContentHash,
    pub object: Value,
}

impl HashedObject {
    pub fn new(id: ContentHash, object: Value) -> Self {
        Self { id, object }
    }

    /// Hash `object` with [`ContentHash::of_json`] and pair the two.
    pub fn derive(object: Value) -> Result<Self, TypeError> {
        let id = ContentHash::of_json(&object)?;
        Ok(Self { id, object })
    }
}
