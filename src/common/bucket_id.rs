//! Bucket and index identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a bucket within one grid index.
///
/// Bucket ids come from a per-index counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(pub u32);

impl BucketId {
    /// Create a new BucketId.
    #[inline]
    pub fn new(id: u32) -> Self {
        BucketId(id)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket({})", self.0)
    }
}

/// Identifies a grid index within one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexId(pub u32);

impl IndexId {
    /// Create a new IndexId.
    #[inline]
    pub fn new(id: u32) -> Self {
        IndexId(id)
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index({})", self.0)
    }
}
