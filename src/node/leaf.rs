use std::fmt::Display;

use crate::hasher::{Digest, Hasher};

/// A leaf holds one key/value pair. Leaves are the only nodes that carry
/// values, and their digest covers the key alone, so replacing a value never
/// changes any hash in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    key: Vec<u8>,
    value: Vec<u8>,
    key_hash: Digest,
}

impl Leaf {
    /// Creates a new [`Leaf`]. This function performs a hash.
    pub fn new(key: Vec<u8>, value: Vec<u8>, hasher: &dyn Hasher) -> Self {
        let key_hash = hasher.hash(&key);
        Self {
            key,
            value,
            key_hash,
        }
    }

    /// Rebuilds this leaf with a new value, reusing the key hash.
    pub(crate) fn with_value(&self, value: Vec<u8>) -> Self {
        Self {
            key: self.key.clone(),
            value,
            key_hash: self.key_hash.clone(),
        }
    }

    /// Returns the key of the leaf.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the value of the leaf.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the digest of the node. NO HASHING IS DONE HERE.
    pub fn hash(&self) -> &Digest {
        &self.key_hash
    }
}

impl Display for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Leaf {{ key: {}, hash: {}, value: {:?} }}",
            hex::encode(&self.key),
            self.hash(),
            self.value()
        )
    }
}
