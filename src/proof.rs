//! Audit proofs: ordered sibling-hash paths that reconstruct the root hash
//! from a single key.
//!
//! A proof lists, for every branch between the leaf and the root, the digest
//! of the sibling subtree and which side it sits on. Verification needs only
//! the key, the path, the expected root hash and a hasher, never the tree.

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::hasher::{Digest, Hasher};

/// Which side of the running hash a recorded sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// One step of an audit path: a sibling digest and its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    sibling: Digest,
    side: Side,
}

impl ProofStep {
    /// Creates a new proof step.
    pub fn new(sibling: Digest, side: Side) -> Self {
        Self { sibling, side }
    }

    /// Returns the sibling digest recorded for this step.
    pub fn sibling(&self) -> &Digest {
        &self.sibling
    }

    /// Returns the side the sibling sits on.
    pub fn side(&self) -> Side {
        self.side
    }
}

/// An audit proof for one key.
///
/// The path is stored leaf-first, the order verification consumes it in. A
/// proof taken from an empty tree has no path at all and never verifies; a
/// proof from a single-leaf tree has an empty path and verifies exactly when
/// the root hash is the digest of the key.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde_as(as = "Hex")]
    key: Vec<u8>,
    path: Option<Vec<ProofStep>>,
}

impl Proof {
    /// Creates a proof from a leaf-first path.
    pub fn new(key: Vec<u8>, path: Vec<ProofStep>) -> Self {
        Self {
            key,
            path: Some(path),
        }
    }

    /// Creates the proof an empty tree hands out. It can never verify.
    pub fn unverifiable(key: Vec<u8>) -> Self {
        Self { key, path: None }
    }

    /// Returns the key the proof speaks for.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the leaf-first path, or `None` for an unverifiable proof.
    pub fn path(&self) -> Option<&[ProofStep]> {
        self.path.as_deref()
    }

    /// Folds the path leaf-first starting from the digest of the key and
    /// compares the result against `root_hash`.
    pub fn verify(&self, root_hash: Option<&Digest>, hasher: &dyn Hasher) -> bool {
        let (Some(path), Some(root_hash)) = (&self.path, root_hash) else {
            return false;
        };
        let mut acc = hasher.hash(&self.key);
        for step in path {
            acc = match step.side {
                Side::Right => hasher.concat_hash(&acc, &step.sibling),
                Side::Left => hasher.concat_hash(&step.sibling, &acc),
            };
        }
        acc == *root_hash
    }
}
