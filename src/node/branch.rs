use std::fmt::Display;
use std::sync::Arc;

use super::Node;
use crate::hasher::{Digest, Hasher};

/// A branch is a routing node with exactly two children. It holds no value;
/// its `search_key` is the largest key in its left subtree, and its digest
/// combines the child digests.
///
/// Children sit behind [`Arc`] so that rebuilding a root-to-leaf path shares
/// every untouched subtree with the previous version of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    left: Arc<Node>,
    right: Arc<Node>,
    search_key: Vec<u8>,
    height: usize,
    key_hash: Digest,
}

impl Branch {
    /// Creates a new [`Branch`] from two children. This function performs one
    /// hash; height and digest are derived from the children, so any pass
    /// that builds branches bottom-up leaves the whole subtree coherent.
    pub fn new(left: Arc<Node>, right: Arc<Node>, search_key: Vec<u8>, hasher: &dyn Hasher) -> Self {
        let height = 1 + left.height().max(right.height());
        let key_hash = hasher.concat_hash(left.hash(), right.hash());
        Self {
            left,
            right,
            search_key,
            height,
            key_hash,
        }
    }

    /// Returns the left child of this branch.
    pub fn left(&self) -> &Arc<Node> {
        &self.left
    }

    /// Returns the right child of this branch.
    pub fn right(&self) -> &Arc<Node> {
        &self.right
    }

    /// Returns the left and right children of this branch.
    pub fn children(&self) -> (&Node, &Node) {
        (&self.left, &self.right)
    }

    /// Returns the largest key of the left subtree, used to route lookups.
    pub fn search_key(&self) -> &[u8] {
        &self.search_key
    }

    /// Returns the height of this branch. Leaves have height 0.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the digest of the node. NO HASHING IS DONE HERE.
    pub fn hash(&self) -> &Digest {
        &self.key_hash
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Branch {{ search_key: {}, height: {}, hash: {} }}",
            hex::encode(&self.search_key),
            self.height,
            self.hash()
        )
    }
}
