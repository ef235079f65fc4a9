//! Core Merkle AVL tree implementation

mod balance;

use std::fmt::{self, Debug};
use std::sync::Arc;

use balance::{insert_at, remove_at, Inserted, Removed};

use crate::hasher::{Digest, HashAlgorithm, Hasher};
use crate::node::{Branch, Leaf, Node};
use crate::proof::{Proof, ProofStep, Side};
use crate::TreeError;

/// An ordered key/value tree whose root hash commits to the whole key set.
///
/// The tree is a value: every mutation rebuilds the affected root-to-leaf
/// path and returns a new tree, sharing all untouched subtrees with the
/// previous version. Cloning a tree is cheap and old versions stay valid
/// snapshots.
///
/// Keys are byte strings ordered lexicographically; values are opaque bytes
/// and never enter any digest.
#[derive(Clone)]
pub struct Tree {
    root: Option<Arc<Node>>,
    size: usize,
    hasher: Arc<dyn Hasher>,
}

impl Tree {
    /// Creates an empty tree hashing with the default SHA-256.
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(HashAlgorithm::default()))
    }

    /// Creates an empty tree with the given hasher.
    pub fn with_hasher(hasher: Arc<dyn Hasher>) -> Self {
        Self {
            root: None,
            size: 0,
            hasher,
        }
    }

    /// Builds a balanced tree from key/value pairs in one pass, hashing with
    /// the default SHA-256.
    ///
    /// Unlike [`Tree::insert`], which treats a repeated key as a value
    /// update, a bulk build expects a fresh dataset and rejects duplicates.
    pub fn new_from_pairs(pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Self, TreeError> {
        Self::with_hasher_from_pairs(Arc::new(HashAlgorithm::default()), pairs)
    }

    /// Builds a balanced tree from key/value pairs with the given hasher.
    ///
    /// Pairs are sorted by key, split recursively at the midpoint, and hashed
    /// bottom-up while the nodes are constructed. The result has height
    /// `ceil(log2 n)`.
    pub fn with_hasher_from_pairs(
        hasher: Arc<dyn Hasher>,
        mut pairs: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> Result<Self, TreeError> {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(TreeError::DuplicateKey(window[1].0.clone()));
            }
        }
        let size = pairs.len();
        let root = if pairs.is_empty() {
            None
        } else {
            Some(build_range(pairs, &*hasher))
        };
        Ok(Self { root, size, hasher })
    }

    /// Returns the number of leaves in the tree.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true when the tree holds no leaves.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the root node, if any.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Returns the digest of the root node, or `None` for an empty tree.
    pub fn root_hash(&self) -> Option<&Digest> {
        self.root.as_deref().map(Node::hash)
    }

    /// Returns the hasher this tree was created with.
    pub fn hasher(&self) -> &Arc<dyn Hasher> {
        &self.hasher
    }

    /// Looks up the value stored under `key`.
    pub fn lookup(&self, key: &[u8]) -> Result<&[u8], TreeError> {
        let mut current = self
            .root
            .as_deref()
            .ok_or_else(|| TreeError::KeyNotFound(key.to_vec()))?;
        loop {
            match current {
                Node::Leaf(leaf) if leaf.key() == key => return Ok(leaf.value()),
                Node::Leaf(_) => return Err(TreeError::KeyNotFound(key.to_vec())),
                Node::Branch(branch) => {
                    current = if key <= branch.search_key() {
                        branch.left()
                    } else {
                        branch.right()
                    };
                }
            }
        }
    }

    /// Inserts a key/value pair and returns the new tree.
    ///
    /// Inserting an existing key replaces its value in place: the tree keeps
    /// its shape and every digest, including the root hash, stays the same.
    /// A new key adds a leaf, rebalances the spine and rehashes it on the way
    /// up.
    pub fn insert(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Tree {
        let key = key.into();
        let value = value.into();
        match &self.root {
            None => Tree {
                root: Some(Arc::new(Node::Leaf(Leaf::new(key, value, &*self.hasher)))),
                size: 1,
                hasher: Arc::clone(&self.hasher),
            },
            Some(root) => {
                let Inserted { node, replaced } = insert_at(root, key, value, &*self.hasher);
                Tree {
                    root: Some(node),
                    size: if replaced { self.size } else { self.size + 1 },
                    hasher: Arc::clone(&self.hasher),
                }
            }
        }
    }

    /// Deletes `key` and returns the new tree.
    ///
    /// The deleted leaf's sibling is promoted into their parent's place;
    /// heights, digests and routing keys are repaired along the spine, but
    /// deletion never rotates.
    pub fn delete(&self, key: &[u8]) -> Result<Tree, TreeError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| TreeError::KeyNotFound(key.to_vec()))?;
        let root = match remove_at(root, key, &*self.hasher)? {
            Removed::Gone => None,
            Removed::Kept(node) => Some(node),
        };
        Ok(Tree {
            root,
            size: self.size - 1,
            hasher: Arc::clone(&self.hasher),
        })
    }

    /// Returns every key, in the in-order traversal order of the tree.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::with_capacity(self.size);
        if let Some(root) = &self.root {
            collect_keys(root, &mut keys);
        }
        keys
    }

    /// Produces the audit proof for `key`: the sibling digest of every branch
    /// between the leaf position and the root, leaf-first.
    ///
    /// A key that is absent still yields a structurally valid proof; it just
    /// fails verification.
    pub fn audit(&self, key: &[u8]) -> Proof {
        let Some(root) = &self.root else {
            return Proof::unverifiable(key.to_vec());
        };
        let mut path = Vec::new();
        let mut current = root.as_ref();
        while let Node::Branch(branch) = current {
            if key <= branch.search_key() {
                path.push(ProofStep::new(branch.right().hash().clone(), Side::Right));
                current = branch.left();
            } else {
                path.push(ProofStep::new(branch.left().hash().clone(), Side::Left));
                current = branch.right();
            }
        }
        path.reverse();
        Proof::new(key.to_vec(), path)
    }

    /// Verifies a proof against this tree's root hash.
    pub fn verify(&self, proof: &Proof) -> bool {
        proof.verify(self.root_hash(), &*self.hasher)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("size", &self.size)
            .field("root_hash", &self.root_hash())
            .finish()
    }
}

impl PartialEq for Tree {
    /// Two trees are equal when they hold the same nodes in the same shape.
    /// The hasher is not compared; it already determined every digest.
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.root == other.root
    }
}

fn build_range(mut pairs: Vec<(Vec<u8>, Vec<u8>)>, hasher: &dyn Hasher) -> Arc<Node> {
    if pairs.len() == 1 {
        let (key, value) = pairs.remove(0);
        return Arc::new(Node::Leaf(Leaf::new(key, value, hasher)));
    }
    let mid = pairs.len() / 2;
    let right_half = pairs.split_off(mid);
    let search_key = pairs[mid - 1].0.clone();
    let left = build_range(pairs, hasher);
    let right = build_range(right_half, hasher);
    Arc::new(Node::Branch(Branch::new(left, right, search_key, hasher)))
}

fn collect_keys(node: &Node, keys: &mut Vec<Vec<u8>>) {
    match node {
        Node::Leaf(leaf) => keys.push(leaf.key().to_vec()),
        Node::Branch(branch) => {
            collect_keys(branch.left(), keys);
            collect_keys(branch.right(), keys);
        }
    }
}
