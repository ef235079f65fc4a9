//! Error types for the Merkle AVL tree

use thiserror::Error;

/// Error type for tree operations
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TreeError {
    /// The key is not present in the tree
    #[error("key not found: {}", hex::encode(.0))]
    KeyNotFound(Vec<u8>),
    /// A bulk build was given the same key twice
    #[error("duplicate key: {}", hex::encode(.0))]
    DuplicateKey(Vec<u8>),
    /// A user-supplied hash function did not produce a hex digest
    #[error("invalid hash function: {0}")]
    InvalidHashFunction(String),
}
