//! Insert and delete spines: AVL rebalancing fused with hash recomputation.
//!
//! Every structural change funnels through [`Branch::new`], which derives
//! height and digest from the children it is given. Rotations therefore
//! rebuild exactly two branches, lower one first, and the recursive unwind
//! rebuilds one branch per level, so an insert performs O(log n) hashes.

use std::sync::Arc;

use crate::hasher::Hasher;
use crate::node::{Branch, Leaf, Node};
use crate::TreeError;

/// Result of inserting below some subtree root.
pub(super) struct Inserted {
    pub node: Arc<Node>,
    /// True when an existing leaf had its value replaced; the tree shape and
    /// every digest are unchanged in that case.
    pub replaced: bool,
}

/// Result of deleting below some subtree root.
pub(super) enum Removed {
    /// The whole subtree was the deleted leaf.
    Gone,
    /// The subtree after removal, with the deleted leaf's sibling promoted.
    Kept(Arc<Node>),
}

pub(super) fn insert_at(
    node: &Arc<Node>,
    key: Vec<u8>,
    value: Vec<u8>,
    hasher: &dyn Hasher,
) -> Inserted {
    match node.as_ref() {
        Node::Leaf(leaf) => {
            if leaf.key() == key.as_slice() {
                return Inserted {
                    node: Arc::new(Node::Leaf(leaf.with_value(value))),
                    replaced: true,
                };
            }
            // Split the leaf: the smaller key goes left and becomes the
            // routing key of the spawned branch.
            let new = Arc::new(Node::Leaf(Leaf::new(key.clone(), value, hasher)));
            let existing = Arc::clone(node);
            let (left, right) = if key.as_slice() <= leaf.key() {
                (new, existing)
            } else {
                (existing, new)
            };
            let search_key = left.max_key().to_vec();
            Inserted {
                node: Arc::new(Node::Branch(Branch::new(left, right, search_key, hasher))),
                replaced: false,
            }
        }
        Node::Branch(branch) => {
            let go_left = key.as_slice() <= branch.search_key();
            let inserted_key = key.clone();
            let child = if go_left {
                branch.left()
            } else {
                branch.right()
            };
            let below = insert_at(child, key, value, hasher);
            let (left, right) = if go_left {
                (below.node, Arc::clone(branch.right()))
            } else {
                (Arc::clone(branch.left()), below.node)
            };
            // An insert never changes an existing routing key: a key routed
            // left satisfies key <= search_key, so the left maximum stays put.
            let search_key = branch.search_key().to_vec();
            let node = if below.replaced {
                Arc::new(Node::Branch(Branch::new(left, right, search_key, hasher)))
            } else {
                rebalance(left, right, search_key, &inserted_key, hasher)
            };
            Inserted {
                node,
                replaced: below.replaced,
            }
        }
    }
}

pub(super) fn remove_at(
    node: &Arc<Node>,
    key: &[u8],
    hasher: &dyn Hasher,
) -> Result<Removed, TreeError> {
    match node.as_ref() {
        Node::Leaf(leaf) => {
            if leaf.key() == key {
                Ok(Removed::Gone)
            } else {
                Err(TreeError::KeyNotFound(key.to_vec()))
            }
        }
        Node::Branch(branch) => {
            let go_left = key <= branch.search_key();
            let child = if go_left {
                branch.left()
            } else {
                branch.right()
            };
            match remove_at(child, key, hasher)? {
                Removed::Gone => {
                    // A branch never keeps a single child: the deleted leaf's
                    // sibling takes this branch's place.
                    let sibling = if go_left {
                        branch.right()
                    } else {
                        branch.left()
                    };
                    Ok(Removed::Kept(Arc::clone(sibling)))
                }
                Removed::Kept(new_child) => {
                    let (left, right) = if go_left {
                        (new_child, Arc::clone(branch.right()))
                    } else {
                        (Arc::clone(branch.left()), new_child)
                    };
                    // No rotation on delete. The routing key is re-derived
                    // only where it named the deleted key.
                    let search_key = if branch.search_key() == key {
                        left.max_key().to_vec()
                    } else {
                        branch.search_key().to_vec()
                    };
                    Ok(Removed::Kept(Arc::new(Node::Branch(Branch::new(
                        left, right, search_key, hasher,
                    )))))
                }
            }
        }
    }
}

/// Restores the AVL bound after a leaf was added under one of the two
/// children. The four cases are told apart by the height delta and by where
/// the new key landed relative to the taller child's routing key.
fn rebalance(
    left: Arc<Node>,
    right: Arc<Node>,
    search_key: Vec<u8>,
    inserted_key: &[u8],
    hasher: &dyn Hasher,
) -> Arc<Node> {
    let delta = left.height() as isize - right.height() as isize;
    if delta > 1 {
        if inserted_key <= left.search_key() {
            // left-left
            rotate_right(left, right, hasher)
        } else {
            // left-right
            let Node::Branch(child) = left.as_ref() else {
                unreachable!("a subtree of height >= 2 is a branch");
            };
            let rotated = rotate_left(
                Arc::clone(child.left()),
                Arc::clone(child.right()),
                child.search_key().to_vec(),
                hasher,
            );
            rotate_right(rotated, right, hasher)
        }
    } else if delta < -1 {
        if inserted_key > right.search_key() {
            // right-right
            rotate_left(left, right, search_key, hasher)
        } else {
            // right-left
            let Node::Branch(child) = right.as_ref() else {
                unreachable!("a subtree of height >= 2 is a branch");
            };
            let rotated = rotate_right(Arc::clone(child.left()), Arc::clone(child.right()), hasher);
            rotate_left(left, rotated, search_key, hasher)
        }
    } else {
        Arc::new(Node::Branch(Branch::new(left, right, search_key, hasher)))
    }
}

/// Right rotation of the subtree `(left, right)`: the left child becomes the
/// subtree root. The demoted node is rebuilt first, then the new root, so
/// heights and digests stay coherent bottom-up.
fn rotate_right(left: Arc<Node>, right: Arc<Node>, hasher: &dyn Hasher) -> Arc<Node> {
    let Node::Branch(pivot) = left.as_ref() else {
        unreachable!("rotation pivot must be a branch");
    };
    // The pivot's right subtree moves under the demoted node, which now
    // routes by that subtree's maximum.
    let moved = Arc::clone(pivot.right());
    let lower_key = moved.max_key().to_vec();
    let lower = Arc::new(Node::Branch(Branch::new(moved, right, lower_key, hasher)));
    Arc::new(Node::Branch(Branch::new(
        Arc::clone(pivot.left()),
        lower,
        pivot.search_key().to_vec(),
        hasher,
    )))
}

/// Left rotation of the subtree `(left, right)`: the right child becomes the
/// subtree root. Mirror of [`rotate_right`].
fn rotate_left(
    left: Arc<Node>,
    right: Arc<Node>,
    search_key: Vec<u8>,
    hasher: &dyn Hasher,
) -> Arc<Node> {
    let Node::Branch(pivot) = right.as_ref() else {
        unreachable!("rotation pivot must be a branch");
    };
    let moved = Arc::clone(pivot.left());
    let lower = Arc::new(Node::Branch(Branch::new(left, moved, search_key, hasher)));
    let upper_key = lower.max_key().to_vec();
    Arc::new(Node::Branch(Branch::new(
        lower,
        Arc::clone(pivot.right()),
        upper_key,
        hasher,
    )))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{insert_at, rotate_left, rotate_right};
    use crate::node::{Branch, Leaf, Node};
    use crate::HashAlgorithm;

    fn leaf(key: &[u8]) -> Arc<Node> {
        Arc::new(Node::Leaf(Leaf::new(
            key.to_vec(),
            vec![],
            &HashAlgorithm::Sha256,
        )))
    }

    fn branch(left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        let search_key = left.max_key().to_vec();
        Arc::new(Node::Branch(Branch::new(
            left,
            right,
            search_key,
            &HashAlgorithm::Sha256,
        )))
    }

    #[test]
    fn test_rotate_right_preserves_order_and_keys() {
        let hasher = HashAlgorithm::Sha256;
        // ((ant, bee), cat) rotated right becomes (ant, (bee, cat))
        let unbalanced_left = branch(leaf(b"ant"), leaf(b"bee"));
        let rotated = rotate_right(unbalanced_left, leaf(b"cat"), &hasher);
        let Node::Branch(root) = rotated.as_ref() else {
            panic!("rotation must produce a branch");
        };
        assert_eq!(root.search_key(), b"ant");
        assert_eq!(root.left().max_key(), b"ant");
        let Node::Branch(lower) = root.right().as_ref() else {
            panic!("demoted node must be a branch");
        };
        assert_eq!(lower.search_key(), b"bee");
        assert_eq!(lower.left().max_key(), b"bee");
        assert_eq!(lower.right().max_key(), b"cat");
    }

    #[test]
    fn test_rotate_left_mirrors_rotate_right() {
        let hasher = HashAlgorithm::Sha256;
        // (ant, (bee, cat)) rotated left becomes ((ant, bee), cat)
        let unbalanced_right = branch(leaf(b"bee"), leaf(b"cat"));
        let rotated = rotate_left(leaf(b"ant"), unbalanced_right, b"ant".to_vec(), &hasher);
        let Node::Branch(root) = rotated.as_ref() else {
            panic!("rotation must produce a branch");
        };
        assert_eq!(root.search_key(), b"bee");
        let Node::Branch(lower) = root.left().as_ref() else {
            panic!("demoted node must be a branch");
        };
        assert_eq!(lower.search_key(), b"ant");
        assert_eq!(root.right().max_key(), b"cat");
    }

    #[test]
    fn test_leaf_split_routes_smaller_key_left() {
        let hasher = HashAlgorithm::Sha256;
        let below = insert_at(&leaf(b"starfish"), b"centipede".to_vec(), vec![], &hasher);
        assert!(!below.replaced);
        let Node::Branch(root) = below.node.as_ref() else {
            panic!("split must produce a branch");
        };
        assert_eq!(root.search_key(), b"centipede");
        assert_eq!(root.left().max_key(), b"centipede");
        assert_eq!(root.right().max_key(), b"starfish");
        assert_eq!(root.height(), 1);
    }
}
