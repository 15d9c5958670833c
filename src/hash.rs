//! Hash adapters: the two hook points between the core engine and a leaf's
//! original representation.

use crate::error::MerkleError;
use alloy_primitives::{keccak256, Keccak256, B256};

/// Computes an internal node's digest from its two children.
///
/// Implementations are expected to be pure and, for compatibility with the
/// on-chain verifier, commutative in `(left, right)`.
pub type NodeHashFn = fn(B256, B256) -> B256;

/// Produces a leaf's digest from its raw value.
///
/// Unlike [`NodeHashFn`] this is a trait rather than a bare function pointer:
/// the standard variant's leaf hash needs the caller-supplied ABI type list,
/// so the hook carries state fixed at tree-construction time.
pub trait LeafHash<V> {
    fn leaf_hash(&self, value: &V) -> Result<B256, MerkleError>;
}

/// `keccak256(sorted(a, b) ++ sorted(a, b))`, sorted lexicographically on raw
/// bytes. This is the default [`NodeHashFn`] for both variants.
pub fn default_node_hash(left: B256, right: B256) -> B256 {
    let (first, second) = if left <= right {
        (left, right)
    } else {
        (right, left)
    };

    let mut hasher = Keccak256::new();
    hasher.update(first);
    hasher.update(second);
    hasher.finalize()
}

/// Identity leaf hash for the simple variant: a 32-byte value is already a
/// digest. The 32-byte width is enforced structurally by `B256`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleLeafHash;

impl LeafHash<B256> for SimpleLeafHash {
    fn leaf_hash(&self, value: &B256) -> Result<B256, MerkleError> {
        Ok(*value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn node_hash_is_commutative() {
        let a = keccak256(b"a");
        let b = keccak256(b"b");
        assert_eq!(default_node_hash(a, b), default_node_hash(b, a));
    }

    #[test]
    fn simple_leaf_hash_is_identity() {
        let v = keccak256(b"hello");
        assert_eq!(SimpleLeafHash.leaf_hash(&v).unwrap(), v);
    }
}
