//! This module contains the [SimpleMerkleTree], a Merkle tree whose leaves
//! are caller-supplied 32-byte values, with an optional custom internal-node
//! hash function.
//!
//! # Examples
//!
//! ```rust
//! use alloy_merkle_tree::simple_binary_tree::SimpleMerkleTree;
//! use alloy_primitives::keccak256;
//!
//! let values = vec![keccak256("a"), keccak256("b"), keccak256("c")];
//! let tree = SimpleMerkleTree::of(&values).unwrap();
//!
//! for value in values.iter() {
//!     let proof = tree.get_proof_by_value(value).unwrap();
//!     assert!(tree.verify_proof_by_value(value, &proof));
//! }
//! ```

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::error::MerkleError;
use crate::hash::{default_node_hash, NodeHashFn, SimpleLeafHash};
use crate::tree::{IndexedValue, LeafTarget, MerkleTree};

const FORMAT: &str = "simple-v1";

/// A Merkle tree whose leaves are raw 32-byte values.
#[derive(Debug)]
pub struct SimpleMerkleTree {
    inner: MerkleTree<B256, SimpleLeafHash>,
    /// `Some` iff this tree was built with a non-default `node_hash`.
    custom_node_hash: Option<NodeHashFn>,
}

/// The JSON shape produced by [`SimpleMerkleTree::dump`].
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleDump {
    pub format: String,
    pub tree: Vec<String>,
    pub values: Vec<SimpleValueDump>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleValueDump {
    pub value: String,
    #[serde(rename = "treeIndex")]
    pub tree_index: usize,
}

impl SimpleMerkleTree {
    /// Builds a tree from raw 32-byte leaves, sorting by digest before
    /// placement (the default).
    pub fn of(values: &[B256]) -> Result<Self, MerkleError> {
        Self::build(values, true, None)
    }

    pub fn of_unsorted(values: &[B256]) -> Result<Self, MerkleError> {
        Self::build(values, false, None)
    }

    /// Builds a tree with a custom internal-node hash. The caller must
    /// supply the same function to [`Self::load`] later.
    pub fn of_with_node_hash(
        values: &[B256],
        sort_leaves: bool,
        node_hash: NodeHashFn,
    ) -> Result<Self, MerkleError> {
        Self::build(values, sort_leaves, Some(node_hash))
    }

    fn build(
        values: &[B256],
        sort_leaves: bool,
        node_hash: Option<NodeHashFn>,
    ) -> Result<Self, MerkleError> {
        let inner = MerkleTree::build(
            values.to_vec(),
            SimpleLeafHash,
            node_hash.unwrap_or(default_node_hash),
            sort_leaves,
        )?;
        Ok(Self {
            inner,
            custom_node_hash: node_hash,
        })
    }

    pub fn root(&self) -> B256 {
        self.inner.root()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&B256> {
        self.inner.at(index)
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &B256)> {
        self.inner.entries()
    }

    pub fn get_proof_by_index(&self, index: usize) -> Result<Vec<B256>, MerkleError> {
        self.inner.get_proof_by_index(index)
    }

    pub fn get_proof_by_value(&self, value: &B256) -> Result<Vec<B256>, MerkleError> {
        self.inner.get_proof_by_value(value)
    }

    pub fn get_multi_proof_by_indices(
        &self,
        indices: &[usize],
    ) -> Result<crate::engine::MultiProof, MerkleError> {
        self.inner.get_multi_proof_by_indices(indices)
    }

    pub fn get_multi_proof_by_values(
        &self,
        values: &[B256],
    ) -> Result<crate::engine::MultiProof, MerkleError> {
        self.inner.get_multi_proof_by_values(values)
    }

    pub fn verify_proof_by_index(&self, index: usize, proof: &[B256]) -> bool {
        self.inner.verify_proof(LeafTarget::Index(index), proof)
    }

    pub fn verify_proof_by_value(&self, value: &B256, proof: &[B256]) -> bool {
        self.inner.verify_proof(LeafTarget::Value(value), proof)
    }

    pub fn verify_multi_proof(&self, mp: &crate::engine::MultiProof) -> Result<bool, MerkleError> {
        self.inner.verify_multi_proof(mp)
    }

    pub fn validate(&self) -> Result<(), MerkleError> {
        self.inner.validate()
    }

    pub fn render(&self) -> String {
        self.inner.render()
    }

    /// Pure predicate verifying a single-leaf proof against `root` using the
    /// default node hash. Never raises; a malformed proof fails to verify.
    pub fn verify_proof_static(root: B256, leaf: B256, proof: &[B256]) -> bool {
        MerkleTree::<B256, SimpleLeafHash>::verify(root, leaf, proof, default_node_hash)
    }

    /// As [`Self::verify_proof_static`], but against a custom node hash.
    pub fn verify_proof_static_with_node_hash(
        root: B256,
        leaf: B256,
        proof: &[B256],
        node_hash: NodeHashFn,
    ) -> bool {
        MerkleTree::<B256, SimpleLeafHash>::verify(root, leaf, proof, node_hash)
    }

    /// Serializes this tree into the documented `simple-v1` JSON shape.
    pub fn dump(&self) -> Result<SimpleDump, MerkleError> {
        let tree = self
            .inner
            .raw_tree()
            .iter()
            .map(|n| format!("{n:#x}"))
            .collect();

        let values = self
            .inner
            .raw_values()
            .iter()
            .map(|iv| SimpleValueDump {
                value: format!("{:#x}", iv.value),
                tree_index: iv.tree_index,
            })
            .collect();

        Ok(SimpleDump {
            format: FORMAT.to_string(),
            tree,
            values,
            hash: self.custom_node_hash.map(|_| "custom".to_string()),
        })
    }

    /// Convenience: dumps directly to the `simple-v1` JSON text.
    pub fn dump_json(&self) -> Result<String, MerkleError> {
        serde_json::to_string(&self.dump()?)
            .map_err(|e| MerkleError::invalid_argument(format!("failed to serialize dump: {e}")))
    }

    /// Convenience: loads from `simple-v1` JSON text.
    pub fn load_json(json: &str, node_hash: Option<NodeHashFn>) -> Result<Self, MerkleError> {
        let dump: SimpleDump = serde_json::from_str(json)
            .map_err(|e| MerkleError::invalid_argument(format!("failed to parse dump: {e}")))?;
        Self::load(dump, node_hash)
    }

    /// Reconstructs a tree from a dump, re-validating before returning.
    ///
    /// `node_hash` must be `Some` iff the dump advertises `hash: "custom"` —
    /// both present or both absent, otherwise `InvalidArgument`.
    pub fn load(dump: SimpleDump, node_hash: Option<NodeHashFn>) -> Result<Self, MerkleError> {
        if dump.format != FORMAT {
            return Err(MerkleError::invalid_argument(format!(
                "Unknown format {}",
                dump.format
            )));
        }

        match (&dump.hash, &node_hash) {
            (Some(tag), None) if tag == "custom" => {
                return Err(MerkleError::invalid_argument(
                    "dump advertises a custom node_hash but none was provided",
                ));
            }
            (None, Some(_)) => {
                return Err(MerkleError::invalid_argument(
                    "a custom node_hash was provided but the dump does not advertise one",
                ));
            }
            _ => {}
        }

        let tree: Vec<B256> = dump
            .tree
            .iter()
            .map(|s| {
                s.parse::<B256>()
                    .map_err(|e| MerkleError::invalid_argument(format!("bad digest {s:?}: {e}")))
            })
            .collect::<Result<_, _>>()?;

        let values = dump
            .values
            .into_iter()
            .map(|v| {
                let value = v
                    .value
                    .parse::<B256>()
                    .map_err(|e| MerkleError::invalid_argument(format!("bad value {:?}: {e}", v.value)))?;
                Ok(IndexedValue {
                    value,
                    tree_index: v.tree_index,
                })
            })
            .collect::<Result<Vec<_>, MerkleError>>()?;

        let inner = MerkleTree::from_parts(
            tree,
            values,
            SimpleLeafHash,
            node_hash.unwrap_or(default_node_hash),
        )?;

        Ok(Self {
            inner,
            custom_node_hash: node_hash,
        })
    }
}
