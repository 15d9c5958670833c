//! This module contains the [StandardMerkleTree], a Merkle tree whose leaves
//! are the double-Keccak hash of an ABI-encoded tuple, laid out and proven so
//! that proofs verify against the `MerkleProof` library commonly deployed in
//! Ethereum smart contracts.
//!
//! # Examples
//!
//! ```rust
//! use alloy_merkle_tree::standard_binary_tree::StandardMerkleTree;
//! use alloy_dyn_abi::DynSolValue;
//!
//! let encoding = vec!["string".to_string()];
//! let values: Vec<Vec<DynSolValue>> = (0..1000)
//!     .map(|i| vec![DynSolValue::String(i.to_string())])
//!     .collect();
//! let tree = StandardMerkleTree::of(&values, &encoding).unwrap();
//!
//! for value in values.iter() {
//!     let proof = tree.get_proof_by_value(value).unwrap();
//!     assert!(tree.verify_proof_by_value(value, &proof));
//! }
//! ```

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{hex, keccak256, Address, B256, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::MerkleError;
use crate::hash::{default_node_hash, LeafHash};
use crate::tree::{IndexedValue, LeafTarget, MerkleTree};

const FORMAT: &str = "standard-v1";

/// Hashes a field tuple against a fixed, parsed ABI type list.
#[derive(Debug, Clone)]
pub struct StandardLeafHash {
    types: Vec<DynSolType>,
}

impl StandardLeafHash {
    fn new(leaf_encoding: &[String]) -> Result<Self, MerkleError> {
        let types = leaf_encoding
            .iter()
            .map(|t| {
                DynSolType::parse(t)
                    .map_err(|e| MerkleError::invalid_argument(format!("bad leaf encoding type {t:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if types.is_empty() {
            return Err(MerkleError::invalid_argument(
                "leaf_encoding must name at least one ABI type",
            ));
        }
        Ok(Self { types })
    }
}

impl LeafHash<Vec<DynSolValue>> for StandardLeafHash {
    fn leaf_hash(&self, value: &Vec<DynSolValue>) -> Result<B256, MerkleError> {
        if value.len() != self.types.len() {
            return Err(MerkleError::invalid_argument(format!(
                "expected {} fields, got {}",
                self.types.len(),
                value.len()
            )));
        }
        for (field, ty) in value.iter().zip(&self.types) {
            if !ty.matches(field) {
                return Err(MerkleError::invalid_argument(format!(
                    "value {field:?} does not match declared type {ty:?}"
                )));
            }
        }

        let tuple = DynSolValue::Tuple(value.clone());
        let encoded = tuple.abi_encode_params();
        Ok(keccak256(keccak256(encoded)))
    }
}

/// A Merkle tree whose leaves are ABI-encoded tuples, keccak-hashed twice.
#[derive(Debug)]
pub struct StandardMerkleTree {
    inner: MerkleTree<Vec<DynSolValue>, StandardLeafHash>,
    leaf_encoding: Vec<String>,
}

/// The JSON shape produced by [`StandardMerkleTree::dump`].
#[derive(Debug, Serialize, Deserialize)]
pub struct StandardDump {
    pub format: String,
    pub tree: Vec<String>,
    pub values: Vec<StandardValueDump>,
    #[serde(rename = "leafEncoding")]
    pub leaf_encoding: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StandardValueDump {
    pub value: Vec<String>,
    #[serde(rename = "treeIndex")]
    pub tree_index: usize,
}

impl StandardMerkleTree {
    /// Builds a tree from tuples of ABI values, sorting leaves by digest
    /// before placement (use [`Self::of_unsorted`] to preserve input order).
    pub fn of(
        values: &[Vec<DynSolValue>],
        leaf_encoding: &[String],
    ) -> Result<Self, MerkleError> {
        Self::build(values, leaf_encoding, true)
    }

    pub fn of_unsorted(
        values: &[Vec<DynSolValue>],
        leaf_encoding: &[String],
    ) -> Result<Self, MerkleError> {
        Self::build(values, leaf_encoding, false)
    }

    fn build(
        values: &[Vec<DynSolValue>],
        leaf_encoding: &[String],
        sort_leaves: bool,
    ) -> Result<Self, MerkleError> {
        let hasher = StandardLeafHash::new(leaf_encoding)?;
        let inner = MerkleTree::build(values.to_vec(), hasher, default_node_hash, sort_leaves)?;
        Ok(Self {
            inner,
            leaf_encoding: leaf_encoding.to_vec(),
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

    pub fn at(&self, index: usize) -> Option<&Vec<DynSolValue>> {
        self.inner.at(index)
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &Vec<DynSolValue>)> {
        self.inner.entries()
    }

    pub fn get_proof_by_index(&self, index: usize) -> Result<Vec<B256>, MerkleError> {
        self.inner.get_proof_by_index(index)
    }

    pub fn get_proof_by_value(&self, value: &Vec<DynSolValue>) -> Result<Vec<B256>, MerkleError> {
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
        values: &[Vec<DynSolValue>],
    ) -> Result<crate::engine::MultiProof, MerkleError> {
        self.inner.get_multi_proof_by_values(values)
    }

    pub fn verify_proof_by_index(&self, index: usize, proof: &[B256]) -> bool {
        self.inner.verify_proof(LeafTarget::Index(index), proof)
    }

    pub fn verify_proof_by_value(&self, value: &Vec<DynSolValue>, proof: &[B256]) -> bool {
        self.inner.verify_proof(LeafTarget::Value(value), proof)
    }

    pub fn verify_multi_proof(
        &self,
        mp: &crate::engine::MultiProof,
    ) -> Result<bool, MerkleError> {
        self.inner.verify_multi_proof(mp)
    }

    pub fn validate(&self) -> Result<(), MerkleError> {
        self.inner.validate()
    }

    pub fn render(&self) -> String {
        self.inner.render()
    }

    pub fn leaf_encoding(&self) -> &[String] {
        &self.leaf_encoding
    }

    /// Serializes this tree into the documented `standard-v1` JSON shape.
    pub fn dump(&self) -> Result<StandardDump, MerkleError> {
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
            .map(|iv| {
                let value = iv
                    .value
                    .iter()
                    .map(dyn_sol_value_to_string)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(StandardValueDump {
                    value,
                    tree_index: iv.tree_index,
                })
            })
            .collect::<Result<Vec<_>, MerkleError>>()?;

        Ok(StandardDump {
            format: FORMAT.to_string(),
            tree,
            values,
            leaf_encoding: self.leaf_encoding.clone(),
        })
    }

    /// Convenience: dumps directly to the `standard-v1` JSON text.
    pub fn dump_json(&self) -> Result<String, MerkleError> {
        serde_json::to_string(&self.dump()?)
            .map_err(|e| MerkleError::invalid_argument(format!("failed to serialize dump: {e}")))
    }

    /// Convenience: loads from `standard-v1` JSON text.
    pub fn load_json(json: &str) -> Result<Self, MerkleError> {
        let dump: StandardDump = serde_json::from_str(json)
            .map_err(|e| MerkleError::invalid_argument(format!("failed to parse dump: {e}")))?;
        Self::load(dump)
    }

    /// Reconstructs a tree from a dump, re-validating before returning.
    pub fn load(dump: StandardDump) -> Result<Self, MerkleError> {
        if dump.format != FORMAT {
            return Err(MerkleError::invalid_argument(format!(
                "Unknown format {}",
                dump.format
            )));
        }

        let hasher = StandardLeafHash::new(&dump.leaf_encoding)?;

        let tree: Vec<B256> = dump
            .tree
            .iter()
            .map(|s| parse_digest(s))
            .collect::<Result<_, _>>()?;

        let values = dump
            .values
            .into_iter()
            .map(|v| {
                let value = v
                    .value
                    .iter()
                    .zip(&hasher.types)
                    .map(|(s, ty)| string_to_dyn_sol_value(ty, s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(IndexedValue {
                    value,
                    tree_index: v.tree_index,
                })
            })
            .collect::<Result<Vec<_>, MerkleError>>()?;

        let leaf_encoding = dump.leaf_encoding.clone();
        let inner = MerkleTree::from_parts(tree, values, hasher, default_node_hash)?;
        Ok(Self {
            inner,
            leaf_encoding,
        })
    }
}

fn parse_digest(s: &str) -> Result<B256, MerkleError> {
    s.parse::<B256>()
        .map_err(|e| MerkleError::invalid_argument(format!("bad digest {s:?}: {e}")))
}

/// Renders a supported [`DynSolValue`] scalar to its canonical string form
/// for JSON dumping. Only the scalar types a `leaf_encoding` string can name
/// without nesting are supported; nested arrays/tuples are out of scope.
fn dyn_sol_value_to_string(value: &DynSolValue) -> Result<String, MerkleError> {
    match value {
        DynSolValue::Bool(b) => Ok(b.to_string()),
        DynSolValue::Uint(u, _) => Ok(u.to_string()),
        DynSolValue::Int(i, _) => Ok(i.to_string()),
        DynSolValue::Address(a) => Ok(a.to_string()),
        DynSolValue::FixedBytes(word, size) => Ok(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Bytes(b) => Ok(hex::encode_prefixed(b)),
        DynSolValue::String(s) => Ok(s.clone()),
        other => Err(MerkleError::invalid_argument(format!(
            "unsupported leaf value type for dump: {other:?}"
        ))),
    }
}

fn string_to_dyn_sol_value(ty: &DynSolType, s: &str) -> Result<DynSolValue, MerkleError> {
    let bad = |e: String| MerkleError::invalid_argument(format!("bad value {s:?} for {ty:?}: {e}"));
    match ty {
        DynSolType::Bool => s
            .parse::<bool>()
            .map(DynSolValue::Bool)
            .map_err(|e| bad(e.to_string())),
        DynSolType::Uint(bits) => U256::from_str_radix(s, 10)
            .map(|u| DynSolValue::Uint(u, *bits))
            .map_err(|e| bad(e.to_string())),
        DynSolType::Int(bits) => s
            .parse::<I256>()
            .map(|i| DynSolValue::Int(i, *bits))
            .map_err(|e| bad(e.to_string())),
        DynSolType::Address => s
            .parse::<Address>()
            .map(DynSolValue::Address)
            .map_err(|e| bad(e.to_string())),
        DynSolType::FixedBytes(size) => {
            let bytes = hex::decode(s).map_err(|e| bad(e.to_string()))?;
            if bytes.len() != *size {
                return Err(bad(format!("expected {size} bytes, got {}", bytes.len())));
            }
            let mut word = [0u8; 32];
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(B256::from(word), *size))
        }
        DynSolType::Bytes => hex::decode(s)
            .map(DynSolValue::Bytes)
            .map_err(|e| bad(e.to_string())),
        DynSolType::String => Ok(DynSolValue::String(s.to_string())),
        other => Err(MerkleError::invalid_argument(format!(
            "unsupported leaf encoding type for load: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn string_values(n: usize) -> Vec<Vec<DynSolValue>> {
        (0..n)
            .map(|i| vec![DynSolValue::String(i.to_string())])
            .collect()
    }

    #[test]
    fn test_tree_string_type() {
        let encoding = vec!["string".to_string()];
        let values = string_values(1000);
        let tree = StandardMerkleTree::of(&values, &encoding).unwrap();

        for value in values.iter() {
            let proof = tree.get_proof_by_value(value).unwrap();
            assert!(tree.verify_proof_by_value(value, &proof));
        }
    }

    #[test]
    fn test_tree_bytes32_type() {
        let encoding = vec!["bytes32".to_string()];
        let leaf = DynSolValue::FixedBytes(
            "0x46296bc9cb11408bfa46c5c31a542f12242db2412ee2217b4e8add2bc1927d0"
                .parse()
                .unwrap(),
            32,
        );
        let values = vec![vec![leaf]];
        let tree = StandardMerkleTree::of(&values, &encoding).unwrap();

        for value in values.iter() {
            let proof = tree.get_proof_by_value(value).unwrap();
            assert!(tree.verify_proof_by_value(value, &proof));
        }
    }

    #[test]
    fn scenario_s1_three_string_leaves() {
        let encoding = vec!["string".to_string()];
        let values = vec![
            vec![DynSolValue::String("a".to_string())],
            vec![DynSolValue::String("b".to_string())],
            vec![DynSolValue::String("c".to_string())],
        ];
        let tree = StandardMerkleTree::of(&values, &encoding).unwrap();
        assert_eq!(
            format!("{:#x}", tree.root()),
            "0xf2129b5a697531ef818f644564a6552b35c549722385bc52aa7fe46c0b5f46b1"
        );

        let tree_nodes = tree.dump().unwrap().tree;
        assert_eq!(tree_nodes.len(), 5);
        assert!(tree_nodes[0].starts_with("0xf2129b"));
        assert!(tree_nodes[1].starts_with("0xfa914d"));
        assert!(tree_nodes[2].starts_with("0x9cf5a6"));
        assert!(tree_nodes[3].starts_with("0x9c15a6"));
    }

    #[test]
    fn dump_load_round_trip() {
        let encoding = vec!["string".to_string()];
        let values = string_values(10);
        let tree = StandardMerkleTree::of(&values, &encoding).unwrap();

        let dump = tree.dump().unwrap();
        let loaded = StandardMerkleTree::load(dump).unwrap();
        assert_eq!(loaded.root(), tree.root());

        let dump_again = loaded.dump().unwrap();
        let dump_first = tree.dump().unwrap();
        assert_eq!(dump_again.tree, dump_first.tree);
    }

    #[test]
    fn loading_wrong_format_fails() {
        let dump = StandardDump {
            format: "simple-v1".to_string(),
            tree: vec![],
            values: vec![],
            leaf_encoding: vec!["string".to_string()],
        };
        assert!(matches!(
            StandardMerkleTree::load(dump),
            Err(MerkleError::InvalidArgument(_))
        ));
    }
}
