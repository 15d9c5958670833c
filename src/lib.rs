//! Merkle trees over a fixed 32-byte digest domain, built so that proofs
//! produced off-line verify bit-identically against the `MerkleProof`
//! verifier commonly deployed in Ethereum smart contracts.
//!
//! Two variants share one engine ([`engine`], driven through [`tree`]):
//!
//! - [`standard_binary_tree::StandardMerkleTree`] hashes each leaf as the
//!   double-Keccak of an ABI-encoded tuple.
//! - [`simple_binary_tree::SimpleMerkleTree`] takes caller-supplied 32-byte
//!   leaves directly, with an optional custom internal-node hash.
//!
//! ```rust
//! use alloy_merkle_tree::simple_binary_tree::SimpleMerkleTree;
//! use alloy_primitives::keccak256;
//!
//! let values = vec![keccak256("a"), keccak256("b"), keccak256("c")];
//! let tree = SimpleMerkleTree::of(&values).unwrap();
//! let proof = tree.get_proof_by_index(0).unwrap();
//! assert!(tree.verify_proof_by_index(0, &proof));
//! ```

pub mod engine;
pub mod error;
pub mod hash;
pub mod simple_binary_tree;
pub mod standard_binary_tree;
pub mod tree;

pub use error::MerkleError;
