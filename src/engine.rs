//! The Merkle engine: flat-array tree layout, single-leaf proofs, multiproofs,
//! the tree-shape validator, and the ASCII renderer. Every function here
//! operates on `&[B256]` and a [`NodeHashFn`] — it knows nothing about the
//! original values a tree was built from.

use std::collections::VecDeque;
use std::fmt::Write as _;

use alloy_primitives::B256;

use crate::error::MerkleError;
use crate::hash::NodeHashFn;

/// A compact witness proving a set of leaves simultaneously. See the module
/// docs for the encoding this mirrors (`MerkleProof.multiProofVerify` on
/// Ethereum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiProof {
    /// The leaves being proven, in the order `process_multi_proof` consumes them.
    pub leaves: Vec<B256>,
    /// Sibling digests not derivable from `leaves`.
    pub proof: Vec<B256>,
    /// `true` to pair the next item off the leaves queue, `false` for the proof queue.
    pub proof_flags: Vec<bool>,
}

#[inline]
fn left_child_index(index: usize) -> usize {
    2 * index + 1
}

#[inline]
fn right_child_index(index: usize) -> usize {
    2 * index + 2
}

#[inline]
fn parent_index(index: usize) -> usize {
    (index - 1) / 2
}

/// Sibling of `index`. The root (index 0) has no sibling.
fn sibling_index(index: usize) -> Result<usize, MerkleError> {
    if index == 0 {
        return Err(MerkleError::invalid_argument("root has no sibling"));
    }
    if index % 2 == 0 {
        Ok(index - 1)
    } else {
        Ok(index + 1)
    }
}

#[inline]
fn is_tree_node(tree: &[B256], index: usize) -> bool {
    index < tree.len()
}

#[inline]
fn is_internal_node(tree: &[B256], index: usize) -> bool {
    is_tree_node(tree, left_child_index(index))
}

#[inline]
fn is_leaf_node(tree: &[B256], index: usize) -> bool {
    is_tree_node(tree, index) && !is_internal_node(tree, index)
}

fn check_leaf_node(tree: &[B256], index: usize) -> Result<(), MerkleError> {
    if is_leaf_node(tree, index) {
        Ok(())
    } else {
        Err(MerkleError::invalid_argument(format!(
            "index {index} is not a leaf"
        )))
    }
}

/// Builds the flat complete-binary-tree array from leaf digests, already in
/// the order they should be placed (callers that sort leaves must sort
/// first). Leaves land at the tail of the array in reverse input order so
/// that the k-th input leaf ends up at `tree.len() - 1 - k`.
pub fn make_merkle_tree(leaves: &[B256], node_hash: NodeHashFn) -> Result<Vec<B256>, MerkleError> {
    if leaves.is_empty() {
        return Err(MerkleError::invalid_argument(
            "cannot build a Merkle tree with no leaves",
        ));
    }

    let tree_len = 2 * leaves.len() - 1;
    let mut tree = vec![B256::ZERO; tree_len];

    for (i, leaf) in leaves.iter().enumerate() {
        tree[tree_len - 1 - i] = *leaf;
    }

    for i in (0..tree_len - leaves.len()).rev() {
        let left = tree[left_child_index(i)];
        let right = tree[right_child_index(i)];
        tree[i] = node_hash(left, right);
    }

    Ok(tree)
}

/// The sibling digests encountered walking from leaf `index` up to (but not
/// including) the root.
pub fn get_proof(tree: &[B256], index: usize) -> Result<Vec<B256>, MerkleError> {
    check_leaf_node(tree, index)?;

    let mut proof = Vec::new();
    let mut current = index;
    while current != 0 {
        let sibling = sibling_index(current)?;
        proof.push(tree[sibling]);
        current = parent_index(current);
    }
    Ok(proof)
}

/// Folds a single-leaf proof left-to-right into the implied root.
pub fn process_proof(leaf: B256, proof: &[B256], node_hash: NodeHashFn) -> B256 {
    proof.iter().fold(leaf, |acc, sibling| node_hash(*sibling, acc))
}

/// Produces a [`MultiProof`] for the given (leaf) tree indices, all of which
/// must be distinct leaves.
pub fn get_multi_proof(tree: &[B256], indices: &[usize]) -> Result<MultiProof, MerkleError> {
    let mut seen = hashbrown::HashSet::with_capacity(indices.len());
    for &index in indices {
        check_leaf_node(tree, index)?;
        if !seen.insert(index) {
            return Err(MerkleError::invalid_argument(format!(
                "cannot prove duplicated index {index}"
            )));
        }
    }

    if indices.is_empty() {
        return Ok(MultiProof {
            leaves: Vec::new(),
            proof: vec![tree[0]],
            proof_flags: Vec::new(),
        });
    }

    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let leaves = sorted.iter().map(|&i| tree[i]).collect();

    let mut queue: VecDeque<usize> = sorted.into();
    let mut proof = Vec::new();
    let mut proof_flags = Vec::new();

    while let Some(j) = queue.pop_front() {
        if j == 0 {
            break;
        }

        let s = sibling_index(j)?;
        let p = parent_index(j);

        if queue.front() == Some(&s) {
            proof_flags.push(true);
            queue.pop_front();
        } else {
            proof.push(tree[s]);
            proof_flags.push(false);
        }
        queue.push_back(p);
    }

    Ok(MultiProof {
        leaves,
        proof,
        proof_flags,
    })
}

/// Verifies a multiproof against the tree's own `node_hash` and returns the
/// digest it implies for the root. Structural shape mismatches are
/// `InvalidArgument`; a queue underflow or leftover digest after folding is
/// `Invariant` (both indicate a structurally inconsistent proof).
pub fn process_multi_proof(mp: &MultiProof, node_hash: NodeHashFn) -> Result<B256, MerkleError> {
    let false_count = mp.proof_flags.iter().filter(|&&f| !f).count();
    if mp.proof.len() < false_count {
        return Err(MerkleError::invalid_argument("Invalid multiproof format"));
    }
    if mp.leaves.len() + mp.proof.len() != mp.proof_flags.len() + 1 {
        return Err(MerkleError::invalid_argument(
            "Provided leaves and multiproof are not compatible",
        ));
    }

    let mut leaves: VecDeque<B256> = mp.leaves.iter().copied().collect();
    let mut proof: VecDeque<B256> = mp.proof.iter().copied().collect();

    for &flag in &mp.proof_flags {
        let a = leaves
            .pop_front()
            .ok_or_else(|| MerkleError::invariant("multiproof leaves queue underflowed"))?;
        let b = if flag {
            leaves
                .pop_front()
                .ok_or_else(|| MerkleError::invariant("multiproof leaves queue underflowed"))?
        } else {
            proof
                .pop_front()
                .ok_or_else(|| MerkleError::invariant("multiproof proof queue underflowed"))?
        };
        leaves.push_back(node_hash(a, b));
    }

    match (leaves.len(), proof.len()) {
        (1, 0) => Ok(leaves[0]),
        (0, 1) => Ok(proof[0]),
        _ => Err(MerkleError::invariant(
            "multiproof did not fold to a single root",
        )),
    }
}

/// `true` iff `tree` is a well-formed complete binary tree under `node_hash`:
/// non-empty, and every internal node equals the hash of its two children,
/// and no node has only one child.
pub fn is_valid_merkle_tree(tree: &[B256], node_hash: NodeHashFn) -> bool {
    if tree.is_empty() {
        return false;
    }

    for (i, &node) in tree.iter().enumerate() {
        let l = left_child_index(i);
        let r = right_child_index(i);

        if r < tree.len() {
            if node_hash(tree[l], tree[r]) != node {
                return false;
            }
        } else if l < tree.len() {
            // a node with a left child but no right child: not complete.
            return false;
        }
    }

    true
}

/// Renders `tree` as a multi-line, pre-order, left-first ASCII tree.
///
/// Each line has the form `<indent><branch>N) <hex>`; the root carries no
/// branch. Deterministic so output is golden-testable.
pub fn render_tree(tree: &[B256]) -> String {
    let mut out = String::new();
    if tree.is_empty() {
        return out;
    }
    render_node(tree, 0, String::new(), true, true, &mut out);
    out
}

fn render_node(
    tree: &[B256],
    index: usize,
    prefix: String,
    is_root: bool,
    is_last: bool,
    out: &mut String,
) {
    let branch = if is_root {
        ""
    } else if is_last {
        "└─ "
    } else {
        "├─ "
    };
    let _ = writeln!(out, "{prefix}{branch}{index}) {:#x}", tree[index]);

    let l = left_child_index(index);
    let r = right_child_index(index);
    if l >= tree.len() {
        return;
    }

    let child_prefix = if is_root {
        String::new()
    } else if is_last {
        format!("{prefix}   ")
    } else {
        format!("{prefix}│  ")
    };

    if r < tree.len() {
        render_node(tree, l, child_prefix.clone(), false, false, out);
        render_node(tree, r, child_prefix, false, true, out);
    } else {
        render_node(tree, l, child_prefix, false, true, out);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hash::default_node_hash;
    use alloy_primitives::keccak256;

    fn leaves(n: usize) -> Vec<B256> {
        (0..n).map(|i| keccak256([i as u8])).collect()
    }

    #[test]
    fn single_leaf_tree_is_its_own_root() {
        let ls = leaves(1);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0], ls[0]);
        assert!(get_proof(&tree, 0).unwrap().is_empty());
    }

    #[test]
    fn proof_round_trips_for_every_leaf() {
        let ls = leaves(7);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let size = tree.len();
        for k in 0..ls.len() {
            let index = size - 1 - k;
            let proof = get_proof(&tree, index).unwrap();
            let root = process_proof(ls[k], &proof, default_node_hash);
            assert_eq!(root, tree[0]);
        }
    }

    #[test]
    fn empty_multiproof_returns_root_as_sole_proof_entry() {
        let ls = leaves(4);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let mp = get_multi_proof(&tree, &[]).unwrap();
        assert!(mp.leaves.is_empty());
        assert_eq!(mp.proof, vec![tree[0]]);
        assert!(mp.proof_flags.is_empty());
        assert_eq!(process_multi_proof(&mp, default_node_hash).unwrap(), tree[0]);
    }

    #[test]
    fn single_leaf_tree_multiproof_of_the_only_leaf() {
        let ls = leaves(1);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let mp = get_multi_proof(&tree, &[0]).unwrap();
        assert_eq!(mp.leaves, vec![tree[0]]);
        assert!(mp.proof.is_empty());
        assert!(mp.proof_flags.is_empty());
        assert_eq!(process_multi_proof(&mp, default_node_hash).unwrap(), tree[0]);
    }

    #[test]
    fn multiproof_round_trips_for_a_subset() {
        let ls = leaves(8);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let size = tree.len();
        let indices: Vec<usize> = (0..ls.len())
            .step_by(2)
            .map(|k| size - 1 - k)
            .collect();
        let mp = get_multi_proof(&tree, &indices).unwrap();
        assert_eq!(process_multi_proof(&mp, default_node_hash).unwrap(), tree[0]);
    }

    #[test]
    fn duplicated_index_is_rejected() {
        let ls = leaves(4);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let last = tree.len() - 1;
        assert!(get_multi_proof(&tree, &[last, last]).is_err());
    }

    #[test]
    fn non_leaf_index_is_rejected() {
        let ls = leaves(4);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        assert!(get_proof(&tree, 0).is_err());
        assert!(get_multi_proof(&tree, &[0]).is_err());
    }

    #[test]
    fn validator_detects_tampering() {
        let ls = leaves(4);
        let mut tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        assert!(is_valid_merkle_tree(&tree, default_node_hash));
        tree[0] = B256::ZERO;
        assert!(!is_valid_merkle_tree(&tree, default_node_hash));
    }

    #[test]
    fn render_has_no_branch_on_root() {
        let ls = leaves(2);
        let tree = make_merkle_tree(&ls, default_node_hash).unwrap();
        let rendered = render_tree(&tree);
        let first_line = rendered.lines().next().unwrap();
        assert!(first_line.starts_with("0)"));
    }
}
