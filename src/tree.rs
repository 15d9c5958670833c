//! The generic tree facade: associates a hashed [`engine`] tree with the
//! original values it was built from.

use hashbrown::HashMap;

use alloy_primitives::B256;

use crate::engine::{self, MultiProof};
use crate::error::MerkleError;
use crate::hash::{LeafHash, NodeHashFn};

/// One original input value together with its position in the flat tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedValue<V> {
    pub value: V,
    pub tree_index: usize,
}

/// Either a leaf's tree index or a reference to its original value — the
/// tagged union the public `get_proof`/`get_multi_proof` overloads resolve
/// through.
pub enum LeafTarget<'a, V> {
    Index(usize),
    Value(&'a V),
}

impl<'a, V> From<usize> for LeafTarget<'a, V> {
    fn from(index: usize) -> Self {
        LeafTarget::Index(index)
    }
}

impl<'a, V> From<&'a V> for LeafTarget<'a, V> {
    fn from(value: &'a V) -> Self {
        LeafTarget::Value(value)
    }
}

/// A hashed Merkle tree paired with the original values it was built from.
///
/// `V` is the caller's leaf representation (an ABI tuple for the standard
/// variant, a `B256` for the simple variant) and `H` supplies `leaf_hash`.
/// The tree is immutable once built: nothing here takes `&mut self` after
/// construction.
#[derive(Debug)]
pub struct MerkleTree<V, H> {
    tree: Vec<B256>,
    values: Vec<IndexedValue<V>>,
    hash_lookup: HashMap<B256, usize>,
    leaf_hasher: H,
    node_hash: NodeHashFn,
}

impl<V, H> MerkleTree<V, H>
where
    H: LeafHash<V>,
{
    /// Builds a tree from `values`, optionally sorting leaves by digest
    /// before placement (the default, and the only order an on-chain
    /// verifier rebuilding a multiproof can rely on).
    pub fn build(
        values: Vec<V>,
        leaf_hasher: H,
        node_hash: NodeHashFn,
        sort_leaves: bool,
    ) -> Result<Self, MerkleError> {
        if values.is_empty() {
            return Err(MerkleError::invalid_argument(
                "cannot build a Merkle tree with no leaves",
            ));
        }

        let mut hashed: Vec<(usize, B256)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| leaf_hasher.leaf_hash(v).map(|h| (i, h)))
            .collect::<Result<_, _>>()?;

        if sort_leaves {
            hashed.sort_unstable_by_key(|(_, h)| *h);
        }

        let digests: Vec<B256> = hashed.iter().map(|(_, h)| *h).collect();
        let tree = engine::make_merkle_tree(&digests, node_hash)?;
        let size = tree.len();

        let mut tree_index_of_input = vec![0usize; values.len()];
        let mut hash_lookup = HashMap::with_capacity(values.len());
        for (placed_at, &(original_index, digest)) in hashed.iter().enumerate() {
            let tree_index = size - 1 - placed_at;
            tree_index_of_input[original_index] = tree_index;
            hash_lookup.insert(digest, original_index);
        }

        let indexed_values = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| IndexedValue {
                value,
                tree_index: tree_index_of_input[i],
            })
            .collect();

        Ok(Self {
            tree,
            values: indexed_values,
            hash_lookup,
            leaf_hasher,
            node_hash,
        })
    }

    /// Reconstructs a tree from its raw parts (used by `load`), re-validating
    /// before returning.
    pub fn from_parts(
        tree: Vec<B256>,
        values: Vec<IndexedValue<V>>,
        leaf_hasher: H,
        node_hash: NodeHashFn,
    ) -> Result<Self, MerkleError> {
        let mut hash_lookup = HashMap::with_capacity(values.len());
        for (i, iv) in values.iter().enumerate() {
            let digest = tree
                .get(iv.tree_index)
                .ok_or_else(|| MerkleError::invalid_argument("tree_index out of bounds"))?;
            hash_lookup.insert(*digest, i);
        }

        let built = Self {
            tree,
            values,
            hash_lookup,
            leaf_hasher,
            node_hash,
        };
        built.validate()?;
        Ok(built)
    }

    pub fn root(&self) -> B256 {
        self.tree[0]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&V> {
        self.values.get(index).map(|iv| &iv.value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, &V)> {
        self.values.iter().enumerate().map(|(i, iv)| (i, &iv.value))
    }

    pub(crate) fn raw_tree(&self) -> &[B256] {
        &self.tree
    }

    pub(crate) fn node_hash_fn(&self) -> NodeHashFn {
        self.node_hash
    }

    pub(crate) fn raw_values(&self) -> &[IndexedValue<V>] {
        &self.values
    }

    /// Looks up a value's position in `values` by its leaf digest.
    pub fn leaf_lookup(&self, value: &V) -> Result<usize, MerkleError> {
        let digest = self.leaf_hasher.leaf_hash(value)?;
        self.hash_lookup
            .get(&digest)
            .copied()
            .ok_or_else(|| MerkleError::invalid_argument("Leaf is not in tree"))
    }

    fn resolve_tree_index(&self, target: LeafTarget<'_, V>) -> Result<usize, MerkleError> {
        match target {
            LeafTarget::Index(i) => self
                .values
                .get(i)
                .map(|iv| iv.tree_index)
                .ok_or_else(|| MerkleError::invalid_argument("index out of bounds")),
            LeafTarget::Value(v) => {
                let i = self.leaf_lookup(v)?;
                Ok(self.values[i].tree_index)
            }
        }
    }

    /// Generates a single-leaf proof, resolving the target by value-sequence
    /// index or by value.
    pub fn get_proof<'a>(
        &self,
        target: impl Into<LeafTarget<'a, V>>,
    ) -> Result<Vec<B256>, MerkleError>
    where
        V: 'a,
    {
        let tree_index = self.resolve_tree_index(target.into())?;
        let proof = engine::get_proof(&self.tree, tree_index)?;

        let implied = engine::process_proof(self.tree[tree_index], &proof, self.node_hash);
        if implied != self.root() {
            return Err(MerkleError::invariant(
                "generated proof does not verify against the tree root",
            ));
        }

        Ok(proof)
    }

    pub fn get_proof_by_index(&self, index: usize) -> Result<Vec<B256>, MerkleError> {
        self.get_proof(LeafTarget::Index(index))
    }

    pub fn get_proof_by_value(&self, value: &V) -> Result<Vec<B256>, MerkleError> {
        self.get_proof(LeafTarget::Value(value))
    }

    /// Generates a multiproof for a set of value-sequence indices.
    pub fn get_multi_proof_by_indices(&self, indices: &[usize]) -> Result<MultiProof, MerkleError> {
        let tree_indices: Vec<usize> = indices
            .iter()
            .map(|&i| {
                self.values
                    .get(i)
                    .map(|iv| iv.tree_index)
                    .ok_or_else(|| MerkleError::invalid_argument("index out of bounds"))
            })
            .collect::<Result<_, _>>()?;

        let mp = engine::get_multi_proof(&self.tree, &tree_indices)?;

        let implied = engine::process_multi_proof(&mp, self.node_hash)?;
        if implied != self.root() {
            return Err(MerkleError::invariant(
                "generated multiproof does not verify against the tree root",
            ));
        }

        Ok(mp)
    }

    /// Generates a multiproof for a set of original values.
    pub fn get_multi_proof_by_values(&self, values: &[V]) -> Result<MultiProof, MerkleError> {
        let indices: Vec<usize> = values
            .iter()
            .map(|v| self.leaf_lookup(v))
            .collect::<Result<_, _>>()?;
        self.get_multi_proof_by_indices(&indices)
    }

    /// Verifies a single-leaf proof against this tree's root.
    pub fn verify_proof<'a>(&self, target: impl Into<LeafTarget<'a, V>>, proof: &[B256]) -> bool
    where
        V: 'a,
    {
        let leaf = match target.into() {
            LeafTarget::Index(i) => match self.values.get(i) {
                Some(iv) => self.tree[iv.tree_index],
                None => return false,
            },
            LeafTarget::Value(v) => match self.leaf_hasher.leaf_hash(v) {
                Ok(h) => h,
                Err(_) => return false,
            },
        };
        Self::verify(self.root(), leaf, proof, self.node_hash)
    }

    pub fn verify_multi_proof(&self, mp: &MultiProof) -> Result<bool, MerkleError> {
        Self::verify_multi_proof_static(self.root(), mp, self.node_hash)
    }

    /// Pure predicate: a proof is valid for `(root, leaf)` iff folding it
    /// yields `root`. Never raises — a malformed proof simply fails to
    /// verify.
    pub fn verify(root: B256, leaf: B256, proof: &[B256], node_hash: NodeHashFn) -> bool {
        engine::process_proof(leaf, proof, node_hash) == root
    }

    /// Static multiproof verification. Structural shape mismatches still
    /// raise `InvalidArgument`/`Invariant` as documented on
    /// [`engine::process_multi_proof`].
    pub fn verify_multi_proof_static(
        root: B256,
        mp: &MultiProof,
        node_hash: NodeHashFn,
    ) -> Result<bool, MerkleError> {
        Ok(engine::process_multi_proof(mp, node_hash)? == root)
    }

    /// Re-checks every stored `(value, tree_index)` against `leaf_hash`, and
    /// the whole tree against [`engine::is_valid_merkle_tree`].
    pub fn validate(&self) -> Result<(), MerkleError> {
        if !engine::is_valid_merkle_tree(&self.tree, self.node_hash) {
            return Err(MerkleError::invariant("Merkle tree is invalid"));
        }

        for iv in &self.values {
            let expected = self.leaf_hasher.leaf_hash(&iv.value)?;
            let actual = self
                .tree
                .get(iv.tree_index)
                .ok_or_else(|| MerkleError::invariant("tree_index out of bounds"))?;
            if *actual != expected {
                return Err(MerkleError::invariant(
                    "stored value does not hash to its recorded tree position",
                ));
            }
        }

        Ok(())
    }

    pub fn render(&self) -> String {
        engine::render_tree(&self.tree)
    }
}
