//! Merkle tree over a block's transaction digests.
//!
//! Leaves are paired left-to-right and combined with `hash(left || right)`.
//! When a level has an odd number of nodes the last one is promoted to the
//! next level unchanged; it is never hashed with itself. Proofs record a
//! [`ProofStep::Carry`] for those levels.

use crate::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from tree construction, proof generation and proof decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot build a merkle tree without leaves")]
    EmptyTree,
    #[error("leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Sibling is the left operand: `hash(sibling || current)`.
    Left,
    /// Sibling is the right operand: `hash(current || sibling)`.
    Right,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One level of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStep {
    /// Combine with a sibling on the given side.
    Sibling { hash: Hash, position: Position },
    /// The node was promoted unpaired; the running hash is unchanged.
    Carry,
}

impl ProofStep {
    fn apply<H: Hasher>(&self, hasher: &H, current: Hash) -> Hash {
        match self {
            ProofStep::Sibling {
                hash,
                position: Position::Left,
            } => hasher.hash_pair(hash, &current),
            ProofStep::Sibling {
                hash,
                position: Position::Right,
            } => hasher.hash_pair(&current, hash),
            ProofStep::Carry => current,
        }
    }
}

/// An inclusion proof, ordered from the leaf level up to (not including) the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MerkleProof {
    pub steps: Vec<ProofStep>,
}

impl MerkleProof {
    /// Fold the leaf through every step and return the resulting root.
    pub fn compute_root<H: Hasher>(&self, hasher: &H, leaf: &Hash) -> Hash {
        self.steps
            .iter()
            .fold(*leaf, |current, step| step.apply(hasher, current))
    }

    /// Number of steps that actually carry a sibling hash.
    pub fn sibling_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ProofStep::Sibling { .. }))
            .count()
    }

    /// Convert to the string-tagged form used on the wire.
    pub fn encode(&self) -> Vec<EncodedProofStep> {
        self.steps.iter().map(EncodedProofStep::from).collect()
    }

    /// Parse the string-tagged wire form.
    pub fn decode(steps: &[EncodedProofStep]) -> Result<Self, MerkleError> {
        let steps = steps
            .iter()
            .map(ProofStep::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }
}

/// Wire form of a proof step: `{"sibling": "<hex>", "position": "left"}`.
///
/// Carry steps are encoded as `{"sibling": null, "position": "carry"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedProofStep {
    pub sibling: Option<String>,
    pub position: String,
}

const CARRY_TAG: &str = "carry";

impl From<&ProofStep> for EncodedProofStep {
    fn from(step: &ProofStep) -> Self {
        match step {
            ProofStep::Sibling { hash, position } => Self {
                sibling: Some(hash.to_hex()),
                position: position.as_str().to_string(),
            },
            ProofStep::Carry => Self {
                sibling: None,
                position: CARRY_TAG.to_string(),
            },
        }
    }
}

impl TryFrom<&EncodedProofStep> for ProofStep {
    type Error = MerkleError;

    fn try_from(step: &EncodedProofStep) -> Result<Self, Self::Error> {
        let position = match step.position.as_str() {
            "left" => Position::Left,
            "right" => Position::Right,
            CARRY_TAG => return Ok(ProofStep::Carry),
            other => {
                return Err(MerkleError::MalformedProof(format!(
                    "unknown position tag {:?}",
                    other
                )))
            }
        };
        let sibling = step.sibling.as_deref().ok_or_else(|| {
            MerkleError::MalformedProof(format!("{} step without a sibling", position))
        })?;
        let hash = Hash::from_hex(sibling).map_err(|e| {
            MerkleError::MalformedProof(format!("invalid sibling digest {:?}: {}", sibling, e))
        })?;
        Ok(ProofStep::Sibling { hash, position })
    }
}

/// A merkle tree for efficient proofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// All nodes in the tree, level by level (leaves first). Never empty.
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a merkle tree from a list of leaf hashes.
    pub fn build<H: Hasher>(hasher: &H, leaves: &[Hash]) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut levels = vec![leaves.to_vec()];
        let mut current = leaves.to_vec();

        while current.len() > 1 {
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|chunk| {
                    if chunk.len() == 2 {
                        hasher.hash_pair(&chunk[0], &chunk[1])
                    } else {
                        // Odd node: promoted unchanged
                        chunk[0]
                    }
                })
                .collect();
            levels.push(next.clone());
            current = next;
        }

        Ok(Self { levels })
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash::ZERO)
    }

    /// The leaf level, in insertion order.
    pub fn leaves(&self) -> &[Hash] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Number of levels including the leaves and the root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Position of the first leaf equal to `leaf`.
    pub fn position(&self, leaf: &Hash) -> Option<usize> {
        self.leaves().iter().position(|l| l == leaf)
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        let len = self.leaf_count();
        if index >= len {
            return Err(MerkleError::IndexOutOfRange { index, len });
        }

        let mut steps = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let step = if idx % 2 == 1 {
                ProofStep::Sibling {
                    hash: level[idx - 1],
                    position: Position::Left,
                }
            } else if idx + 1 < level.len() {
                ProofStep::Sibling {
                    hash: level[idx + 1],
                    position: Position::Right,
                }
            } else {
                ProofStep::Carry
            };
            steps.push(step);
            idx /= 2;
        }

        Ok(MerkleProof { steps })
    }

    /// Verify a proof for `leaf` against this tree's root.
    pub fn verify_proof<H: Hasher>(&self, hasher: &H, leaf: &Hash, proof: &MerkleProof) -> bool {
        verify(hasher, leaf, proof, &self.root())
    }
}

/// Compute the merkle root of a list of hashes.
pub fn merkle_root<H: Hasher>(hasher: &H, leaves: &[Hash]) -> Result<Hash, MerkleError> {
    Ok(MerkleTree::build(hasher, leaves)?.root())
}

/// Build the tree over `leaves` and return the proof for `index`.
pub fn merkle_proof<H: Hasher>(
    hasher: &H,
    leaves: &[Hash],
    index: usize,
) -> Result<MerkleProof, MerkleError> {
    MerkleTree::build(hasher, leaves)?.proof(index)
}

/// Verify a merkle proof against a claimed root.
pub fn verify<H: Hasher>(hasher: &H, leaf: &Hash, proof: &MerkleProof, root: &Hash) -> bool {
    proof.compute_root(hasher, leaf) == *root
}

/// Verify a proof in its wire form.
///
/// A proof that decodes but does not reach `root` yields `Ok(false)`; a
/// proof that cannot be decoded yields [`MerkleError::MalformedProof`].
pub fn verify_encoded<H: Hasher>(
    hasher: &H,
    leaf: &Hash,
    steps: &[EncodedProofStep],
    root: &Hash,
) -> Result<bool, MerkleError> {
    let proof = MerkleProof::decode(steps)?;
    Ok(verify(hasher, leaf, &proof, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash, Blake3, Sha256Hasher};
    use proptest::prelude::*;

    fn make_hashes(n: usize) -> Vec<Hash> {
        (0..n).map(|i| hash(&[i as u8])).collect()
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(merkle_root(&Blake3, &[]), Err(MerkleError::EmptyTree));
        assert_eq!(MerkleTree::build(&Blake3, &[]), Err(MerkleError::EmptyTree));
    }

    #[test]
    fn test_merkle_root_single() {
        let hashes = make_hashes(1);
        assert_eq!(merkle_root(&Blake3, &hashes).unwrap(), hashes[0]);

        let proof = merkle_proof(&Blake3, &hashes, 0).unwrap();
        assert!(proof.steps.is_empty());
        assert!(verify(&Blake3, &hashes[0], &proof, &hashes[0]));
    }

    #[test]
    fn test_merkle_root_two() {
        let hashes = make_hashes(2);
        let root = merkle_root(&Blake3, &hashes).unwrap();
        assert_eq!(root, Blake3.hash_pair(&hashes[0], &hashes[1]));
    }

    #[test]
    fn test_odd_leaf_is_promoted_not_duplicated() {
        let leaves = vec![hash(b"A"), hash(b"B"), hash(b"C")];
        let tree = MerkleTree::build(&Blake3, &leaves).unwrap();

        let ab = Blake3.hash_pair(&leaves[0], &leaves[1]);
        assert_eq!(tree.root(), Blake3.hash_pair(&ab, &leaves[2]));
        assert_eq!(tree.depth(), 3);

        let duplicated = Blake3.hash_pair(&ab, &Blake3.hash_pair(&leaves[2], &leaves[2]));
        assert_ne!(tree.root(), duplicated);
    }

    #[test]
    fn test_odd_node_promoted_across_levels() {
        let leaves: Vec<Hash> = (0u8..5).map(|i| hash(&[i])).collect();
        let tree = MerkleTree::build(&Blake3, &leaves).unwrap();

        let ab = Blake3.hash_pair(&leaves[0], &leaves[1]);
        let cd = Blake3.hash_pair(&leaves[2], &leaves[3]);
        let abcd = Blake3.hash_pair(&ab, &cd);
        assert_eq!(tree.root(), Blake3.hash_pair(&abcd, &leaves[4]));
        assert_eq!(tree.depth(), 4);

        let proof = tree.proof(4).unwrap();
        assert_eq!(proof.steps[..2], [ProofStep::Carry, ProofStep::Carry]);
        assert_eq!(proof.sibling_count(), 1);
    }

    #[test]
    fn test_proof_for_promoted_leaf() {
        let leaves = vec![hash(b"A"), hash(b"B"), hash(b"C")];
        let tree = MerkleTree::build(&Blake3, &leaves).unwrap();
        let proof = tree.proof(2).unwrap();

        let ab = Blake3.hash_pair(&leaves[0], &leaves[1]);
        assert_eq!(
            proof.steps,
            vec![
                ProofStep::Carry,
                ProofStep::Sibling {
                    hash: ab,
                    position: Position::Left
                },
            ]
        );
        assert_eq!(proof.sibling_count(), 1);
        assert!(tree.verify_proof(&Blake3, &leaves[2], &proof));
    }

    #[test]
    fn test_proof_positions_for_first_leaf() {
        let leaves = make_hashes(4);
        let proof = merkle_proof(&Blake3, &leaves, 0).unwrap();
        let cd = Blake3.hash_pair(&leaves[2], &leaves[3]);

        assert_eq!(
            proof.steps,
            vec![
                ProofStep::Sibling {
                    hash: leaves[1],
                    position: Position::Right
                },
                ProofStep::Sibling {
                    hash: cd,
                    position: Position::Right
                },
            ]
        );
    }

    #[test]
    fn test_merkle_root_deterministic() {
        let hashes = make_hashes(10);
        let r1 = merkle_root(&Blake3, &hashes).unwrap();
        let r2 = merkle_root(&Blake3, &hashes).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(
            merkle_proof(&Blake3, &hashes, 7).unwrap(),
            merkle_proof(&Blake3, &hashes, 7).unwrap()
        );
    }

    #[test]
    fn test_merkle_root_order_matters() {
        let hashes = make_hashes(4);
        let mut reversed = hashes.clone();
        reversed.reverse();

        let r1 = merkle_root(&Blake3, &hashes).unwrap();
        let r2 = merkle_root(&Blake3, &reversed).unwrap();
        assert_ne!(r1, r2);
    }

    #[test]
    fn test_merkle_root_depends_on_hasher() {
        let hashes = make_hashes(5);
        assert_ne!(
            merkle_root(&Blake3, &hashes).unwrap(),
            merkle_root(&Sha256Hasher, &hashes).unwrap()
        );
    }

    #[test]
    fn test_merkle_proof_valid_all_sizes() {
        for n in 1..=17 {
            let hashes = make_hashes(n);
            let tree = MerkleTree::build(&Blake3, &hashes).unwrap();
            for (i, leaf) in hashes.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(tree.verify_proof(&Blake3, leaf, &proof), "n={} i={}", n, i);
            }
        }
    }

    #[test]
    fn test_merkle_proof_invalid_index() {
        let hashes = make_hashes(4);
        let tree = MerkleTree::build(&Blake3, &hashes).unwrap();
        assert_eq!(
            tree.proof(10),
            Err(MerkleError::IndexOutOfRange { index: 10, len: 4 })
        );
    }

    #[test]
    fn test_merkle_proof_wrong_root() {
        let hashes = make_hashes(4);
        let tree = MerkleTree::build(&Blake3, &hashes).unwrap();
        let proof = tree.proof(0).unwrap();

        let wrong_root = hash(b"wrong");
        assert!(!verify(&Blake3, &hashes[0], &proof, &wrong_root));
        assert!(!verify(&Blake3, &hashes[1], &proof, &tree.root()));
    }

    #[test]
    fn test_position_lookup() {
        let hashes = make_hashes(6);
        let tree = MerkleTree::build(&Blake3, &hashes).unwrap();
        assert_eq!(tree.position(&hashes[4]), Some(4));
        assert_eq!(tree.position(&hash(b"missing")), None);
    }

    #[test]
    fn test_encoded_proof_verifies() {
        let hashes = make_hashes(5);
        let tree = MerkleTree::build(&Blake3, &hashes).unwrap();
        let encoded = tree.proof(4).unwrap().encode();

        assert_eq!(encoded[0].position, "carry");
        assert_eq!(encoded[0].sibling, None);
        assert_eq!(
            verify_encoded(&Blake3, &hashes[4], &encoded, &tree.root()),
            Ok(true)
        );

        let json = serde_json::to_string(&encoded).unwrap();
        let parsed: Vec<EncodedProofStep> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, encoded);
    }

    #[test]
    fn test_encoded_proof_unknown_tag_is_malformed() {
        let steps = vec![EncodedProofStep {
            sibling: Some(hash(b"x").to_hex()),
            position: "up".to_string(),
        }];
        let result = verify_encoded(&Blake3, &hash(b"leaf"), &steps, &Hash::ZERO);
        assert!(matches!(result, Err(MerkleError::MalformedProof(_))));
    }

    #[test]
    fn test_encoded_proof_missing_or_bad_sibling_is_malformed() {
        let missing = vec![EncodedProofStep {
            sibling: None,
            position: "left".to_string(),
        }];
        assert!(matches!(
            MerkleProof::decode(&missing),
            Err(MerkleError::MalformedProof(_))
        ));

        let bad = vec![EncodedProofStep {
            sibling: Some("not-hex".to_string()),
            position: "right".to_string(),
        }];
        assert!(matches!(
            MerkleProof::decode(&bad),
            Err(MerkleError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_encoded_proof_wrong_root_is_false_not_error() {
        let hashes = make_hashes(3);
        let encoded = merkle_proof(&Blake3, &hashes, 1).unwrap().encode();
        assert_eq!(
            verify_encoded(&Blake3, &hashes[1], &encoded, &hash(b"other")),
            Ok(false)
        );
    }

    proptest! {
        #[test]
        fn prop_proof_round_trip(
            seeds in prop::collection::vec(any::<[u8; 32]>(), 1..64),
            pick in any::<prop::sample::Index>(),
        ) {
            let leaves: Vec<Hash> = seeds.into_iter().map(Hash::from_bytes).collect();
            let index = pick.index(leaves.len());
            let root = merkle_root(&Blake3, &leaves).unwrap();
            let proof = merkle_proof(&Blake3, &leaves, index).unwrap();
            prop_assert!(verify(&Blake3, &leaves[index], &proof, &root));
        }
    }
}
