//! Inclusion and consistency proof verification (RFC 9162 §2.1.3, §2.1.4).
//!
//! Each verifier comes in two forms: a wire form that takes the encodings
//! used on the network (hex leaf hash, base64 path elements and roots), and
//! a typed form over [`Sha256Hash`] values.
//!
//! Malformed input is an `Err(ProofInputError)`. A well-formed proof that
//! does not reconstruct the expected root is `Ok(false)`.

use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::error::ProofInputError;
use crate::hasher::node_hash;

/// Evidence that a leaf sits at `leaf_index` in a tree of `tree_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub tree_size: u64,
    /// Hex-encoded leaf hash.
    pub leaf_hash: String,
    /// Base64-encoded sibling hashes, leaf to root.
    pub audit_path: Vec<String>,
}

impl InclusionProof {
    /// Build the wire form from typed values.
    pub fn new(leaf_index: u64, tree_size: u64, leaf_hash: &Sha256Hash, path: &[Sha256Hash]) -> Self {
        Self {
            leaf_index,
            tree_size,
            leaf_hash: leaf_hash.to_hex(),
            audit_path: path.iter().map(Sha256Hash::to_base64).collect(),
        }
    }

    /// Check the proof against a base64 root.
    pub fn verify(&self, expected_root: &str) -> Result<bool, ProofInputError> {
        verify_inclusion(
            self.leaf_index,
            self.tree_size,
            &self.leaf_hash,
            &self.audit_path,
            expected_root,
        )
    }
}

/// Evidence that a tree of `new_tree_size` extends one of `old_tree_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyProof {
    pub old_tree_size: u64,
    pub new_tree_size: u64,
    /// Base64 root of the old tree.
    pub old_root: String,
    /// Base64 root of the new tree.
    pub new_root: String,
    /// Base64-encoded proof nodes.
    pub path: Vec<String>,
}

impl ConsistencyProof {
    /// Build the wire form from typed values. Roots use base64url.
    pub fn new(
        old_tree_size: u64,
        new_tree_size: u64,
        old_root: &Sha256Hash,
        new_root: &Sha256Hash,
        path: &[Sha256Hash],
    ) -> Self {
        Self {
            old_tree_size,
            new_tree_size,
            old_root: old_root.to_base64url(),
            new_root: new_root.to_base64url(),
            path: path.iter().map(Sha256Hash::to_base64).collect(),
        }
    }

    pub fn verify(&self) -> Result<bool, ProofInputError> {
        verify_consistency(
            self.old_tree_size,
            self.new_tree_size,
            &self.old_root,
            &self.new_root,
            &self.path,
        )
    }
}

/// Verify an inclusion proof given in wire encodings.
///
/// `leaf_hash` is hex, `audit_path` elements are base64 (either alphabet),
/// `expected_root` is base64. An expected root that does not decode to a
/// digest simply fails to match.
pub fn verify_inclusion(
    leaf_index: u64,
    tree_size: u64,
    leaf_hash: &str,
    audit_path: &[String],
    expected_root: &str,
) -> Result<bool, ProofInputError> {
    check_inclusion_bounds(leaf_index, tree_size)?;

    let leaf = Sha256Hash::from_hex(leaf_hash).map_err(ProofInputError::MalformedLeafHash)?;
    let path = decode_path(audit_path)?;

    let expected = match Sha256Hash::from_base64(expected_root) {
        Ok(root) => root,
        Err(_) => return Ok(false),
    };

    Ok(root_from_inclusion_path(leaf_index, tree_size, &leaf, &path) == Some(expected))
}

/// Verify an inclusion proof over typed digests.
pub fn verify_inclusion_hashes(
    leaf_index: u64,
    tree_size: u64,
    leaf_hash: &Sha256Hash,
    audit_path: &[Sha256Hash],
    expected_root: &Sha256Hash,
) -> Result<bool, ProofInputError> {
    check_inclusion_bounds(leaf_index, tree_size)?;
    Ok(root_from_inclusion_path(leaf_index, tree_size, leaf_hash, audit_path) == Some(*expected_root))
}

fn check_inclusion_bounds(leaf_index: u64, tree_size: u64) -> Result<(), ProofInputError> {
    if tree_size == 0 {
        return Err(ProofInputError::ZeroTreeSize);
    }
    if leaf_index >= tree_size {
        return Err(ProofInputError::LeafIndexOutOfRange {
            leaf_index,
            tree_size,
        });
    }
    Ok(())
}

/// Recompute the root an audit path commits to.
///
/// `None` when the path is too long or too short for the tree size.
/// Bounds must already be checked.
fn root_from_inclusion_path(
    leaf_index: u64,
    tree_size: u64,
    leaf_hash: &Sha256Hash,
    audit_path: &[Sha256Hash],
) -> Option<Sha256Hash> {
    let mut fnode = leaf_index;
    let mut snode = tree_size - 1;
    let mut r = *leaf_hash;

    for p in audit_path {
        if snode == 0 {
            return None;
        }
        if fnode & 1 == 1 || fnode == snode {
            r = node_hash(p, &r);
            while fnode & 1 == 0 && fnode != 0 {
                fnode >>= 1;
                snode >>= 1;
            }
        } else {
            r = node_hash(&r, p);
        }
        fnode >>= 1;
        snode >>= 1;
    }

    (snode == 0).then_some(r)
}

/// Verify a consistency proof given in wire encodings.
///
/// Size edge cases are settled before anything is decoded: an empty old tree
/// is consistent with everything, equal sizes compare the root strings
/// directly, and a shrinking tree is never consistent.
pub fn verify_consistency(
    old_tree_size: u64,
    new_tree_size: u64,
    old_root: &str,
    new_root: &str,
    path: &[String],
) -> Result<bool, ProofInputError> {
    if old_tree_size == 0 {
        return Ok(true);
    }
    if old_tree_size == new_tree_size {
        return Ok(old_root == new_root && path.is_empty());
    }
    if old_tree_size > new_tree_size || path.is_empty() {
        return Ok(false);
    }

    let old = Sha256Hash::from_base64(old_root)
        .map_err(|source| ProofInputError::MalformedRoot { which: "old", source })?;
    let new = Sha256Hash::from_base64(new_root)
        .map_err(|source| ProofInputError::MalformedRoot { which: "new", source })?;
    let nodes = decode_path(path)?;

    Ok(verify_consistency_hashes(old_tree_size, new_tree_size, &old, &new, &nodes))
}

/// Verify a consistency proof over typed digests.
pub fn verify_consistency_hashes(
    old_tree_size: u64,
    new_tree_size: u64,
    old_root: &Sha256Hash,
    new_root: &Sha256Hash,
    path: &[Sha256Hash],
) -> bool {
    if old_tree_size == 0 {
        return true;
    }
    if old_tree_size == new_tree_size {
        return old_root == new_root && path.is_empty();
    }
    if old_tree_size > new_tree_size || path.is_empty() {
        return false;
    }

    // A power-of-two old tree is a complete subtree; its root opens the proof.
    let mut nodes = Vec::with_capacity(path.len() + 1);
    if old_tree_size.is_power_of_two() {
        nodes.push(*old_root);
    }
    nodes.extend_from_slice(path);

    let mut fnode = old_tree_size - 1;
    let mut snode = new_tree_size - 1;
    while fnode & 1 == 1 {
        fnode >>= 1;
        snode >>= 1;
    }

    let Some((first, rest)) = nodes.split_first() else {
        return false;
    };
    let mut fr = *first;
    let mut sr = *first;

    for c in rest {
        if snode == 0 {
            return false;
        }
        if fnode & 1 == 1 || fnode == snode {
            fr = node_hash(c, &fr);
            sr = node_hash(c, &sr);
            while fnode & 1 == 0 && fnode != 0 {
                fnode >>= 1;
                snode >>= 1;
            }
        } else {
            sr = node_hash(&sr, c);
        }
        fnode >>= 1;
        snode >>= 1;
    }

    snode == 0 && fr == *old_root && sr == *new_root
}

fn decode_path(path: &[String]) -> Result<Vec<Sha256Hash>, ProofInputError> {
    path.iter()
        .enumerate()
        .map(|(index, element)| {
            Sha256Hash::from_base64(element)
                .map_err(|source| ProofInputError::MalformedPathElement { index, source })
        })
        .collect()
}
