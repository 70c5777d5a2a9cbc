//! Merkle Tree Hash (RFC 6962 §2.1) and proof generation.
//!
//! The tree shape is a function of the leaf count alone: for `n > 1` the left
//! subtree holds the largest power of two strictly below `n`. Everything here
//! recurses over slices; no node is ever stored, so any two implementations
//! agree on roots and proofs without sharing internal structure.

use serde_json::Value;

use crate::crypto::Sha256Hash;
use crate::error::CanonicalizationError;
use crate::hasher::{empty_root, leaf_hash, node_hash};

/// Root hash of `entries`, in order.
pub fn merkle_tree_hash(entries: &[Value]) -> Result<Sha256Hash, CanonicalizationError> {
    let leaves = entries
        .iter()
        .map(leaf_hash)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(root_from_leaf_hashes(&leaves))
}

/// Root hash over precomputed leaf hashes.
pub fn root_from_leaf_hashes(leaves: &[Sha256Hash]) -> Sha256Hash {
    match leaves.len() {
        0 => empty_root(),
        1 => leaves[0],
        n => {
            let k = split_point(n);
            node_hash(
                &root_from_leaf_hashes(&leaves[..k]),
                &root_from_leaf_hashes(&leaves[k..]),
            )
        }
    }
}

/// Largest power of two strictly less than `n`. Requires `n > 1`.
pub fn split_point(n: usize) -> usize {
    debug_assert!(n > 1);
    1 << (usize::BITS - 1 - (n - 1).leading_zeros())
}

/// Audit path for the leaf at `index`, ordered from the leaf upward.
///
/// Returns `None` when `index` is out of range.
pub fn inclusion_path(index: usize, leaves: &[Sha256Hash]) -> Option<Vec<Sha256Hash>> {
    if index >= leaves.len() {
        return None;
    }
    Some(path(index, leaves))
}

fn path(m: usize, leaves: &[Sha256Hash]) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if n == 1 {
        return Vec::new();
    }
    let k = split_point(n);
    if m < k {
        let mut p = path(m, &leaves[..k]);
        p.push(root_from_leaf_hashes(&leaves[k..]));
        p
    } else {
        let mut p = path(m - k, &leaves[k..]);
        p.push(root_from_leaf_hashes(&leaves[..k]));
        p
    }
}

/// Consistency proof from the first `old_size` leaves to all of `leaves`.
///
/// Empty when `old_size` is zero or equals the current size. `None` when
/// `old_size` exceeds the number of leaves.
pub fn consistency_path(old_size: usize, leaves: &[Sha256Hash]) -> Option<Vec<Sha256Hash>> {
    let n = leaves.len();
    if old_size > n {
        return None;
    }
    if old_size == 0 || old_size == n {
        return Some(Vec::new());
    }
    Some(subproof(old_size, leaves, true))
}

fn subproof(m: usize, leaves: &[Sha256Hash], complete: bool) -> Vec<Sha256Hash> {
    let n = leaves.len();
    if m == n {
        // The old root is only omitted when it is the whole original tree.
        return if complete {
            Vec::new()
        } else {
            vec![root_from_leaf_hashes(leaves)]
        };
    }
    let k = split_point(n);
    if m <= k {
        let mut p = subproof(m, &leaves[..k], complete);
        p.push(root_from_leaf_hashes(&leaves[k..]));
        p
    } else {
        let mut p = subproof(m - k, &leaves[k..], false);
        p.push(root_from_leaf_hashes(&leaves[..k]));
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::leaf_hash_bytes;
    use serde_json::json;

    fn seq_entries(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({ "seq": i })).collect()
    }

    fn leaves(n: usize) -> Vec<Sha256Hash> {
        (0..n).map(|i| leaf_hash_bytes(&[i as u8])).collect()
    }

    #[test]
    fn test_split_point() {
        assert_eq!(split_point(2), 1);
        assert_eq!(split_point(3), 2);
        assert_eq!(split_point(4), 2);
        assert_eq!(split_point(5), 4);
        assert_eq!(split_point(8), 4);
        assert_eq!(split_point(9), 8);
        assert_eq!(split_point(1 << 20), 1 << 19);
    }

    #[test]
    fn test_empty_tree_is_empty_root() {
        assert_eq!(merkle_tree_hash(&[]).unwrap(), empty_root());
    }

    #[test]
    fn test_single_entry_is_leaf() {
        let entry = json!({"event": "register"});
        assert_eq!(
            merkle_tree_hash(&[entry.clone()]).unwrap(),
            leaf_hash(&entry).unwrap()
        );
    }

    #[test]
    fn test_four_entries_balanced() {
        let entries = vec![json!("a"), json!("b"), json!("c"), json!("d")];
        let l: Vec<_> = entries.iter().map(|e| leaf_hash(e).unwrap()).collect();
        let expected = node_hash(&node_hash(&l[0], &l[1]), &node_hash(&l[2], &l[3]));
        assert_eq!(merkle_tree_hash(&entries).unwrap(), expected);
    }

    #[test]
    fn test_three_entries_left_heavy() {
        let l = leaves(3);
        let expected = node_hash(&node_hash(&l[0], &l[1]), &l[2]);
        assert_eq!(root_from_leaf_hashes(&l), expected);
    }

    #[test]
    fn test_known_roots() {
        let cases = [
            (1, "a402b0e36f5aae85457360fcf00a2545b87dd47f310553e7b0d32d6d0ac4400d"),
            (2, "fc52d71a368a798fd96ec7e5b7ee5f8f9fdd10c7ff9ab146c4eac1e6a0a1b10a"),
            (5, "147dc477479a3b69a24b1ff601b6fc6284fdf15fd50abfeb0cf70ea8e3722c1d"),
            (8, "b9c377f91dac312b36ca40d1f3a4428539a8719064819739f4160478d3d0143b"),
        ];
        for (n, expected) in cases {
            assert_eq!(merkle_tree_hash(&seq_entries(n)).unwrap().to_hex(), expected, "n = {n}");
        }
    }

    #[test]
    fn test_root_deterministic() {
        let entries = seq_entries(13);
        assert_eq!(
            merkle_tree_hash(&entries).unwrap(),
            merkle_tree_hash(&entries).unwrap()
        );
    }

    #[test]
    fn test_inclusion_path_lengths() {
        let l = leaves(8);
        for i in 0..8 {
            assert_eq!(inclusion_path(i, &l).unwrap().len(), 3);
        }
        // In a 5-leaf tree the last leaf sits directly under the root.
        let l = leaves(5);
        assert_eq!(inclusion_path(4, &l).unwrap().len(), 1);
        assert_eq!(inclusion_path(0, &l).unwrap().len(), 3);
    }

    #[test]
    fn test_inclusion_path_out_of_range() {
        assert!(inclusion_path(0, &[]).is_none());
        assert!(inclusion_path(3, &leaves(3)).is_none());
    }

    #[test]
    fn test_inclusion_path_two_leaves() {
        let l = leaves(2);
        assert_eq!(inclusion_path(0, &l).unwrap(), vec![l[1]]);
        assert_eq!(inclusion_path(1, &l).unwrap(), vec![l[0]]);
    }

    #[test]
    fn test_consistency_path_edges() {
        let l = leaves(6);
        assert!(consistency_path(0, &l).unwrap().is_empty());
        assert!(consistency_path(6, &l).unwrap().is_empty());
        assert!(consistency_path(7, &l).is_none());
    }

    #[test]
    fn test_consistency_path_rfc_shape() {
        // RFC 6962 §2.1.3 example: PROOF(3, D[7]) = [c, d, g, l].
        let l = leaves(7);
        let proof = consistency_path(3, &l).unwrap();
        let g = node_hash(&l[0], &l[1]);
        let i = node_hash(&l[4], &l[5]);
        let lnode = node_hash(&i, &l[6]);
        assert_eq!(proof, vec![l[2], l[3], g, lnode]);

        // PROOF(4, D[7]) = [l], the old root is implicit.
        assert_eq!(consistency_path(4, &l).unwrap(), vec![lnode]);
    }
}
