//! Domain-separated SHA-256 hashing for Merkle leaves and interior nodes.
//!
//! A leaf is hashed as `SHA-256(0x00 || bytes)` and a node as
//! `SHA-256(0x01 || left || right)`, so an interior node can never be passed
//! off as a leaf or the other way around.

use serde_json::Value;

use crate::canonical::{canonical_bytes, CanonicalValue};
use crate::crypto::Sha256Hash;
use crate::error::CanonicalizationError;

/// Prefix byte for leaf hashes.
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix byte for interior node hashes.
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash of an entry: `SHA-256(0x00 || canonical_bytes(entry))`.
pub fn leaf_hash(entry: &Value) -> Result<Sha256Hash, CanonicalizationError> {
    Ok(leaf_hash_bytes(&canonical_bytes(entry)?))
}

/// Leaf hash of an already-canonicalized value.
pub fn leaf_hash_canonical(entry: &CanonicalValue) -> Result<Sha256Hash, CanonicalizationError> {
    Ok(leaf_hash_bytes(&entry.encode()?))
}

/// Leaf hash over raw bytes.
pub fn leaf_hash_bytes(bytes: &[u8]) -> Sha256Hash {
    Sha256Hash::hash_parts(&[&[LEAF_HASH_PREFIX], bytes])
}

/// Hash of two children: `SHA-256(0x01 || left || right)`.
pub fn node_hash(left: &Sha256Hash, right: &Sha256Hash) -> Sha256Hash {
    Sha256Hash::hash_parts(&[&[NODE_HASH_PREFIX], left.as_bytes(), right.as_bytes()])
}

/// Root of the empty tree: `SHA-256("")`.
pub fn empty_root() -> Sha256Hash {
    Sha256Hash::hash(&[])
}
