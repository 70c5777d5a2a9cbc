//! # HCS-27 Checkpoint Core
//!
//! Pure primitives for HCS-27 checkpoints: canonical JSON, RFC 9162 Merkle
//! hashing, inclusion and consistency proofs, and per-stream chain linkage.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over hashes and checkpoint metadata.
//!
//! ## Key Types
//!
//! - [`CanonicalValue`] - Tagged JSON value with a deterministic byte encoding
//! - [`Sha256Hash`] - 32-byte digest with hex and base64 wire forms
//! - [`Checkpoint`] - One commitment to a stream's Merkle root
//! - [`ChainValidator`] - Incremental per-stream linkage checker
//! - [`Envelope`] - The `hcs-27` register message carrying checkpoint metadata
//!
//! ## Hashing
//!
//! Leaves are `SHA-256(0x00 || canonical_bytes(entry))`, interior nodes are
//! `SHA-256(0x01 || left || right)`, and the empty tree hashes to `SHA-256("")`.
//! See [`hasher`] and [`merkle`].
//!
//! ## Proofs
//!
//! Verifiers return `Err` for malformed input and `Ok(false)` for proofs that
//! are well-formed but do not match. See [`proof`].

pub mod canonical;
pub mod checkpoint;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod hasher;
pub mod merkle;
pub mod proof;
pub mod stream;
pub mod validation;

pub use canonical::{canonical_bytes, canonical_bytes_of, canonical_string, CanonicalValue};
pub use checkpoint::{
    sign_checkpoint, verify_checkpoint_signature, BatchRange, Checkpoint, CheckpointSignature,
    LogProfile, RootCommitment, CHECKPOINT_TYPE,
};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair, Sha256Hash};
pub use envelope::{
    Envelope, Metadata, MetadataDigest, MetadataReference, MAX_ENVELOPE_BYTES,
    MEMO_CHAR_LIMIT,
};
pub use error::{
    CanonicalizationError, ChainError, CheckpointError, CoreError, DigestError, EnvelopeError,
    ProofInputError,
};
pub use hasher::{empty_root, leaf_hash, leaf_hash_bytes, node_hash};
pub use merkle::{consistency_path, inclusion_path, merkle_tree_hash, root_from_leaf_hashes};
pub use proof::{
    verify_consistency, verify_consistency_hashes, verify_inclusion, verify_inclusion_hashes,
    ConsistencyProof, InclusionProof,
};
pub use stream::{Advance, StreamKey, StreamRef, StreamState};
pub use validation::{
    validate_chain, validate_checkpoint, verify_checkpoint_consistency, ChainValidator,
};
