//! Error types for the checkpoint core.
//!
//! Proof verification keeps a strict split: a malformed input is an `Err`
//! ([`ProofInputError`]), while a well-formed proof that fails to reconstruct
//! the expected root is `Ok(false)`.

use thiserror::Error;

/// A value could not be turned into canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalizationError {
    #[error("non-finite number cannot be canonicalized")]
    NonFiniteNumber,

    #[error("number {0} has no canonical representation")]
    UnrepresentableNumber(String),

    #[error("unsupported value: {0}")]
    Unsupported(String),
}

impl serde::ser::Error for CanonicalizationError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Unsupported(msg.to_string())
    }
}

/// A 32-byte digest failed to decode from its wire form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DigestError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// The caller handed a proof verifier inputs that break its contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProofInputError {
    #[error("tree size must be greater than zero")]
    ZeroTreeSize,

    #[error("leaf index {leaf_index} out of range for tree size {tree_size}")]
    LeafIndexOutOfRange { leaf_index: u64, tree_size: u64 },

    #[error("malformed leaf hash: {0}")]
    MalformedLeafHash(DigestError),

    #[error("malformed audit path element {index}: {source}")]
    MalformedPathElement { index: usize, source: DigestError },

    #[error("malformed {which} root: {source}")]
    MalformedRoot {
        which: &'static str,
        source: DigestError,
    },
}

/// Per-stream linkage violations found while walking checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("stream {stream}: tree size decreased from {last} to {current}")]
    TreeSizeRegression {
        stream: String,
        last: u64,
        current: u64,
    },

    #[error("stream {stream}: checkpoint at tree size {tree_size} is missing previous")]
    MissingPrevious { stream: String, tree_size: u64 },

    #[error(
        "stream {stream}: previous ({got_tree_size}, {got_root}) does not match last root ({expected_tree_size}, {expected_root})"
    )]
    PreviousMismatch {
        stream: String,
        expected_tree_size: u64,
        expected_root: String,
        got_tree_size: u64,
        got_root: String,
    },
}

/// Structural or signature problems with checkpoint metadata.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("unsupported checkpoint type: {0}")]
    UnsupportedType(String),

    #[error("unsupported log algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("stream {0} must not be empty")]
    EmptyStreamField(&'static str),

    #[error("invalid {field} root hash: {source}")]
    InvalidRootHash {
        field: &'static str,
        source: DigestError,
    },

    #[error("previous tree size {previous} exceeds root tree size {root}")]
    PreviousExceedsRoot { previous: u64, root: u64 },

    #[error("invalid batch range [{start}, {end}) for tree size {tree_size}")]
    InvalidBatchRange { start: u64, end: u64, tree_size: u64 },

    #[error("checkpoint is not signed")]
    MissingSignature,

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedSignatureAlgorithm(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("malformed checkpoint: {0}")]
    Malformed(String),
}

/// Problems with the transport envelope around checkpoint metadata.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("unsupported protocol tag: {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("memo is {0} characters, limit is 299")]
    MemoTooLong(usize),

    #[error("envelope is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("referenced metadata requires metadata_digest")]
    MissingDigest,

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(String),

    #[error("metadata digest mismatch: declared {declared}, computed {computed}")]
    DigestMismatch { declared: String, computed: String },

    #[error("invalid metadata reference: {0}")]
    InvalidReference(String),

    #[error("metadata is a reference and must be resolved first")]
    Unresolved,

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Any error raised by the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    ProofInput(#[from] ProofInputError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}
