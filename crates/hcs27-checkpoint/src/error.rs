//! Error types for the SDK.

use hcs27_checkpoint_core::{
    CanonicalizationError, ChainError, CheckpointError, EnvelopeError, ProofInputError, StreamKey,
};
use thiserror::Error;

/// Errors that can occur while verifying or publishing checkpoints.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Envelope failed to parse or validate.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Checkpoint metadata is structurally invalid or badly signed.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Checkpoint does not link to its stream's last root.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Proof inputs were malformed.
    #[error("proof input error: {0}")]
    ProofInput(#[from] ProofInputError),

    /// An entry could not be canonicalized.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A referenced metadata blob could not be fetched.
    #[error("failed to resolve {reference}: {reason}")]
    Resolve { reference: String, reason: String },

    /// A consistency proof did not connect the previous head to the new root.
    #[error("stream {stream}: consistency proof from {old_tree_size} to {new_tree_size} failed")]
    InconsistentRoot {
        stream: StreamKey,
        old_tree_size: u64,
        new_tree_size: u64,
    },

    /// A consistency proof was required but not supplied.
    #[error("stream {0}: consistency proof required")]
    MissingConsistencyProof(StreamKey),

    /// Signature policy requires a signature from a trusted key.
    #[error("no trusted key for key id {0}")]
    UntrustedKey(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Requested leaf or tree size lies outside the log.
    #[error("{what} {value} out of range for tree size {tree_size}")]
    OutOfRange {
        what: &'static str,
        value: u64,
        tree_size: u64,
    },
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;
