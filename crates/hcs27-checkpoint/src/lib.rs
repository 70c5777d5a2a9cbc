//! # HCS-27 Checkpoint
//!
//! The SDK for HCS-27 Merkle checkpoints: publish an append-only log's roots
//! as signed checkpoints, and verify checkpoints received from others.
//!
//! ## Overview
//!
//! - **Publisher**: Appends entries, issues linked checkpoints, serves proofs
//! - **Verifier**: Ingests envelopes, resolves offloaded metadata, enforces
//!   signature policy, chain linkage and consistency
//! - **Resolver**: Fetches metadata that did not fit in an envelope
//!
//! ## Key Concepts
//!
//! - **Checkpoint**: Immutable. One stream's tree size and root at a point in time.
//! - **Stream**: `registry::logId`. Tree size never shrinks.
//! - **Previous**: Each checkpoint after the first names the last root it extends.
//! - **Envelope**: The `hcs-27` register message; at most 1024 bytes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hcs27_checkpoint::{CheckpointVerifier, MemoryResolver, Publisher, PublisherConfig, VerifierConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! async fn example() -> hcs27_checkpoint::Result<()> {
//!     let resolver = Arc::new(MemoryResolver::new());
//!
//!     let mut publisher = Publisher::new(PublisherConfig {
//!         registry: "0.0.1234".into(),
//!         log_id: "audit".into(),
//!         ..PublisherConfig::default()
//!     })?;
//!     publisher.append(&json!({"event": "login", "user": "alice"}))?;
//!
//!     let checkpoint = publisher.checkpoint()?;
//!     let envelope = publisher.envelope(&checkpoint, |bytes| Ok(resolver.insert(bytes.to_vec())))?;
//!
//!     let verifier = CheckpointVerifier::new(Arc::clone(&resolver), VerifierConfig::default())?;
//!     let accepted = verifier.ingest_envelope(&envelope.to_bytes()?, None).await?;
//!     assert_eq!(accepted, checkpoint);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `hcs27_checkpoint::core` - Core primitives (hashing, proofs, checkpoints)

pub mod error;
pub mod publisher;
pub mod resolver;
pub mod verifier;

// Re-export the core crate
pub use hcs27_checkpoint_core as core;

// Re-export main types for convenience
pub use error::{Result, SdkError};
pub use publisher::{Publisher, PublisherConfig};
pub use resolver::{MemoryResolver, MetadataResolver, MEMORY_SCHEME};
pub use verifier::{CheckpointVerifier, VerifierConfig};

// Re-export commonly used core types
pub use hcs27_checkpoint_core::{
    Checkpoint, ConsistencyProof, Ed25519PublicKey, Envelope, InclusionProof, Keypair,
    RootCommitment, Sha256Hash, StreamKey, StreamRef,
};
