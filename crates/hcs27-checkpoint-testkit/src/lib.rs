//! # HCS-27 Checkpoint Testkit
//!
//! Testing utilities for HCS-27 checkpoints.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Canonical bytes, leaf hashes and roots every implementation must agree on
//! - **Generators**: Proptest strategies for entries, digests and checkpoint chains
//! - **Fixtures**: A signing publisher wired to an in-memory resolver
//!
//! ## Golden Vectors
//!
//! ```rust
//! use hcs27_checkpoint_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{name}: {computed}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use hcs27_checkpoint_core::validate_chain;
//! use hcs27_checkpoint_testkit::generators::{chain_from_params, ChainParams};
//!
//! proptest! {
//!     #[test]
//!     fn chains_link(params: ChainParams) {
//!         let chain = chain_from_params(&params).unwrap();
//!         prop_assert!(validate_chain(&chain).is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use hcs27_checkpoint_testkit::fixtures::ChainFixture;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut fixture = ChainFixture::new("my-log")?;
//! let chain = fixture.linked_chain(&[4, 2])?;
//! let envelope = fixture.envelope_bytes(&chain[1])?;
//! assert!(!envelope.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_stream_fixtures, ChainFixture, FIXTURE_REGISTRY};
pub use generators::{chain_from_params, ChainParams};
pub use vectors::{leaf_vectors, root_vectors, seq_entries, verify_all_vectors, LeafVector, RootVector};
