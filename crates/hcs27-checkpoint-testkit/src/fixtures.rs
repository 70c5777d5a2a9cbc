//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use serde_json::json;

use hcs27_checkpoint::{
    CheckpointVerifier, MemoryResolver, Publisher, PublisherConfig, Result, VerifierConfig,
};
use hcs27_checkpoint_core::{Checkpoint, Envelope, Keypair};

/// Registry used by every fixture stream.
pub const FIXTURE_REGISTRY: &str = "0.0.1000";

/// A signing publisher for one stream plus a shared in-memory resolver.
pub struct ChainFixture {
    pub keypair: Keypair,
    pub key_id: String,
    pub publisher: Publisher,
    pub resolver: Arc<MemoryResolver>,
}

impl ChainFixture {
    /// Create a fixture with a random keypair.
    pub fn new(log_id: &str) -> Result<Self> {
        Self::with_keypair(log_id, Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(log_id: &str, seed: [u8; 32]) -> Result<Self> {
        Self::with_keypair(log_id, Keypair::from_seed(&seed))
    }

    fn with_keypair(log_id: &str, keypair: Keypair) -> Result<Self> {
        let key_id = format!("{log_id}-key");
        let publisher = Publisher::new(PublisherConfig {
            registry: FIXTURE_REGISTRY.to_string(),
            log_id: log_id.to_string(),
            ..PublisherConfig::default()
        })?
        .with_signer(key_id.clone(), keypair.clone());

        Ok(Self {
            keypair,
            key_id,
            publisher,
            resolver: Arc::new(MemoryResolver::new()),
        })
    }

    /// Append `count` `{"seq": i}` entries, continuing the numbering.
    pub fn append(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let seq = self.publisher.tree_size();
            self.publisher.append(&json!({ "seq": seq }))?;
        }
        Ok(())
    }

    /// Append `count` entries and issue a checkpoint over them.
    pub fn append_batch(&mut self, count: usize) -> Result<Checkpoint> {
        self.append(count)?;
        self.publisher.checkpoint()
    }

    /// A linked chain with one checkpoint per batch size.
    pub fn linked_chain(&mut self, batches: &[usize]) -> Result<Vec<Checkpoint>> {
        batches.iter().map(|&n| self.append_batch(n)).collect()
    }

    /// Serialized envelope, offloading metadata into the fixture's resolver.
    pub fn envelope_bytes(&self, checkpoint: &Checkpoint) -> Result<Vec<u8>> {
        let resolver = Arc::clone(&self.resolver);
        let envelope: Envelope = self
            .publisher
            .envelope(checkpoint, move |bytes| Ok(resolver.insert(bytes.to_vec())))?;
        Ok(envelope.to_bytes()?)
    }

    /// A verifier that trusts this fixture's key and shares its resolver.
    pub fn verifier(&self, config: VerifierConfig) -> Result<CheckpointVerifier<Arc<MemoryResolver>>> {
        let mut verifier = CheckpointVerifier::new(Arc::clone(&self.resolver), config)?;
        verifier.trust_key(self.key_id.clone(), self.keypair.public_key());
        Ok(verifier)
    }
}

/// Create fixtures for several independent streams.
pub fn multi_stream_fixtures(count: usize) -> Result<Vec<ChainFixture>> {
    (0..count)
        .map(|i| ChainFixture::with_seed(&format!("stream-{i}"), [i as u8; 32]))
        .collect()
}
