//! The verifier: accepts checkpoints from envelopes and tracks stream heads.
//!
//! Every checkpoint passes the same gauntlet before it becomes a stream's
//! head: structural validation, signature policy, chain linkage against the
//! last accepted root, and (when supplied or required) a consistency proof
//! from that root to the new one.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hcs27_checkpoint_core::{
    validate_checkpoint, verify_checkpoint_signature, verify_consistency, ChainValidator,
    Checkpoint, CheckpointError, Ed25519PublicKey, Envelope, Metadata, RootCommitment, StreamKey,
    StreamState, MAX_ENVELOPE_BYTES,
};

use crate::error::{Result, SdkError};
use crate::resolver::MetadataResolver;

/// Configuration for the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Reject checkpoints without a signature from a trusted key.
    pub require_signatures: bool,
    /// Trusted signing keys: key id to base64url Ed25519 public key.
    pub trusted_keys: BTreeMap<String, String>,
    /// Upper bound on incoming envelope size.
    pub max_envelope_bytes: usize,
    /// Check a declared digest on inline metadata. Referenced metadata is
    /// always checked.
    pub verify_metadata_digest: bool,
    /// Reject a growing checkpoint unless a consistency proof accompanies it.
    pub require_consistency_proofs: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            require_signatures: false,
            trusted_keys: BTreeMap::new(),
            max_envelope_bytes: MAX_ENVELOPE_BYTES,
            verify_metadata_digest: true,
            require_consistency_proofs: false,
        }
    }
}

/// Verifies checkpoints and keeps the last accepted root of every stream.
pub struct CheckpointVerifier<R: MetadataResolver> {
    resolver: R,
    config: VerifierConfig,
    trusted_keys: BTreeMap<String, Ed25519PublicKey>,
    chain: RwLock<ChainValidator>,
}

impl<R: MetadataResolver> CheckpointVerifier<R> {
    /// Create a verifier. Fails if a trusted key does not decode.
    pub fn new(resolver: R, config: VerifierConfig) -> Result<Self> {
        let trusted_keys = config
            .trusted_keys
            .iter()
            .map(|(key_id, encoded)| {
                Ed25519PublicKey::from_base64(encoded)
                    .map(|pk| (key_id.clone(), pk))
                    .map_err(|e| SdkError::Config(format!("trusted key {key_id}: {e}")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            resolver,
            config,
            trusted_keys,
            chain: RwLock::new(ChainValidator::new()),
        })
    }

    /// Trust an additional signing key.
    pub fn trust_key(&mut self, key_id: impl Into<String>, public_key: Ed25519PublicKey) {
        let key_id = key_id.into();
        self.config
            .trusted_keys
            .insert(key_id.clone(), public_key.to_base64url());
        self.trusted_keys.insert(key_id, public_key);
    }

    /// Resume with stream heads accepted earlier.
    pub fn with_heads(self, heads: impl IntoIterator<Item = StreamState>) -> Self {
        Self {
            chain: RwLock::new(ChainValidator::with_states(heads)),
            ..self
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Parse an envelope, resolve its metadata and ingest the checkpoint.
    ///
    /// `consistency` is the base64 proof path from the stream's current
    /// head to the new root, if the caller has one.
    pub async fn ingest_envelope(
        &self,
        bytes: &[u8],
        consistency: Option<&[String]>,
    ) -> Result<Checkpoint> {
        let checkpoint = self.open_envelope(bytes).await.map_err(|e| {
            warn!(error = %e, "rejected envelope");
            e
        })?;
        self.ingest_checkpoint(checkpoint, consistency)
    }

    async fn open_envelope(&self, bytes: &[u8]) -> Result<Checkpoint> {
        let envelope = Envelope::parse_with_limit(bytes, self.config.max_envelope_bytes)?;

        if let Some(reference) = envelope.reference()? {
            let reference = reference.to_string();
            let blob = self.resolver.resolve(&reference).await?;
            debug!(%reference, bytes = blob.len(), "resolved checkpoint metadata");
            return Ok(envelope.checkpoint_from_resolved(&blob)?);
        }

        match &envelope.metadata {
            Metadata::Inline(value) if !self.config.verify_metadata_digest => {
                Ok(Checkpoint::from_json(value)?)
            }
            _ => Ok(envelope.checkpoint()?),
        }
    }

    /// Verify a checkpoint and, if it passes, make it its stream's head.
    pub fn ingest_checkpoint(
        &self,
        checkpoint: Checkpoint,
        consistency: Option<&[String]>,
    ) -> Result<Checkpoint> {
        let key = checkpoint.stream_key();
        match self.accept(&checkpoint, consistency) {
            Ok(()) => {
                debug!(
                    stream = %key,
                    tree_size = checkpoint.root.tree_size,
                    "accepted checkpoint"
                );
                Ok(checkpoint)
            }
            Err(e) => {
                warn!(
                    stream = %key,
                    tree_size = checkpoint.root.tree_size,
                    error = %e,
                    "rejected checkpoint"
                );
                Err(e)
            }
        }
    }

    fn accept(&self, checkpoint: &Checkpoint, consistency: Option<&[String]>) -> Result<()> {
        validate_checkpoint(checkpoint)?;
        self.check_signature(checkpoint)?;

        // Check and record under one write lock.
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        chain.check(checkpoint)?;

        let key = checkpoint.stream_key();
        if let Some(state) = chain.state(&key) {
            self.check_consistency(&key, &state.head, &checkpoint.root, consistency)?;
        }

        chain.apply(checkpoint)?;
        Ok(())
    }

    fn check_signature(&self, checkpoint: &Checkpoint) -> Result<()> {
        let Some(signature) = &checkpoint.signature else {
            if self.config.require_signatures {
                return Err(CheckpointError::MissingSignature.into());
            }
            return Ok(());
        };

        match self.trusted_keys.get(&signature.key_id) {
            Some(public_key) => Ok(verify_checkpoint_signature(checkpoint, public_key)?),
            None if self.config.require_signatures => {
                Err(SdkError::UntrustedKey(signature.key_id.clone()))
            }
            None => {
                debug!(key_id = %signature.key_id, "signature from unknown key not checked");
                Ok(())
            }
        }
    }

    fn check_consistency(
        &self,
        key: &StreamKey,
        head: &RootCommitment,
        next: &RootCommitment,
        consistency: Option<&[String]>,
    ) -> Result<()> {
        // Same size needs no path: the roots must simply be equal.
        let path: &[String] = match consistency {
            Some(path) => path,
            None if head.tree_size == next.tree_size => &[],
            None if self.config.require_consistency_proofs => {
                return Err(SdkError::MissingConsistencyProof(key.clone()));
            }
            None => return Ok(()),
        };

        let consistent = verify_consistency(
            head.tree_size,
            next.tree_size,
            &head.root_hash_b64u,
            &next.root_hash_b64u,
            path,
        )?;
        if !consistent {
            return Err(SdkError::InconsistentRoot {
                stream: key.clone(),
                old_tree_size: head.tree_size,
                new_tree_size: next.tree_size,
            });
        }
        Ok(())
    }

    /// Last accepted root of one stream.
    pub fn head(&self, key: &StreamKey) -> Option<RootCommitment> {
        self.chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state(key)
            .map(|s| s.head.clone())
    }

    /// Snapshot of every known stream, ordered by key.
    pub fn heads(&self) -> Vec<StreamState> {
        self.chain
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .states()
            .cloned()
            .collect()
    }
}
