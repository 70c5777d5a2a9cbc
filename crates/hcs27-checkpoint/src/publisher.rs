//! The publisher: an in-memory append-only log for one stream.
//!
//! Entries are hashed as they are appended. Checkpoints cover the entries
//! added since the previous checkpoint and link to it through `previous`.
//! Nothing is persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use hcs27_checkpoint_core::{
    consistency_path, inclusion_path, leaf_hash, root_from_leaf_hashes, sign_checkpoint,
    BatchRange, Checkpoint, ConsistencyProof, Envelope, EnvelopeError, InclusionProof, Keypair,
    MetadataReference, RootCommitment, Sha256Hash, StreamRef, MAX_ENVELOPE_BYTES, MEMO_CHAR_LIMIT,
};

use crate::error::{Result, SdkError};

/// Configuration for the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Registry the stream belongs to.
    pub registry: String,
    /// Log identifier within the registry.
    pub log_id: String,
    /// Memo attached to every envelope.
    pub memo: Option<String>,
    /// Envelopes larger than this move their metadata out of line.
    pub max_envelope_bytes: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            registry: String::new(),
            log_id: String::new(),
            memo: None,
            max_envelope_bytes: MAX_ENVELOPE_BYTES,
        }
    }
}

/// Append-only log that issues checkpoints for one stream.
pub struct Publisher {
    config: PublisherConfig,
    signer: Option<(String, Keypair)>,
    leaves: Vec<Sha256Hash>,
    last: Option<RootCommitment>,
}

impl Publisher {
    /// Create a publisher. Registry and log id must be set.
    pub fn new(config: PublisherConfig) -> Result<Self> {
        if config.registry.is_empty() || config.log_id.is_empty() {
            return Err(SdkError::Config(
                "publisher needs a registry and a log id".into(),
            ));
        }
        if let Some(memo) = &config.memo {
            let chars = memo.chars().count();
            if chars >= MEMO_CHAR_LIMIT {
                return Err(SdkError::Config(format!(
                    "memo has {chars} characters, limit is {}",
                    MEMO_CHAR_LIMIT - 1
                )));
            }
        }
        Ok(Self {
            config,
            signer: None,
            leaves: Vec::new(),
            last: None,
        })
    }

    /// Sign every checkpoint with `keypair` under `key_id`.
    pub fn with_signer(mut self, key_id: impl Into<String>, keypair: Keypair) -> Self {
        self.signer = Some((key_id.into(), keypair));
        self
    }

    pub fn stream(&self) -> StreamRef {
        StreamRef::new(&self.config.registry, &self.config.log_id)
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Append an entry and return its leaf index.
    pub fn append(&mut self, entry: &Value) -> Result<u64> {
        let leaf = leaf_hash(entry)?;
        let index = self.leaves.len() as u64;
        self.leaves.push(leaf);
        debug!(stream = %self.stream().key(), index, leaf = %leaf, "appended entry");
        Ok(index)
    }

    pub fn tree_size(&self) -> u64 {
        self.leaves.len() as u64
    }

    /// Root over every entry appended so far.
    pub fn root(&self) -> Sha256Hash {
        root_from_leaf_hashes(&self.leaves)
    }

    /// Root of the most recent checkpoint, if any.
    pub fn last_checkpoint_root(&self) -> Option<&RootCommitment> {
        self.last.as_ref()
    }

    /// Issue a checkpoint over the current tree.
    ///
    /// The batch range is the half-open interval of leaves added since the
    /// previous checkpoint.
    pub fn checkpoint(&mut self) -> Result<Checkpoint> {
        let tree_size = self.tree_size();
        let root = RootCommitment::new(tree_size, &self.root());
        let start = self.last.as_ref().map_or(0, |r| r.tree_size);

        let mut checkpoint = Checkpoint::new(
            self.stream(),
            root.clone(),
            BatchRange {
                start,
                end: tree_size,
            },
        );
        if let Some(previous) = &self.last {
            checkpoint = checkpoint.with_previous(previous.clone());
        }
        if let Some((key_id, keypair)) = &self.signer {
            sign_checkpoint(keypair, key_id.clone(), &mut checkpoint)?;
        }

        debug!(
            stream = %checkpoint.stream_key(),
            tree_size,
            batch_start = start,
            batch_len = checkpoint.batch_range.len(),
            signed = checkpoint.is_signed(),
            "issued checkpoint"
        );
        self.last = Some(root);
        Ok(checkpoint)
    }

    /// Wrap a checkpoint in an envelope, offloading metadata that does not fit.
    pub fn envelope<F>(&self, checkpoint: &Checkpoint, offload: F) -> Result<Envelope>
    where
        F: FnOnce(&[u8]) -> std::result::Result<MetadataReference, EnvelopeError>,
    {
        Ok(Envelope::for_checkpoint(
            checkpoint,
            self.config.memo.clone(),
            self.config.max_envelope_bytes,
            offload,
        )?)
    }

    /// Inclusion proof for the leaf at `index` in the current tree.
    pub fn inclusion_proof(&self, index: u64) -> Result<InclusionProof> {
        let tree_size = self.tree_size();
        let out_of_range = || SdkError::OutOfRange {
            what: "leaf index",
            value: index,
            tree_size,
        };
        let position = usize::try_from(index).map_err(|_| out_of_range())?;
        let path = inclusion_path(position, &self.leaves).ok_or_else(out_of_range)?;
        Ok(InclusionProof::new(
            index,
            tree_size,
            &self.leaves[position],
            &path,
        ))
    }

    /// Consistency proof from the tree at `old_size` to the current tree.
    pub fn consistency_proof(&self, old_size: u64) -> Result<ConsistencyProof> {
        let tree_size = self.tree_size();
        let out_of_range = || SdkError::OutOfRange {
            what: "old tree size",
            value: old_size,
            tree_size,
        };
        let old = usize::try_from(old_size).map_err(|_| out_of_range())?;
        let path = consistency_path(old, &self.leaves).ok_or_else(out_of_range)?;
        Ok(ConsistencyProof::new(
            old_size,
            tree_size,
            &root_from_leaf_hashes(&self.leaves[..old]),
            &self.root(),
            &path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs27_checkpoint_core::{
        empty_root, validate_chain, validate_checkpoint, verify_checkpoint_signature,
    };
    use serde_json::json;

    fn publisher() -> Publisher {
        Publisher::new(PublisherConfig {
            registry: "0.0.900".into(),
            log_id: "events".into(),
            ..PublisherConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_requires_stream() {
        assert!(matches!(
            Publisher::new(PublisherConfig::default()),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_long_memo() {
        let config = |memo: String| PublisherConfig {
            registry: "0.0.900".into(),
            log_id: "events".into(),
            memo: Some(memo),
            ..PublisherConfig::default()
        };
        assert!(matches!(
            Publisher::new(config("m".repeat(300))),
            Err(SdkError::Config(_))
        ));

        let mut p = Publisher::new(config("m".repeat(299))).unwrap();
        p.append(&json!("x")).unwrap();
        let cp = p.checkpoint().unwrap();
        let envelope = p
            .envelope(&cp, |_| Err(EnvelopeError::Unresolved))
            .unwrap();
        let parsed = Envelope::parse(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.checkpoint().unwrap(), cp);
    }

    #[test]
    fn test_append_indices_and_root() {
        let mut p = publisher();
        assert_eq!(p.root(), empty_root());
        assert_eq!(p.append(&json!({"seq": 0})).unwrap(), 0);
        assert_eq!(p.append(&json!({"seq": 1})).unwrap(), 1);
        assert_eq!(p.tree_size(), 2);
        assert_eq!(
            p.root().to_hex(),
            "fc52d71a368a798fd96ec7e5b7ee5f8f9fdd10c7ff9ab146c4eac1e6a0a1b10a"
        );
    }

    #[test]
    fn test_checkpoints_link() {
        let mut p = publisher();
        for i in 0..3 {
            p.append(&json!({ "seq": i })).unwrap();
        }
        let first = p.checkpoint().unwrap();
        assert!(first.previous.is_none());
        assert_eq!(first.batch_range, BatchRange { start: 0, end: 3 });

        for i in 3..7 {
            p.append(&json!({ "seq": i })).unwrap();
        }
        let second = p.checkpoint().unwrap();
        assert_eq!(second.previous.as_ref(), Some(&first.root));
        assert_eq!(second.batch_range, BatchRange { start: 3, end: 7 });

        validate_checkpoint(&first).unwrap();
        validate_checkpoint(&second).unwrap();
        validate_chain(&[first, second]).unwrap();
    }

    #[test]
    fn test_empty_log_checkpoint() {
        let mut p = publisher();
        let cp = p.checkpoint().unwrap();
        assert_eq!(cp.root.tree_size, 0);
        assert_eq!(cp.root.root_hash().unwrap(), empty_root());
        validate_checkpoint(&cp).unwrap();
    }

    #[test]
    fn test_signed_checkpoints() {
        let keypair = Keypair::from_seed(&[8; 32]);
        let mut p = publisher().with_signer("log-key", keypair.clone());
        p.append(&json!("x")).unwrap();
        let cp = p.checkpoint().unwrap();
        verify_checkpoint_signature(&cp, &keypair.public_key()).unwrap();
    }

    #[test]
    fn test_proofs_verify_against_checkpoint() {
        let mut p = publisher();
        for i in 0..5 {
            p.append(&json!({ "seq": i })).unwrap();
        }
        let old = p.checkpoint().unwrap();
        for i in 5..12 {
            p.append(&json!({ "seq": i })).unwrap();
        }
        let new = p.checkpoint().unwrap();

        for i in 0..12 {
            let proof = p.inclusion_proof(i).unwrap();
            assert_eq!(proof.verify(&new.root.root_hash_b64u), Ok(true));
        }

        let proof = p.consistency_proof(5).unwrap();
        assert_eq!(proof.old_root, old.root.root_hash_b64u);
        assert_eq!(proof.new_root, new.root.root_hash_b64u);
        assert_eq!(proof.verify(), Ok(true));
    }

    #[test]
    fn test_proof_ranges() {
        let mut p = publisher();
        p.append(&json!(1)).unwrap();
        assert!(matches!(
            p.inclusion_proof(1),
            Err(SdkError::OutOfRange { .. })
        ));
        assert!(matches!(
            p.consistency_proof(2),
            Err(SdkError::OutOfRange { .. })
        ));
        assert!(p.consistency_proof(1).unwrap().path.is_empty());
    }

    #[test]
    fn test_envelope_with_memo() {
        let mut p = Publisher::new(PublisherConfig {
            registry: "0.0.900".into(),
            log_id: "events".into(),
            memo: Some("nightly".into()),
            ..PublisherConfig::default()
        })
        .unwrap();
        p.append(&json!("x")).unwrap();
        let cp = p.checkpoint().unwrap();
        let envelope = p
            .envelope(&cp, |_| Err(EnvelopeError::Unresolved))
            .unwrap();
        assert_eq!(envelope.m.as_deref(), Some("nightly"));
        assert_eq!(envelope.checkpoint().unwrap(), cp);
    }
}
