//! Checkpoint validation: structural checks and per-stream chain linkage.

use std::collections::BTreeMap;

use crate::checkpoint::{Checkpoint, CHECKPOINT_TYPE, LOG_ALGORITHM};
use crate::error::{ChainError, CheckpointError, ProofInputError};
use crate::proof::verify_consistency;
use crate::stream::{Advance, StreamKey, StreamState};

/// Validate a checkpoint's structure (without stream context or signature).
///
/// This performs:
/// - Type tag and log algorithm check
/// - Non-empty stream fields
/// - Root and previous hashes decode to 32 bytes
/// - `previous.treeSize <= root.treeSize`
/// - `batchRange.start <= batchRange.end <= root.treeSize`
pub fn validate_checkpoint(checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    if checkpoint.kind != CHECKPOINT_TYPE {
        return Err(CheckpointError::UnsupportedType(checkpoint.kind.clone()));
    }

    if checkpoint.log.algorithm != LOG_ALGORITHM {
        return Err(CheckpointError::UnsupportedAlgorithm(
            checkpoint.log.algorithm.clone(),
        ));
    }

    if checkpoint.stream.registry.is_empty() {
        return Err(CheckpointError::EmptyStreamField("registry"));
    }
    if checkpoint.stream.log_id.is_empty() {
        return Err(CheckpointError::EmptyStreamField("logId"));
    }

    checkpoint
        .root
        .root_hash()
        .map_err(|source| CheckpointError::InvalidRootHash {
            field: "root",
            source,
        })?;

    if let Some(previous) = &checkpoint.previous {
        previous
            .root_hash()
            .map_err(|source| CheckpointError::InvalidRootHash {
                field: "previous",
                source,
            })?;

        if previous.tree_size > checkpoint.root.tree_size {
            return Err(CheckpointError::PreviousExceedsRoot {
                previous: previous.tree_size,
                root: checkpoint.root.tree_size,
            });
        }
    }

    let range = checkpoint.batch_range;
    if range.start > range.end || range.end > checkpoint.root.tree_size {
        return Err(CheckpointError::InvalidBatchRange {
            start: range.start,
            end: range.end,
            tree_size: checkpoint.root.tree_size,
        });
    }

    Ok(())
}

/// Incremental linkage checker over many streams.
///
/// Feed checkpoints in per-stream publication order. Streams are independent;
/// interleaving between streams does not matter.
#[derive(Debug, Clone, Default)]
pub struct ChainValidator {
    streams: BTreeMap<StreamKey, StreamState>,
}

impl ChainValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from previously accepted stream states.
    pub fn with_states(states: impl IntoIterator<Item = StreamState>) -> Self {
        Self {
            streams: states.into_iter().map(|s| (s.key.clone(), s)).collect(),
        }
    }

    /// Check linkage without recording anything.
    pub fn check(&self, checkpoint: &Checkpoint) -> Result<(), ChainError> {
        match self.streams.get(&checkpoint.stream_key()) {
            Some(state) => state.check_next(checkpoint),
            None => Ok(()),
        }
    }

    /// Check linkage and record the checkpoint's root as its stream's head.
    ///
    /// Returns `None` for the first checkpoint of a stream.
    pub fn apply(&mut self, checkpoint: &Checkpoint) -> Result<Option<Advance>, ChainError> {
        let key = checkpoint.stream_key();
        match self.streams.get_mut(&key) {
            Some(state) => state.advance(checkpoint).map(Some),
            None => {
                self.streams.insert(key, StreamState::new(checkpoint));
                Ok(None)
            }
        }
    }

    pub fn state(&self, key: &StreamKey) -> Option<&StreamState> {
        self.streams.get(key)
    }

    /// All known streams, ordered by key.
    pub fn states(&self) -> impl Iterator<Item = &StreamState> {
        self.streams.values()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Validate linkage across a batch of checkpoints in publication order.
///
/// Stops at the first violation. No proofs are run.
pub fn validate_chain(records: &[Checkpoint]) -> Result<(), ChainError> {
    let mut validator = ChainValidator::new();
    for record in records {
        validator.apply(record)?;
    }
    Ok(())
}

/// Check that `next` extends `prev` using a consistency proof.
///
/// Checkpoints from different streams are never consistent.
pub fn verify_checkpoint_consistency(
    prev: &Checkpoint,
    next: &Checkpoint,
    path: &[String],
) -> Result<bool, ProofInputError> {
    if prev.stream != next.stream {
        return Ok(false);
    }
    verify_consistency(
        prev.root.tree_size,
        next.root.tree_size,
        &prev.root.root_hash_b64u,
        &next.root.root_hash_b64u,
        path,
    )
}
