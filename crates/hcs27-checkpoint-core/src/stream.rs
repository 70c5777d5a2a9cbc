//! Stream: the ordered series of checkpoints published for one log.
//!
//! A stream is identified by `(registry, logId)` and keyed as
//! `registry::logId`. Within a stream the tree size never shrinks and each
//! checkpoint after the first names its predecessor's root as `previous`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::checkpoint::{Checkpoint, RootCommitment};
use crate::error::ChainError;

/// The `stream` object inside checkpoint metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRef {
    pub registry: String,
    pub log_id: String,
}

impl StreamRef {
    pub fn new(registry: impl Into<String>, log_id: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            log_id: log_id.into(),
        }
    }

    pub fn key(&self) -> StreamKey {
        StreamKey::from(self)
    }
}

/// Map key for per-stream state. Displays as `registry::logId`.
///
/// The two parts stay separate, so `("a::b", "c")` and `("a", "b::c")` are
/// different streams even though they display alike.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamKey {
    registry: String,
    log_id: String,
}

impl StreamKey {
    pub fn new(registry: &str, log_id: &str) -> Self {
        Self {
            registry: registry.to_string(),
            log_id: log_id.to_string(),
        }
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }
}

impl fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamKey({self})")
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.registry, self.log_id)
    }
}

impl From<&StreamRef> for StreamKey {
    fn from(stream: &StreamRef) -> Self {
        Self::new(&stream.registry, &stream.log_id)
    }
}

/// What happened when a checkpoint was recorded against a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The tree grew.
    Extended { from: u64, to: u64 },
    /// Same tree size as the last checkpoint.
    Unchanged,
}

/// Last accepted root of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamState {
    pub key: StreamKey,
    pub head: RootCommitment,
    /// Checkpoints accepted so far, including the first.
    pub checkpoints: u64,
}

impl StreamState {
    /// State after the first checkpoint of a stream.
    pub fn new(checkpoint: &Checkpoint) -> Self {
        Self {
            key: checkpoint.stream_key(),
            head: checkpoint.root.clone(),
            checkpoints: 1,
        }
    }

    /// Check that `next` may follow the current head. Does not mutate.
    pub fn check_next(&self, next: &Checkpoint) -> Result<(), ChainError> {
        let last = &self.head;
        let current = next.root.tree_size;

        if current < last.tree_size {
            return Err(ChainError::TreeSizeRegression {
                stream: self.key.to_string(),
                last: last.tree_size,
                current,
            });
        }

        let previous = next
            .previous
            .as_ref()
            .ok_or_else(|| ChainError::MissingPrevious {
                stream: self.key.to_string(),
                tree_size: current,
            })?;

        if previous.tree_size != last.tree_size || previous.root_hash_b64u != last.root_hash_b64u {
            return Err(ChainError::PreviousMismatch {
                stream: self.key.to_string(),
                expected_tree_size: last.tree_size,
                expected_root: last.root_hash_b64u.clone(),
                got_tree_size: previous.tree_size,
                got_root: previous.root_hash_b64u.clone(),
            });
        }

        Ok(())
    }

    /// Check `next` and, if it links, make its root the new head.
    pub fn advance(&mut self, next: &Checkpoint) -> Result<Advance, ChainError> {
        self.check_next(next)?;

        let from = self.head.tree_size;
        let to = next.root.tree_size;
        self.head = next.root.clone();
        self.checkpoints += 1;

        Ok(if to > from {
            Advance::Extended { from, to }
        } else {
            Advance::Unchanged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::BatchRange;
    use crate::crypto::Sha256Hash;

    fn root(n: u64) -> RootCommitment {
        RootCommitment::new(n, &Sha256Hash::hash(&n.to_be_bytes()))
    }

    fn checkpoint(size: u64, previous: Option<u64>) -> Checkpoint {
        let cp = Checkpoint::new(
            StreamRef::new("reg", "log"),
            root(size),
            BatchRange {
                start: previous.unwrap_or(0),
                end: size,
            },
        );
        match previous {
            Some(p) => cp.with_previous(root(p)),
            None => cp,
        }
    }

    #[test]
    fn test_stream_key_format() {
        let key = StreamRef::new("0.0.42", "main").key();
        assert_eq!(key.to_string(), "0.0.42::main");
        assert_eq!(key, StreamKey::new("0.0.42", "main"));
        assert_ne!(key, StreamKey::new("0.0.42", "other"));
        assert_eq!(key.registry(), "0.0.42");
        assert_eq!(key.log_id(), "main");
    }

    #[test]
    fn test_stream_key_parts_stay_separate() {
        let left = StreamKey::new("a::b", "c");
        let right = StreamKey::new("a", "b::c");
        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);
    }

    #[test]
    fn test_advance_extends() {
        let mut state = StreamState::new(&checkpoint(5, None));
        assert_eq!(
            state.advance(&checkpoint(10, Some(5))),
            Ok(Advance::Extended { from: 5, to: 10 })
        );
        assert_eq!(state.head, root(10));
        assert_eq!(state.checkpoints, 2);
    }

    #[test]
    fn test_advance_unchanged_size() {
        let mut state = StreamState::new(&checkpoint(5, None));
        assert_eq!(state.advance(&checkpoint(5, Some(5))), Ok(Advance::Unchanged));
    }

    #[test]
    fn test_regression() {
        let state = StreamState::new(&checkpoint(5, None));
        assert_eq!(
            state.check_next(&checkpoint(3, Some(5))),
            Err(ChainError::TreeSizeRegression {
                stream: "reg::log".into(),
                last: 5,
                current: 3
            })
        );
    }

    #[test]
    fn test_missing_previous() {
        let state = StreamState::new(&checkpoint(5, None));
        assert_eq!(
            state.check_next(&checkpoint(10, None)),
            Err(ChainError::MissingPrevious {
                stream: "reg::log".into(),
                tree_size: 10
            })
        );
    }

    #[test]
    fn test_previous_mismatch_leaves_head() {
        let mut state = StreamState::new(&checkpoint(5, None));
        let err = state.advance(&checkpoint(10, Some(4))).unwrap_err();
        assert!(matches!(
            err,
            ChainError::PreviousMismatch {
                expected_tree_size: 5,
                got_tree_size: 4,
                ..
            }
        ));
        assert_eq!(state.head, root(5));
        assert_eq!(state.checkpoints, 1);
    }

    #[test]
    fn test_previous_root_compared_exactly() {
        let state = StreamState::new(&checkpoint(5, None));
        let mut next = checkpoint(10, Some(5));
        // Same digest, padded standard alphabet: still a mismatch.
        let prev = next.previous.as_mut().unwrap();
        prev.root_hash_b64u = Sha256Hash::hash(&5u64.to_be_bytes()).to_base64();
        assert!(matches!(
            state.check_next(&next),
            Err(ChainError::PreviousMismatch { .. })
        ));
    }
}
