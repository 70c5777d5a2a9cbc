//! Checkpoint metadata: one signed commitment to a stream's Merkle root.
//!
//! The JSON form uses camelCase field names. Tree sizes and batch bounds
//! accept either JSON numbers or decimal strings, since publishers that
//! cannot represent 64-bit integers natively send them as strings.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::canonical::canonical_bytes_of;
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair, Sha256Hash};
use crate::error::CheckpointError;
use crate::stream::{StreamKey, StreamRef};

/// The `type` tag carried by every checkpoint.
pub const CHECKPOINT_TYPE: &str = "ans-checkpoint-v1";

/// The only supported log hash algorithm.
pub const LOG_ALGORITHM: &str = "sha-256";

/// Default leaf profile: SHA-256 over canonical JSON of each event.
pub const DEFAULT_LEAF_PROFILE: &str = "sha256(jcs(event))";

/// Default tree construction profile.
pub const DEFAULT_MERKLE_PROFILE: &str = "rfc9162";

/// The only supported signature algorithm.
pub const SIGNATURE_ALGORITHM: &str = "ed25519";

/// Prefix mixed into every signed checkpoint message.
pub const SIGNATURE_DOMAIN: &[u8] = b"hcs-27/checkpoint-sig/v1\n";

/// How the log hashes leaves and builds its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogProfile {
    pub algorithm: String,
    pub leaf: String,
    pub merkle: String,
}

impl Default for LogProfile {
    fn default() -> Self {
        Self {
            algorithm: LOG_ALGORITHM.to_string(),
            leaf: DEFAULT_LEAF_PROFILE.to_string(),
            merkle: DEFAULT_MERKLE_PROFILE.to_string(),
        }
    }
}

/// A tree size paired with the root hash at that size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCommitment {
    #[serde(deserialize_with = "lenient_u64")]
    pub tree_size: u64,
    /// Unpadded base64url root hash.
    pub root_hash_b64u: String,
}

impl RootCommitment {
    pub fn new(tree_size: u64, root: &Sha256Hash) -> Self {
        Self {
            tree_size,
            root_hash_b64u: root.to_base64url(),
        }
    }

    /// Decode the root hash.
    pub fn root_hash(&self) -> Result<Sha256Hash, crate::error::DigestError> {
        Sha256Hash::from_base64(&self.root_hash_b64u)
    }
}

/// Half-open leaf range `[start, end)` newly covered by a checkpoint:
/// `start` is the previous tree size and `end` the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    #[serde(deserialize_with = "lenient_u64")]
    pub start: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub end: u64,
}

impl BatchRange {
    /// Number of leaves in the batch.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Detached signature over a checkpoint's canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSignature {
    pub algorithm: String,
    pub key_id: String,
    pub b64u: String,
}

/// Checkpoint metadata as published on a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub stream: StreamRef,
    pub log: LogProfile,
    pub root: RootCommitment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<RootCommitment>,
    pub batch_range: BatchRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<CheckpointSignature>,
}

impl Checkpoint {
    /// An unsigned checkpoint with the default log profile and no previous.
    pub fn new(stream: StreamRef, root: RootCommitment, batch_range: BatchRange) -> Self {
        Self {
            kind: CHECKPOINT_TYPE.to_string(),
            stream,
            log: LogProfile::default(),
            root,
            previous: None,
            batch_range,
            signature: None,
        }
    }

    pub fn with_previous(mut self, previous: RootCommitment) -> Self {
        self.previous = Some(previous);
        self
    }

    /// `registry::logId` for this checkpoint's stream.
    pub fn stream_key(&self) -> StreamKey {
        self.stream.key()
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Malformed(e.to_string()))
    }

    pub fn from_json(value: &Value) -> Result<Self, CheckpointError> {
        Self::deserialize(value).map_err(|e| CheckpointError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Value, CheckpointError> {
        serde_json::to_value(self).map_err(|e| CheckpointError::Malformed(e.to_string()))
    }

    /// Canonical JSON bytes of the full checkpoint, signature included.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(canonical_bytes_of(self)?)
    }

    /// The message a signature covers: domain prefix, then the canonical
    /// bytes of the checkpoint with its signature removed.
    pub fn signing_message(&self) -> Result<Vec<u8>, CheckpointError> {
        let unsigned = Self {
            signature: None,
            ..self.clone()
        };
        let body = canonical_bytes_of(&unsigned)?;

        let mut message = Vec::with_capacity(SIGNATURE_DOMAIN.len() + body.len());
        message.extend_from_slice(SIGNATURE_DOMAIN);
        message.extend_from_slice(&body);
        Ok(message)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Sign `checkpoint` in place, replacing any existing signature.
pub fn sign_checkpoint(
    keypair: &Keypair,
    key_id: impl Into<String>,
    checkpoint: &mut Checkpoint,
) -> Result<(), CheckpointError> {
    let message = checkpoint.signing_message()?;
    let signature = keypair.sign(&message);
    checkpoint.signature = Some(CheckpointSignature {
        algorithm: SIGNATURE_ALGORITHM.to_string(),
        key_id: key_id.into(),
        b64u: signature.to_base64url(),
    });
    Ok(())
}

/// Check the checkpoint's signature against `public_key`.
pub fn verify_checkpoint_signature(
    checkpoint: &Checkpoint,
    public_key: &Ed25519PublicKey,
) -> Result<(), CheckpointError> {
    let sig = checkpoint
        .signature
        .as_ref()
        .ok_or(CheckpointError::MissingSignature)?;

    if sig.algorithm != SIGNATURE_ALGORITHM {
        return Err(CheckpointError::UnsupportedSignatureAlgorithm(
            sig.algorithm.clone(),
        ));
    }

    let signature = Ed25519Signature::from_base64(&sig.b64u)?;
    let message = checkpoint.signing_message()?;
    public_key.verify(&message, &signature)
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got {s:?}"))),
    }
}
