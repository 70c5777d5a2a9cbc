//! The `hcs-27` register envelope that carries checkpoint metadata.
//!
//! Metadata travels inline as a JSON object when the serialized envelope
//! fits the size limit. Otherwise it is stored elsewhere and the envelope
//! carries a `scheme://1/<locator>` reference plus a mandatory SHA-256
//! digest of the stored bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::canonical::canonical_bytes;
use crate::checkpoint::Checkpoint;
use crate::crypto::Sha256Hash;
use crate::error::EnvelopeError;

/// Protocol tag in `p`.
pub const PROTOCOL: &str = "hcs-27";

/// The only supported operation.
pub const OP_REGISTER: &str = "register";

/// Default upper bound on the serialized envelope.
pub const MAX_ENVELOPE_BYTES: usize = 1024;

/// Memos must be shorter than this many characters.
pub const MEMO_CHAR_LIMIT: usize = 300;

/// Digest algorithm name in `metadata_digest.alg`.
pub const DIGEST_ALGORITHM: &str = "sha-256";

/// Reference format version, the segment after `scheme://`.
pub const REFERENCE_VERSION: &str = "1";

/// Declared digest of the metadata bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDigest {
    pub alg: String,
    pub b64u: String,
}

impl MetadataDigest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self {
            alg: DIGEST_ALGORITHM.to_string(),
            b64u: Sha256Hash::hash(bytes).to_base64url(),
        }
    }

    /// Check that `bytes` hash to the declared digest.
    pub fn verify(&self, bytes: &[u8]) -> Result<(), EnvelopeError> {
        if self.alg != DIGEST_ALGORITHM {
            return Err(EnvelopeError::UnsupportedDigestAlgorithm(self.alg.clone()));
        }
        let computed = Sha256Hash::hash(bytes);
        match Sha256Hash::from_base64(&self.b64u) {
            Ok(declared) if declared == computed => Ok(()),
            _ => Err(EnvelopeError::DigestMismatch {
                declared: self.b64u.clone(),
                computed: computed.to_base64url(),
            }),
        }
    }
}

/// A parsed `scheme://1/<locator>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataReference {
    pub scheme: String,
    pub locator: String,
}

impl MetadataReference {
    pub fn new(scheme: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            locator: locator.into(),
        }
    }
}

impl FromStr for MetadataReference {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EnvelopeError::InvalidReference(s.to_string());

        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(invalid());
        }

        let (version, locator) = rest.split_once('/').ok_or_else(invalid)?;
        if version != REFERENCE_VERSION || locator.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(scheme, locator))
    }
}

impl fmt::Display for MetadataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, REFERENCE_VERSION, self.locator)
    }
}

/// Envelope metadata: an inline object or a reference string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Reference(String),
    Inline(Value),
}

/// An `hcs-27` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub p: String,
    pub op: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_digest: Option<MetadataDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<String>,
}

impl Envelope {
    /// Envelope with the checkpoint inline.
    pub fn inline(checkpoint: &Checkpoint, memo: Option<String>) -> Result<Self, EnvelopeError> {
        Ok(Self {
            p: PROTOCOL.to_string(),
            op: OP_REGISTER.to_string(),
            metadata: Metadata::Inline(checkpoint.to_json()?),
            metadata_digest: None,
            m: memo,
        })
    }

    /// Envelope pointing at externally stored metadata bytes.
    pub fn referenced(
        reference: &MetadataReference,
        metadata_bytes: &[u8],
        memo: Option<String>,
    ) -> Self {
        Self {
            p: PROTOCOL.to_string(),
            op: OP_REGISTER.to_string(),
            metadata: Metadata::Reference(reference.to_string()),
            metadata_digest: Some(MetadataDigest::of_bytes(metadata_bytes)),
            m: memo,
        }
    }

    /// Build an envelope for `checkpoint`, inline if it fits in `max_bytes`.
    ///
    /// Otherwise `offload` receives the canonical metadata bytes, stores them,
    /// and returns the reference to embed.
    pub fn for_checkpoint<F>(
        checkpoint: &Checkpoint,
        memo: Option<String>,
        max_bytes: usize,
        offload: F,
    ) -> Result<Self, EnvelopeError>
    where
        F: FnOnce(&[u8]) -> Result<MetadataReference, EnvelopeError>,
    {
        let inline = Self::inline(checkpoint, memo.clone())?;
        inline.validate()?;
        if inline.to_bytes()?.len() <= max_bytes {
            return Ok(inline);
        }

        let bytes = checkpoint.canonical_bytes()?;
        let reference = offload(&bytes)?;
        let envelope = Self::referenced(&reference, &bytes, memo);
        envelope.validate()?;

        let size = envelope.to_bytes()?.len();
        if size > max_bytes {
            return Err(EnvelopeError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(envelope)
    }

    /// Parse and validate an envelope with the default size limit.
    pub fn parse(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Self::parse_with_limit(bytes, MAX_ENVELOPE_BYTES)
    }

    pub fn parse_with_limit(bytes: &[u8], max_bytes: usize) -> Result<Self, EnvelopeError> {
        if bytes.len() > max_bytes {
            return Err(EnvelopeError::TooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }
        let envelope: Self =
            serde_json::from_slice(bytes).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Compact JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Check protocol fields, memo length and metadata shape.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.p != PROTOCOL {
            return Err(EnvelopeError::UnsupportedProtocol(self.p.clone()));
        }
        if self.op != OP_REGISTER {
            return Err(EnvelopeError::UnsupportedOperation(self.op.clone()));
        }
        if let Some(memo) = &self.m {
            let chars = memo.chars().count();
            if chars >= MEMO_CHAR_LIMIT {
                return Err(EnvelopeError::MemoTooLong(chars));
            }
        }
        if let Some(digest) = &self.metadata_digest {
            if digest.alg != DIGEST_ALGORITHM {
                return Err(EnvelopeError::UnsupportedDigestAlgorithm(digest.alg.clone()));
            }
        }

        match &self.metadata {
            Metadata::Reference(reference) => {
                reference.parse::<MetadataReference>()?;
                if self.metadata_digest.is_none() {
                    return Err(EnvelopeError::MissingDigest);
                }
            }
            Metadata::Inline(value) => {
                if !value.is_object() {
                    return Err(EnvelopeError::Malformed(
                        "inline metadata must be an object".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The metadata reference, if the metadata is not inline.
    pub fn reference(&self) -> Result<Option<MetadataReference>, EnvelopeError> {
        match &self.metadata {
            Metadata::Reference(r) => r.parse().map(Some),
            Metadata::Inline(_) => Ok(None),
        }
    }

    /// The inline checkpoint. A declared digest is checked against the
    /// canonical bytes of the inline object.
    pub fn checkpoint(&self) -> Result<Checkpoint, EnvelopeError> {
        let value = match &self.metadata {
            Metadata::Inline(value) => value,
            Metadata::Reference(_) => return Err(EnvelopeError::Unresolved),
        };
        if let Some(digest) = &self.metadata_digest {
            digest.verify(&canonical_bytes(value)?)?;
        }
        Ok(Checkpoint::from_json(value)?)
    }

    /// The checkpoint from resolved reference bytes, after the digest check.
    pub fn checkpoint_from_resolved(&self, bytes: &[u8]) -> Result<Checkpoint, EnvelopeError> {
        let digest = self
            .metadata_digest
            .as_ref()
            .ok_or(EnvelopeError::MissingDigest)?;
        digest.verify(bytes)?;
        Ok(Checkpoint::from_slice(bytes)?)
    }
}
