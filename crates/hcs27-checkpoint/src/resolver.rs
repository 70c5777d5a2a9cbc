//! Metadata resolvers: fetch externalized checkpoint metadata by reference.
//!
//! Resolvers only fetch bytes. The caller checks them against the envelope's
//! declared digest before trusting them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use hcs27_checkpoint_core::{MetadataReference, Sha256Hash};

use crate::error::{Result, SdkError};

/// Scheme used by [`MemoryResolver`] references.
pub const MEMORY_SCHEME: &str = "memory";

/// Turns a `scheme://1/<locator>` reference into the stored bytes.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<Bytes>;
}

#[async_trait]
impl<R: MetadataResolver + ?Sized> MetadataResolver for Arc<R> {
    async fn resolve(&self, reference: &str) -> Result<Bytes> {
        (**self).resolve(reference).await
    }
}

/// In-memory, content-addressed blob store.
///
/// Blobs are keyed as `memory://1/<sha256-hex>`. All data is lost when the
/// resolver is dropped.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under their content address and return the reference.
    pub fn insert(&self, bytes: impl Into<Bytes>) -> MetadataReference {
        let bytes = bytes.into();
        let reference = MetadataReference::new(MEMORY_SCHEME, Sha256Hash::hash(&bytes).to_hex());
        self.insert_at(&reference, bytes);
        reference
    }

    /// Store `bytes` under an arbitrary reference.
    pub fn insert_at(&self, reference: &MetadataReference, bytes: impl Into<Bytes>) {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.to_string(), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetadataResolver for MemoryResolver {
    async fn resolve(&self, reference: &str) -> Result<Bytes> {
        let parsed: MetadataReference = reference.parse()?;
        if parsed.scheme != MEMORY_SCHEME {
            return Err(SdkError::Resolve {
                reference: reference.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme),
            });
        }

        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| SdkError::Resolve {
                reference: reference.to_string(),
                reason: "not found".to_string(),
            })
    }
}
