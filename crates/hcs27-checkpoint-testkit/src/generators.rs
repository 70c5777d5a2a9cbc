//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use hcs27_checkpoint::{Publisher, PublisherConfig, Result};
use hcs27_checkpoint_core::{leaf_hash_bytes, Checkpoint, Keypair, Sha256Hash};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random digest.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash::from_bytes)
}

/// Generate a list of leaf hashes, at least `min` long.
pub fn leaf_hashes(min: usize, max: usize) -> impl Strategy<Value = Vec<Sha256Hash>> {
    prop::collection::vec(any::<[u8; 8]>(), min..=max)
        .prop_map(|seeds| seeds.iter().map(|s| leaf_hash_bytes(s)).collect())
}

/// Generate a scalar JSON value. Floats are left out so that values survive
/// a parse of their canonical form unchanged.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        "[a-zA-Z0-9 _\\-\"\\\\\u{e9}\u{1f600}]{0,16}".prop_map(Value::from),
    ]
}

/// Generate a JSON entry: scalars nested in arrays and objects.
pub fn json_entry() -> impl Strategy<Value = Value> {
    json_scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a list of entries.
pub fn entries(max_len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(json_entry(), 0..=max_len)
}

/// Generate a log id.
pub fn log_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Parameters for generating a linked checkpoint chain.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub seed: [u8; 32],
    pub log_id: String,
    /// Entries appended before each checkpoint.
    pub batches: Vec<usize>,
    pub signed: bool,
}

impl Arbitrary for ChainParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            log_id(),
            prop::collection::vec(0usize..6, 1..6),
            any::<bool>(),
        )
            .prop_map(|(seed, log_id, batches, signed)| ChainParams {
                seed,
                log_id,
                batches,
                signed,
            })
            .boxed()
    }
}

/// Build the checkpoint chain described by `params`.
pub fn chain_from_params(params: &ChainParams) -> Result<Vec<Checkpoint>> {
    let mut publisher = Publisher::new(PublisherConfig {
        registry: "0.0.77".to_string(),
        log_id: params.log_id.clone(),
        ..PublisherConfig::default()
    })?;
    if params.signed {
        publisher = publisher.with_signer("gen", Keypair::from_seed(&params.seed));
    }

    let mut chain = Vec::with_capacity(params.batches.len());
    for &batch in &params.batches {
        for _ in 0..batch {
            let seq = publisher.tree_size();
            publisher.append(&serde_json::json!({ "seq": seq }))?;
        }
        chain.push(publisher.checkpoint()?);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs27_checkpoint_core::{
        canonical_bytes, consistency_path, inclusion_path, leaf_hash, merkle_tree_hash,
        root_from_leaf_hashes, validate_chain, validate_checkpoint, verify_checkpoint_signature,
        verify_consistency_hashes, verify_inclusion_hashes, ChainError,
    };

    proptest! {
        #[test]
        fn test_root_deterministic(entries in entries(12)) {
            prop_assert_eq!(
                merkle_tree_hash(&entries).unwrap(),
                merkle_tree_hash(&entries).unwrap()
            );
        }

        #[test]
        fn test_canonical_form_reparses(entry in json_entry()) {
            let bytes = canonical_bytes(&entry).unwrap();
            let reparsed: Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(&reparsed, &entry);
            // Canonicalizing twice is stable.
            prop_assert_eq!(canonical_bytes(&reparsed).unwrap(), bytes);
        }

        #[test]
        fn test_leaf_hash_ignores_source_key_order(entry in json_entry()) {
            let text = serde_json::to_string(&entry).unwrap();
            let reparsed: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(leaf_hash(&entry).unwrap(), leaf_hash(&reparsed).unwrap());
        }

        #[test]
        fn test_inclusion_proofs_verify(leaves in leaf_hashes(1, 40), pick in any::<prop::sample::Index>()) {
            let root = root_from_leaf_hashes(&leaves);
            let index = pick.index(leaves.len());
            let path = inclusion_path(index, &leaves).unwrap();
            prop_assert_eq!(
                verify_inclusion_hashes(index as u64, leaves.len() as u64, &leaves[index], &path, &root),
                Ok(true)
            );
        }

        #[test]
        fn test_inclusion_rejects_wrong_leaf(
            leaves in leaf_hashes(2, 40),
            pick in any::<prop::sample::Index>(),
            other in sha256_hash(),
        ) {
            let root = root_from_leaf_hashes(&leaves);
            let index = pick.index(leaves.len());
            prop_assume!(other != leaves[index]);
            let path = inclusion_path(index, &leaves).unwrap();
            prop_assert_eq!(
                verify_inclusion_hashes(index as u64, leaves.len() as u64, &other, &path, &root),
                Ok(false)
            );
        }

        #[test]
        fn test_consistency_proofs_verify(leaves in leaf_hashes(1, 40), pick in any::<prop::sample::Index>()) {
            let old_size = pick.index(leaves.len()) + 1;
            let path = consistency_path(old_size, &leaves).unwrap();
            prop_assert!(verify_consistency_hashes(
                old_size as u64,
                leaves.len() as u64,
                &root_from_leaf_hashes(&leaves[..old_size]),
                &root_from_leaf_hashes(&leaves),
                &path,
            ));
        }

        #[test]
        fn test_consistency_rejects_rewritten_prefix(
            leaves in leaf_hashes(2, 40),
            pick in any::<prop::sample::Index>(),
            replacement in sha256_hash(),
        ) {
            let old_size = pick.index(leaves.len() - 1) + 1;
            prop_assume!(replacement != leaves[0]);

            let mut forged = leaves[..old_size].to_vec();
            forged[0] = replacement;

            let path = consistency_path(old_size, &leaves).unwrap();
            prop_assert!(!verify_consistency_hashes(
                old_size as u64,
                leaves.len() as u64,
                &root_from_leaf_hashes(&forged),
                &root_from_leaf_hashes(&leaves),
                &path,
            ));
        }

        #[test]
        fn test_generated_chains_validate(params: ChainParams) {
            let chain = chain_from_params(&params).unwrap();
            for checkpoint in &chain {
                prop_assert!(validate_checkpoint(checkpoint).is_ok());
                if params.signed {
                    let pk = Keypair::from_seed(&params.seed).public_key();
                    prop_assert!(verify_checkpoint_signature(checkpoint, &pk).is_ok());
                }
            }
            prop_assert_eq!(validate_chain(&chain), Ok(()));
        }

        #[test]
        fn test_dropped_link_detected(params: ChainParams) {
            let mut chain = chain_from_params(&params).unwrap();
            prop_assume!(chain.len() >= 3);
            // Skip the middle checkpoint: the last one now names a root the
            // validator never saw.
            let last = chain.pop().unwrap();
            chain.pop();
            prop_assume!(chain.last().map(|c| &c.root) != last.previous.as_ref());
            chain.push(last);

            let is_mismatch = matches!(
                validate_chain(&chain),
                Err(ChainError::PreviousMismatch { .. })
            );
            prop_assert!(is_mismatch);
        }
    }
}
