//! Golden test vectors for deterministic verification.
//!
//! These vectors ensure that canonical encoding, leaf hashing and tree
//! construction produce identical results across all implementations.

use serde_json::{json, Value};

use hcs27_checkpoint_core::{canonical_bytes, leaf_hash, merkle_tree_hash};

/// Canonical bytes and leaf hash of a single entry.
#[derive(Debug, Clone)]
pub struct LeafVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The entry.
    pub entry: Value,
    /// Expected canonical encoding.
    pub canonical: &'static str,
    /// Expected leaf hash (hex).
    pub leaf_hash: &'static str,
}

/// Merkle root over an ordered list of entries.
#[derive(Debug, Clone)]
pub struct RootVector {
    pub name: String,
    pub entries: Vec<Value>,
    /// Expected root (hex).
    pub root: &'static str,
}

/// Roots over `{"seq": i}` for `i in 0..n`, indexed by `n`.
pub const SEQ_ROOTS: [&str; 9] = [
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    "a402b0e36f5aae85457360fcf00a2545b87dd47f310553e7b0d32d6d0ac4400d",
    "fc52d71a368a798fd96ec7e5b7ee5f8f9fdd10c7ff9ab146c4eac1e6a0a1b10a",
    "3db67665eea8c26de341668c1d3199f61de4b780a828569a898ce48c28d931f3",
    "9d413f59a025283f9dfd05c5ceda276952a677a1a4c07dce14a68888fe776ac6",
    "147dc477479a3b69a24b1ff601b6fc6284fdf15fd50abfeb0cf70ea8e3722c1d",
    "01c6ed192f8b92a44d3bdf0757363e2442c14bf9609a870fdaa4b8a1e98da85b",
    "12f2808bca4c4a1a053170a3bc4b02bb3e83fe0bf854e42c75b3502fb9aa95a2",
    "b9c377f91dac312b36ca40d1f3a4428539a8719064819739f4160478d3d0143b",
];

/// `{"seq": i}` for `i in 0..n`.
pub fn seq_entries(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({ "seq": i })).collect()
}

/// Get all leaf vectors.
pub fn leaf_vectors() -> Vec<LeafVector> {
    vec![
        LeafVector {
            name: "string a",
            entry: json!("a"),
            canonical: r#""a""#,
            leaf_hash: "e443647f05b717a6cd8ce6095b83b61f2272f1a18c0220be64b7fd584f4851be",
        },
        LeafVector {
            name: "string b",
            entry: json!("b"),
            canonical: r#""b""#,
            leaf_hash: "02e7d86ec7265b35eacec1b50f1574fcdeff5bff27829a147005ed7cda79b509",
        },
        LeafVector {
            name: "nested object with unsorted keys",
            entry: json!({"nested": {"z": [1, "x", null, true], "y": false}, "b": 2, "a": 1}),
            canonical: r#"{"a":1,"b":2,"nested":{"y":false,"z":[1,"x",null,true]}}"#,
            leaf_hash: "6303d1e85cb6ea2747627a0aef01b271deaa782877800135d84cd7f2cb4d2be6",
        },
    ]
}

/// Get all root vectors.
pub fn root_vectors() -> Vec<RootVector> {
    let mut vectors: Vec<RootVector> = SEQ_ROOTS
        .iter()
        .enumerate()
        .map(|(n, &root)| RootVector {
            name: format!("seq entries, n = {n}"),
            entries: seq_entries(n),
            root,
        })
        .collect();

    vectors.push(RootVector {
        name: "two strings".to_string(),
        entries: vec![json!("a"), json!("b")],
        root: "fc692d1c7f1f6ea6759aaabf3050f8adab4d25b65fd9198f05832087fe1c35d2",
    });
    vectors
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, computed)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let leaves = leaf_vectors().into_iter().map(|v| {
        let canonical = canonical_bytes(&v.entry).unwrap_or_default();
        let computed = leaf_hash(&v.entry).map(|h| h.to_hex()).unwrap_or_default();
        let matches = canonical == v.canonical.as_bytes() && computed == v.leaf_hash;
        (v.name.to_string(), matches, computed)
    });

    let roots = root_vectors().into_iter().map(|v| {
        let computed = merkle_tree_hash(&v.entries)
            .map(|h| h.to_hex())
            .unwrap_or_default();
        let matches = computed == v.root;
        (v.name, matches, computed)
    });

    leaves.chain(roots).collect()
}
