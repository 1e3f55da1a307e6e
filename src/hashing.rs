//! Plan Fingerprints and Variant Keys
//!
//! A build manifest records the plan it came from as the SHA-256 of its
//! canonical JSON, so reformatting a plan file or reordering its keys leaves
//! the fingerprint unchanged. Exported `.magdoc` and `.pdf` files are
//! recorded by the digest of their bytes. The variant generator derives its
//! page order and template picks from digests of the variant number, so a
//! rerun writes the same plans.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// Lowercase hex digest, as stored in manifests
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Plan JSON with object keys sorted at every depth and no whitespace
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Hash of a plan document, stable across key order and formatting
pub fn compute_plan_hash<T: Serialize>(plan: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(plan)?.as_bytes()))
}

/// Stable 64-bit key for `parts`, used for reproducible ordering.
pub fn stable_key(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Pick an index in `0..len` from `parts`. `len` must be non-zero.
pub fn stable_index(parts: &[&str], len: usize) -> usize {
    (stable_key(parts) % len as u64) as usize
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
