//! Hashing utilities.
//!
//! - `fingerprint()` - FxHash based 8-char hex fingerprints for action keys
//! - `process_salt()` - per-process random-ish salt for generated ids
//! - `secret_token()` - unguessable 128-bit hex tokens for session ids

use rustc_hash::FxHasher;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hash any `Hash` value and return an 8-char hex fingerprint.
#[inline]
pub fn fingerprint<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())[..8].to_string()
}

/// 8-char hex salt, fixed for the lifetime of the process.
///
/// Derived from pid and start time so that ids issued by a previous run of
/// the server do not match ids issued after a restart.
pub fn process_salt() -> &'static str {
    static SALT: LazyLock<String> = LazyLock::new(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let mut hasher = blake3::Hasher::new();
        hasher.update(&std::process::id().to_le_bytes());
        hasher.update(&nanos.to_le_bytes());
        hex::encode(&hasher.finalize().as_bytes()[..4])
    });
    &SALT
}

/// 32-char hex token that cannot be derived from earlier tokens.
///
/// Each token is a blake3 keyed hash of a counter; the key is drawn from the
/// OS once per process.
pub fn secret_token() -> String {
    static KEY: LazyLock<[u8; 32]> = LazyLock::new(token_key);
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let hash = blake3::keyed_hash(&KEY, &n.to_le_bytes());
    hex::encode(&hash.as_bytes()[..16])
}

fn token_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    if let Err(e) = getrandom::fill(&mut key) {
        // Still secret: std seeds `RandomState` from the OS on first use.
        crate::log!("error"; "os randomness unavailable ({}), using fallback seed", e);
        let mut hasher = blake3::Hasher::new();
        for _ in 0..4 {
            hasher.update(&RandomState::new().hash_one(process_salt()).to_le_bytes());
        }
        hasher.update(process_salt().as_bytes());
        key = *hasher.finalize().as_bytes();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable() {
        assert_eq!(fingerprint("counter"), fingerprint("counter"));
        assert_ne!(fingerprint("counter"), fingerprint("clock"));
        assert_eq!(fingerprint(&42u64).len(), 8);
    }

    #[test]
    fn test_secret_tokens_are_unrelated() {
        let a = secret_token();
        let b = secret_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        // No shared prefix to increment from.
        assert_ne!(a[..8], b[..8]);
    }

    #[test]
    fn test_process_salt() {
        let salt = process_salt();
        assert_eq!(salt.len(), 8);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(salt, process_salt());
    }
}
