//! SHA-256 digests
//!
//! Used to key memoized native-function results by their serialized
//! arguments without holding the full argument text in every key.

use sha2::{Digest, Sha256};

/// Raw SHA-256 digest over a sequence of parts.
///
/// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn digest_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
