//! Double SHA-256, the hash function behind every consensus-critical value.

use sha2::{Digest, Sha256};

use crate::types::Hash;

/// Double SHA-256 of `data`.
///
/// Kernel proofs, selection hashes and block hashes are all double SHA-256
/// of hand-framed little-endian preimages; nothing in the consensus path
/// hashes a serde encoding.
pub fn hash256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_empty_input() {
        // SHA256(SHA256("")) reference value
        let expected = "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456";
        assert_eq!(hex::encode(hash256(b"")), expected);
    }

    #[test]
    fn test_hash256_differs_from_single_sha256() {
        let single = Sha256::digest(b"kernel");
        let double = hash256(b"kernel");
        assert_ne!(&double[..], &single[..]);
    }

    #[test]
    fn test_hash256_deterministic() {
        assert_eq!(hash256(b"stake"), hash256(b"stake"));
    }
}
