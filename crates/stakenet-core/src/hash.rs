use sha3::{Digest, Keccak256};

/// Keccak-256 (the pre-standard SHA-3 variant used by Ethereum) of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}
