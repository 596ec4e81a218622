use stakenet_core::types::{Address, NodePublicKey};

pub use stakenet_core::hash::keccak256;

/// Derive an account address from a node public key: the trailing 20 bytes of
/// keccak-256 over the 64 raw coordinate bytes.
pub fn address_from_public_key(public_key: &NodePublicKey) -> Address {
    let hash = keccak256(public_key.as_bytes());
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}
