pub mod hash;
pub mod keypair;

pub use hash::{address_from_public_key, keccak256};
pub use keypair::{generate, generate_with, recover, verify, KeyPair, RecoverableSignature};
