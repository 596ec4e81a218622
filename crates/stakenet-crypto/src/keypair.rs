use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use secp256k1::ecdsa::RecoverableSignature as SecpRecoverableSignature;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use stakenet_core::error::BootstrapError;
use stakenet_core::types::{strip_hex_prefix, Address, NodePublicKey};
use tracing::trace;
use zeroize::Zeroizing;

use crate::hash::address_from_public_key;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Returns true if `private_key` is a valid secp256k1 secret scalar:
/// exactly 32 bytes, non-zero and strictly below the curve order.
pub fn verify(private_key: &[u8]) -> bool {
    private_key.len() == 32 && SecretKey::from_slice(private_key).is_ok()
}

/// Generate a fresh key pair from the operating system's CSPRNG.
pub fn generate() -> Result<KeyPair, BootstrapError> {
    generate_with(&mut OsRng)
}

/// Sample 256-bit candidates from `rng` until one is a valid secret key.
///
/// The probability that a uniform sample is rejected is about 2^-128, so the
/// loop terminates almost surely. A failing random source is fatal.
pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<KeyPair, BootstrapError> {
    let mut candidate = Zeroizing::new([0u8; 32]);
    loop {
        rng.try_fill_bytes(&mut candidate[..])
            .map_err(|e| BootstrapError::KeyGenerationExhaustion(e.to_string()))?;
        if verify(&candidate[..]) {
            return KeyPair::from_secret_bytes(&candidate[..]);
        }
        trace!("rejected out-of-range secret key candidate");
    }
}

/// ECDSA signature with the recovery id needed to rebuild the signer's
/// public key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1.
    pub recovery_id: u8,
}

/// A secp256k1 key pair with its derived node public key and address.
///
/// The secret scalar is held in `Zeroizing` storage and wiped on drop.
pub struct KeyPair {
    pub address: Address,
    pub public_key: NodePublicKey,
    secret_key: Zeroizing<[u8; 32]>,
}

impl KeyPair {
    /// Build a key pair from raw secret bytes, rejecting invalid scalars.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, BootstrapError> {
        let sk = SecretKey::from_slice(bytes).map_err(|_| BootstrapError::InvalidPrivateKey)?;
        let uncompressed = PublicKey::from_secret_key(&SECP, &sk).serialize_uncompressed();
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&uncompressed[1..]);
        let public_key = NodePublicKey(raw);

        let mut secret_key = Zeroizing::new([0u8; 32]);
        secret_key.copy_from_slice(bytes);
        Ok(Self {
            address: address_from_public_key(&public_key),
            public_key,
            secret_key,
        })
    }

    /// Restore a key pair from its hex encoding as written to the key store.
    pub fn from_hex(s: &str) -> Result<Self, BootstrapError> {
        let bytes = Zeroizing::new(
            hex::decode(strip_hex_prefix(s.trim())).map_err(|_| BootstrapError::InvalidPrivateKey)?,
        );
        Self::from_secret_bytes(&bytes)
    }

    /// Lowercase hex of the secret key, no prefix.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.secret_key[..]))
    }

    /// Sign a 32-byte digest.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, BootstrapError> {
        let sk = SecretKey::from_slice(&self.secret_key[..])
            .map_err(|_| BootstrapError::InvalidPrivateKey)?;
        let sig = SECP.sign_ecdsa_recoverable(&Message::from_digest(*digest), &sk);
        let (recovery_id, compact) = sig.serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_i32() as u8,
        })
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ address: {} }}", self.address)
    }
}

/// Recover the node public key that produced `sig` over `digest`.
pub fn recover(digest: &[u8; 32], sig: &RecoverableSignature) -> Result<NodePublicKey, BootstrapError> {
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&sig.r);
    compact[32..].copy_from_slice(&sig.s);
    let recovery_id = secp256k1::ecdsa::RecoveryId::from_i32(sig.recovery_id as i32)
        .map_err(|e| BootstrapError::Serialization(e.to_string()))?;
    let sig = SecpRecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| BootstrapError::Serialization(e.to_string()))?;
    let pk = SECP
        .recover_ecdsa(&Message::from_digest(*digest), &sig)
        .map_err(|e| BootstrapError::Serialization(e.to_string()))?;
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&pk.serialize_uncompressed()[1..]);
    Ok(NodePublicKey(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Curve order n of secp256k1.
    const CURVE_ORDER: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    /// Replays a fixed list of 32-byte candidates, then reports failure.
    struct ScriptedRng(VecDeque<[u8; 32]>);

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            unimplemented!()
        }
        fn next_u64(&mut self) -> u64 {
            unimplemented!()
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).unwrap()
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            let next = self.0.pop_front().ok_or_else(|| rand::Error::new("script exhausted"))?;
            dest.copy_from_slice(&next);
            Ok(())
        }
    }

    impl CryptoRng for ScriptedRng {}

    fn bytes32(hex_str: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(hex_str).unwrap());
        out
    }

    #[test]
    fn generated_keys_always_verify() {
        for _ in 0..64 {
            let kp = generate().unwrap();
            assert!(verify(&kp.secret_key[..]));
            assert_ne!(*kp.secret_key, [0u8; 32]);
        }
    }

    #[test]
    fn verify_rejects_zero_and_out_of_range() {
        assert!(!verify(&[0u8; 32]));
        assert!(!verify(&bytes32(CURVE_ORDER)));
        assert!(!verify(&[0xffu8; 32]));
        assert!(!verify(&[1u8; 31]));

        let mut below_order = bytes32(CURVE_ORDER);
        below_order[31] -= 1;
        assert!(verify(&below_order));
    }

    #[test]
    fn generation_skips_invalid_candidates() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let mut rng = ScriptedRng(VecDeque::from(vec![[0u8; 32], bytes32(CURVE_ORDER), one]));

        let kp = generate_with(&mut rng).unwrap();
        assert_eq!(kp.address.to_checksum(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        assert!(rng.0.is_empty());
    }

    #[test]
    fn exhausted_source_is_reported() {
        let mut rng = ScriptedRng(VecDeque::from(vec![[0u8; 32]]));
        let err = generate_with(&mut rng).unwrap_err();
        assert!(matches!(err, BootstrapError::KeyGenerationExhaustion(_)));
    }

    #[test]
    fn known_key_derives_known_address() {
        let kp = KeyPair::from_hex(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        assert_eq!(kp.address.to_checksum(), "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
        assert_eq!(
            kp.secret_hex().as_str(),
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        );
    }

    #[test]
    fn generator_point_is_public_key_of_one() {
        let mut one = [0u8; 32];
        one[31] = 1;
        let kp = KeyPair::from_secret_bytes(&one).unwrap();
        assert_eq!(
            kp.public_key.to_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn signature_recovers_signer() {
        let kp = generate().unwrap();
        let digest = crate::keccak256(b"setStakingContract");
        let sig = kp.sign_prehash(&digest).unwrap();
        assert!(sig.recovery_id <= 1);
        assert_eq!(recover(&digest, &sig).unwrap(), kp.public_key);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = generate().unwrap();
        let printed = format!("{kp:?}");
        assert!(!printed.contains(kp.secret_hex().as_str()));
    }
}
