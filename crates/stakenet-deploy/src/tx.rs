//! Legacy (pre-EIP-2718) transactions with EIP-155 replay protection.

use rlp::{Rlp, RlpStream};
use stakenet_core::error::BootstrapError;
use stakenet_core::hash::keccak256;
use stakenet_core::types::{Address, TxHash};
use stakenet_crypto::{address_from_public_key, recover, KeyPair, RecoverableSignature};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas: u64,
    /// `None` deploys a contract with `data` as init code.
    pub to: Option<Address>,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

#[derive(Clone, Debug)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

impl LegacyTransaction {
    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        match &self.to {
            Some(to) => s.append(&to.as_bytes().to_vec()),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data);
    }

    /// keccak-256 of `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&self.chain_id);
        s.append(&0u8);
        s.append(&0u8);
        keccak256(&s.out())
    }

    pub fn sign(&self, key: &KeyPair) -> Result<SignedTransaction, BootstrapError> {
        let sig = key.sign_prehash(&self.signing_hash())?;
        let v = u64::from(sig.recovery_id) + self.chain_id * 2 + 35;

        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&v);
        s.append(&trim_leading_zeros(&sig.r));
        s.append(&trim_leading_zeros(&sig.s));
        let raw = s.out().to_vec();
        let hash = TxHash::from_bytes(keccak256(&raw));
        Ok(SignedTransaction { raw, hash })
    }
}

/// A signed transaction decoded back into its fields, with the sender
/// recovered from the signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub tx: LegacyTransaction,
    pub sender: Address,
    pub hash: TxHash,
}

impl DecodedTransaction {
    pub fn decode(raw: &[u8]) -> Result<Self, BootstrapError> {
        let rlp = Rlp::new(raw);
        let fields = rlp.item_count().map_err(decode_err)?;
        if fields != 9 {
            return Err(BootstrapError::Serialization(format!(
                "legacy transaction has 9 fields, got {fields}"
            )));
        }
        let to_bytes: Vec<u8> = rlp.val_at(3).map_err(decode_err)?;
        let to = match to_bytes.len() {
            0 => None,
            20 => {
                let mut a = [0u8; 20];
                a.copy_from_slice(&to_bytes);
                Some(Address::from_bytes(a))
            }
            n => {
                return Err(BootstrapError::Serialization(format!(
                    "`to` must be empty or 20 bytes, got {n}"
                )))
            }
        };
        let v: u64 = rlp.val_at(6).map_err(decode_err)?;
        if v < 35 {
            return Err(BootstrapError::Serialization(format!(
                "v = {v} is not EIP-155 protected"
            )));
        }
        let tx = LegacyTransaction {
            nonce: rlp.val_at(0).map_err(decode_err)?,
            gas_price: rlp.val_at(1).map_err(decode_err)?,
            gas: rlp.val_at(2).map_err(decode_err)?,
            to,
            value: rlp.val_at(4).map_err(decode_err)?,
            data: rlp.val_at(5).map_err(decode_err)?,
            chain_id: (v - 35) / 2,
        };
        let sig = RecoverableSignature {
            r: left_pad(&rlp.val_at::<Vec<u8>>(7).map_err(decode_err)?)?,
            s: left_pad(&rlp.val_at::<Vec<u8>>(8).map_err(decode_err)?)?,
            recovery_id: ((v - 35) % 2) as u8,
        };
        let sender = address_from_public_key(&recover(&tx.signing_hash(), &sig)?);
        Ok(Self {
            tx,
            sender,
            hash: TxHash::from_bytes(keccak256(raw)),
        })
    }
}

fn decode_err(e: rlp::DecoderError) -> BootstrapError {
    BootstrapError::Serialization(format!("rlp: {e}"))
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

fn left_pad(bytes: &[u8]) -> Result<[u8; 32], BootstrapError> {
    if bytes.len() > 32 {
        return Err(BootstrapError::Serialization("signature scalar longer than 32 bytes".into()));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}
