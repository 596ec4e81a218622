use std::path::Path;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use stakenet_core::constants::{MAX_VALIDATORS, MIN_VALIDATORS};
use stakenet_core::error::BootstrapError;
use stakenet_core::types::Address;
use stakenet_crypto::KeyPair;
use tracing::info;

use crate::keystore::KeyStore;
use crate::params::NetworkParams;

/// A validator's two accounts: the mining key produces blocks and doubles as
/// the node's P2P identity; the staking key owns the validator's stake.
#[derive(Debug)]
pub struct ValidatorIdentity {
    pub mining: KeyPair,
    pub staking: KeyPair,
}

/// The owner identity plus every validator identity, in node order.
#[derive(Debug)]
pub struct IdentitySet {
    pub owner: KeyPair,
    pub validators: Vec<ValidatorIdentity>,
}

impl IdentitySet {
    /// Generate an owner key and `validator_count` mining/staking key pairs.
    pub fn generate(validator_count: u32) -> Result<Self, BootstrapError> {
        Self::generate_with(&mut rand::rngs::OsRng, validator_count)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(
        rng: &mut R,
        validator_count: u32,
    ) -> Result<Self, BootstrapError> {
        check_validator_count(validator_count as usize)?;
        let owner = stakenet_crypto::generate_with(rng)?;
        let validators = (0..validator_count)
            .map(|_| {
                Ok(ValidatorIdentity {
                    mining: stakenet_crypto::generate_with(rng)?,
                    staking: stakenet_crypto::generate_with(rng)?,
                })
            })
            .collect::<Result<Vec<_>, BootstrapError>>()?;
        Ok(Self { owner, validators })
    }

    /// Rebuild the set from a persisted record, reading every key from
    /// `store`.
    pub fn load(record: &IdentityRecord, store: &KeyStore) -> Result<Self, BootstrapError> {
        check_validator_count(record.validators.len())?;
        let owner = store.read(&record.owner)?;
        let validators = record
            .validators
            .iter()
            .map(|v| {
                Ok(ValidatorIdentity {
                    mining: store.read(&v.mining)?,
                    staking: store.read(&v.staking)?,
                })
            })
            .collect::<Result<Vec<_>, BootstrapError>>()?;
        Ok(Self { owner, validators })
    }

    /// Write every private key to `store`.
    pub fn persist_keys(&self, store: &KeyStore) -> Result<(), BootstrapError> {
        store.write(&self.owner)?;
        for v in &self.validators {
            store.write(&v.mining)?;
            store.write(&v.staking)?;
        }
        info!(
            validators = self.validators.len(),
            dir = %store.dir().display(),
            "key material persisted"
        );
        Ok(())
    }

    /// Identities that run a node, in node order: the owner first, then each
    /// validator's mining identity. Position in this sequence determines the
    /// node's peer endpoint and ports.
    pub fn node_identities(&self) -> impl Iterator<Item = &KeyPair> {
        std::iter::once(&self.owner).chain(self.validators.iter().map(|v| &v.mining))
    }

    pub fn mining_addresses(&self) -> Vec<Address> {
        self.validators.iter().map(|v| v.mining.address).collect()
    }

    pub fn staking_addresses(&self) -> Vec<Address> {
        self.validators.iter().map(|v| v.staking.address).collect()
    }

    pub fn record(&self) -> IdentityRecord {
        IdentityRecord {
            owner: self.owner.address,
            validators: self
                .validators
                .iter()
                .map(|v| ValidatorAddresses {
                    mining: v.mining.address,
                    staking: v.staking.address,
                })
                .collect(),
        }
    }
}

fn check_validator_count(n: usize) -> Result<(), BootstrapError> {
    if !(MIN_VALIDATORS as usize..=MAX_VALIDATORS as usize).contains(&n) {
        return Err(BootstrapError::invalid(
            "VALIDATORS_NUMBER",
            format!("must be in the range {MIN_VALIDATORS}...{MAX_VALIDATORS}, got {n}"),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorAddresses {
    pub mining: Address,
    pub staking: Address,
}

/// Public half of an [`IdentitySet`]: addresses only, keys stay in the key
/// store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub owner: Address,
    pub validators: Vec<ValidatorAddresses>,
}

/// Machine-readable result of environment preparation. Later stages load
/// this instead of scraping the shell environment artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRecord {
    pub params: NetworkParams,
    pub identities: IdentityRecord,
}

impl BootstrapRecord {
    pub fn load(path: &Path) -> Result<Self, BootstrapError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::KeyStore(format!("reading {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), BootstrapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
