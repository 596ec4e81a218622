use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use stakenet_core::error::BootstrapError;
use stakenet_core::types::Address;
use stakenet_crypto::KeyPair;
use tracing::debug;

/// Directory of raw private keys, one file per account, named by the
/// checksummed address and holding the lowercase hex secret (no prefix).
#[derive(Clone, Debug)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BootstrapError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, address: &Address) -> PathBuf {
        self.dir.join(address.to_checksum())
    }

    /// Persist `key`. An existing file for the same address is never
    /// overwritten.
    pub fn write(&self, key: &KeyPair) -> Result<PathBuf, BootstrapError> {
        let path = self.path_for(&key.address);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                BootstrapError::KeyStore(format!("key file for {} already exists", key.address))
            }
            _ => BootstrapError::Io(e),
        })?;
        file.write_all(key.secret_hex().as_bytes())?;
        debug!(address = %key.address, "key written");
        Ok(path)
    }

    /// Load the key stored for `address` and check that it really derives
    /// that address.
    pub fn read(&self, address: &Address) -> Result<KeyPair, BootstrapError> {
        let path = self.path_for(address);
        let contents = zeroize::Zeroizing::new(std::fs::read_to_string(&path).map_err(|e| {
            BootstrapError::KeyStore(format!("reading {}: {e}", path.display()))
        })?);
        let key = KeyPair::from_hex(&contents)?;
        if key.address != *address {
            return Err(BootstrapError::KeyStore(format!(
                "{} holds the key of {}",
                path.display(),
                key.address
            )));
        }
        Ok(key)
    }
}
