use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use stakenet_core::error::BootstrapError;
use tracing::info;

use crate::env_file::render_env_file;
use crate::identity::{BootstrapRecord, IdentitySet};
use crate::keystore::KeyStore;
use crate::params::RawNetworkParams;

/// File layout of a bootstrap workspace.
#[derive(Clone, Debug)]
pub struct WorkspacePaths {
    /// Shell environment artifact; its presence marks preparation as done.
    pub env_file: PathBuf,
    /// Structured record of parameters and identities.
    pub record_file: PathBuf,
    pub keys_dir: PathBuf,
    pub nodes_dir: PathBuf,
    /// Finalized chain specification.
    pub spec_file: PathBuf,
}

impl WorkspacePaths {
    pub fn under(root: &Path) -> Self {
        let nodes_dir = root.join("nodes");
        Self {
            env_file: root.join("scripts").join("set-env.sh"),
            record_file: root.join("scripts").join("bootstrap.json"),
            keys_dir: root.join("keys"),
            spec_file: nodes_dir.join("spec.json"),
            nodes_dir,
        }
    }
}

#[derive(Debug)]
pub enum PrepareOutcome {
    /// A previous run already completed; nothing was touched.
    Skipped { existing: PathBuf },
    Prepared { record: BootstrapRecord },
}

/// Validate parameters, generate the identity set and persist keys, the
/// structured record and the environment artifact.
///
/// Idempotent: if the environment artifact or the finalized specification
/// already exists the whole stage is skipped before any validation or key
/// generation. The artifact is written last, so a crash mid-way leaves the
/// stage re-runnable.
pub fn prepare_environment(
    raw: &RawNetworkParams,
    paths: &WorkspacePaths,
) -> Result<PrepareOutcome, BootstrapError> {
    for existing in [&paths.env_file, &paths.spec_file] {
        if existing.exists() {
            info!(path = %existing.display(), "already exists, skipping environment preparation");
            return Ok(PrepareOutcome::Skipped {
                existing: existing.clone(),
            });
        }
    }

    let params = raw.validate()?;

    let identities = IdentitySet::generate(params.validator_count)?;
    let store = KeyStore::open(&paths.keys_dir)?;
    identities.persist_keys(&store)?;

    let record = BootstrapRecord {
        params,
        identities: identities.record(),
    };
    record.save(&paths.record_file)?;

    let content = render_env_file(&record.params, &record.identities);
    if let Some(parent) = paths.env_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&paths.env_file)?
        .write_all(content.as_bytes())?;

    info!(
        network = %record.params.network_name,
        owner = %record.identities.owner,
        validators = record.identities.validators.len(),
        path = %paths.env_file.display(),
        "environment prepared"
    );
    Ok(PrepareOutcome::Prepared { record })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_count(dir: &Path) -> usize {
        walk(dir).len()
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    out.extend(walk(&path));
                } else {
                    out.push(path);
                }
            }
        }
        out
    }

    #[test]
    fn prepares_keys_record_and_artifact() {
        let root = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::under(root.path());
        let raw = RawNetworkParams {
            validator_count: "3".into(),
            ..Default::default()
        };

        let outcome = prepare_environment(&raw, &paths).unwrap();
        let record = match outcome {
            PrepareOutcome::Prepared { record } => record,
            other => panic!("unexpected {other:?}"),
        };

        // owner + 3 × (mining, staking)
        assert_eq!(file_count(&paths.keys_dir), 7);
        assert!(paths.env_file.exists());
        assert_eq!(BootstrapRecord::load(&paths.record_file).unwrap(), record);

        let store = KeyStore::open(&paths.keys_dir).unwrap();
        let ids = IdentitySet::load(&record.identities, &store).unwrap();
        assert_eq!(ids.validators.len(), 3);
    }

    #[test]
    fn existing_artifact_skips_everything() {
        let root = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::under(root.path());
        std::fs::create_dir_all(paths.env_file.parent().unwrap()).unwrap();
        std::fs::write(&paths.env_file, "NETWORK_NAME=old").unwrap();

        // Invalid parameters are not even looked at.
        let raw = RawNetworkParams {
            network_name: "my network".into(),
            ..Default::default()
        };
        let outcome = prepare_environment(&raw, &paths).unwrap();

        assert!(matches!(outcome, PrepareOutcome::Skipped { .. }));
        assert!(!paths.keys_dir.exists());
        assert!(!paths.record_file.exists());
        assert_eq!(std::fs::read_to_string(&paths.env_file).unwrap(), "NETWORK_NAME=old");
    }

    #[test]
    fn existing_spec_skips_everything() {
        let root = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::under(root.path());
        std::fs::create_dir_all(&paths.nodes_dir).unwrap();
        std::fs::write(&paths.spec_file, "{}").unwrap();

        let outcome = prepare_environment(&RawNetworkParams::default(), &paths).unwrap();
        assert!(matches!(outcome, PrepareOutcome::Skipped { .. }));
        assert!(!paths.env_file.exists());
    }

    #[test]
    fn invalid_parameters_write_nothing() {
        let root = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::under(root.path());
        let raw = RawNetworkParams {
            validator_count: "20".into(),
            ..Default::default()
        };

        let err = prepare_environment(&raw, &paths).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidParameter { field: "VALIDATORS_NUMBER", .. }));
        assert_eq!(file_count(root.path()), 0);
    }
}
