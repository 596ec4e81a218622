use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use stakenet_core::error::BootstrapError;
use stakenet_genesis::{IdentitySet, Topology};
use tracing::{debug, info};

use crate::compose::{port_mappings, ComposeFile, Logging, Service};
use crate::scripts::{self, ARCHIVE_DIR, ETHSTATS_DIR};

pub const ETHSTATS_PORT: u16 = 3000;
pub const ETHSTATS_SECRET_LEN: usize = 10;
pub const JSON_RPC_PORT: u16 = 8545;
pub const WEBSOCKET_PORT: u16 = 8546;

const SPEC_MOUNT: &str = "../spec.json:/nethermind/spec.json:ro";
const DATA_MOUNTS: [&str; 3] = [
    "./data/logs:/nethermind/logs",
    "./data/keystore:/nethermind/keystore",
    "./data/nethermind_db:/nethermind/nethermind_db",
];

/// Everything the manifests need besides the identities and ports.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub network_name: String,
    /// Must equal the composed spec's `genesis.gasLimit`.
    pub gas_limit: u64,
    pub ethstats_secret: String,
    pub ethstats_contact: String,
    /// Log-channel API key, copied into the node manifests as is.
    pub seq_api_key: Option<String>,
    pub seq_server_url: String,
    pub metrics_push_gateway: Option<String>,
    pub min_gas_price: u64,
    pub nethermind_image: String,
    pub ethstats_image: String,
}

impl ManifestConfig {
    pub fn new(network_name: impl Into<String>, gas_limit: u64) -> Self {
        Self {
            network_name: network_name.into(),
            gas_limit,
            ethstats_secret: generate_secret(&mut rand::thread_rng()),
            ethstats_contact: "security@poanetwork.com".into(),
            seq_api_key: None,
            seq_server_url: "https://seq.nethermind.io".into(),
            metrics_push_gateway: None,
            min_gas_price: 1_000_000_000,
            nethermind_image: "nethermind/nethermind:latest".into(),
            ethstats_image: "poanetwork/ethstats:latest".into(),
        }
    }
}

/// Alphanumeric shared secret for the telemetry dashboard.
pub fn generate_secret<R: Rng + ?Sized>(rng: &mut R) -> String {
    Alphanumeric.sample_string(rng, ETHSTATS_SECRET_LEN)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Relative to the `nodes/` directory.
    pub path: PathBuf,
    pub contents: String,
    pub executable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestSet {
    pub files: Vec<RenderedFile>,
}

impl ManifestSet {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&RenderedFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    /// Write every file below `nodes_dir`, replacing earlier renders.
    pub fn write(&self, nodes_dir: &Path) -> Result<(), BootstrapError> {
        for file in &self.files {
            let path = nodes_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &file.contents)?;
            if file.executable {
                make_executable(&path)?;
            }
            debug!(path = %path.display(), "manifest written");
        }
        info!(dir = %nodes_dir.display(), files = self.files.len(), "manifests written");
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), BootstrapError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), BootstrapError> {
    Ok(())
}

/// Render the dashboard, one manifest per validator (in identity order), the
/// archive node and the start/stop scripts.
pub fn render(
    config: &ManifestConfig,
    identities: &IdentitySet,
    topology: &Topology,
) -> Result<ManifestSet, BootstrapError> {
    let mut set = ManifestSet::default();
    let mut push = |dir: &str, compose: ComposeFile| -> Result<(), BootstrapError> {
        set.files.push(RenderedFile {
            path: Path::new(dir).join("docker-compose.yml"),
            contents: compose.to_yaml()?,
            executable: false,
        });
        Ok(())
    };

    push(ETHSTATS_DIR, ethstats(config))?;
    for (i, validator) in identities.validators.iter().enumerate() {
        let number = i + 1;
        let secret = validator.mining.secret_hex();
        push(
            &scripts::validator_dir(number),
            validator_node(config, topology, number, &secret)?,
        )?;
    }
    push(ARCHIVE_DIR, archive_node(config, topology, identities)?)?;

    let n = identities.validators.len();
    set.files.push(RenderedFile {
        path: PathBuf::from("run_all.sh"),
        contents: scripts::run_all(n, &[&config.ethstats_image, &config.nethermind_image]),
        executable: true,
    });
    set.files.push(RenderedFile {
        path: PathBuf::from("stop_all.sh"),
        contents: scripts::stop_all(n),
        executable: true,
    });
    Ok(set)
}

fn ethstats(config: &ManifestConfig) -> ComposeFile {
    let environment = BTreeMap::from([
        ("WS_SECRET".to_string(), config.ethstats_secret.clone()),
        ("PORT".to_string(), ETHSTATS_PORT.to_string()),
    ]);
    ComposeFile::single(
        "ethstats",
        Service {
            init: true,
            image: config.ethstats_image.clone(),
            container_name: Some("ethstats".into()),
            restart: "always".into(),
            environment,
            volumes: Vec::new(),
            ports: port_mappings(ETHSTATS_PORT, false),
            logging: Logging::rotated(None, "1m", 10),
        },
    )
}

/// Settings shared by validator and archive nodes.
fn common_env(config: &ManifestConfig, topology: &Topology, node_name: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    let mut set = |k: &str, v: String| {
        env.insert(format!("NETHERMIND_{k}"), v);
    };
    set("AURACONFIG_ALLOWAURAPRIVATECHAINS", "true".into());
    set("ETHSTATSCONFIG_ENABLED", "true".into());
    set(
        "ETHSTATSCONFIG_SERVER",
        format!("ws://{}:{ETHSTATS_PORT}/api", topology.host),
    );
    set("ETHSTATSCONFIG_SECRET", config.ethstats_secret.clone());
    set("ETHSTATSCONFIG_CONTACT", config.ethstats_contact.clone());
    set("ETHSTATSCONFIG_NAME", node_name.to_string());
    set("INITCONFIG_CHAINSPECPATH", "/nethermind/spec.json".into());
    set("METRICSCONFIG_NODENAME", node_name.to_string());
    match &config.metrics_push_gateway {
        Some(url) => {
            set("METRICSCONFIG_ENABLED", "true".into());
            set("METRICSCONFIG_PUSHGATEWAYURL", url.clone());
            set("METRICSCONFIG_INTERVALSECONDS", "30".into());
        }
        None => set("METRICSCONFIG_ENABLED", "false".into()),
    }
    set("SEQCONFIG_MINLEVEL", "Info".into());
    set("SEQCONFIG_SERVERURL", config.seq_server_url.clone());
    set("SEQCONFIG_APIKEY", config.seq_api_key.clone().unwrap_or_default());
    env
}

fn node_volumes() -> Vec<String> {
    std::iter::once(SPEC_MOUNT)
        .chain(DATA_MOUNTS)
        .map(str::to_string)
        .collect()
}

fn validator_node(
    config: &ManifestConfig,
    topology: &Topology,
    number: usize,
    node_key: &str,
) -> Result<ComposeFile, BootstrapError> {
    let port = topology.port(number)?;
    let name = format!("Validator{number} on {}", config.network_name);
    let mut env = common_env(config, topology, &name);
    for (k, v) in [
        ("AURACONFIG_FORCESEALING", "true".to_string()),
        ("INITCONFIG_ISMINING", "true".into()),
        ("INITCONFIG_STORERECEIPTS", "false".into()),
        ("KEYSTORECONFIG_TESTNODEKEY", node_key.to_string()),
        ("MININGCONFIG_MINGASPRICE", config.min_gas_price.to_string()),
        ("MININGCONFIG_TARGETBLOCKGASLIMIT", config.gas_limit.to_string()),
        ("NETWORKCONFIG_DISCOVERYPORT", port.to_string()),
        ("NETWORKCONFIG_P2PPORT", port.to_string()),
        ("PRUNINGCONFIG_ENABLED", "true".into()),
        ("SYNCCONFIG_FASTSYNC", "true".into()),
        ("SYNCCONFIG_FASTBLOCKS", "true".into()),
        ("SYNCCONFIG_DOWNLOADBODIESINFASTSYNC", "false".into()),
        ("SYNCCONFIG_DOWNLOADRECEIPTSINFASTSYNC", "false".into()),
    ] {
        env.insert(format!("NETHERMIND_{k}"), v);
    }

    Ok(ComposeFile::single(
        "nethermind",
        Service {
            init: true,
            image: config.nethermind_image.clone(),
            container_name: Some(format!("{}-validator{number}", config.network_name)),
            restart: "unless-stopped".into(),
            environment: env,
            volumes: node_volumes(),
            ports: port_mappings(port, true),
            logging: Logging::rotated(Some("json-file"), "10m", 10),
        },
    ))
}

fn archive_node(
    config: &ManifestConfig,
    topology: &Topology,
    identities: &IdentitySet,
) -> Result<ComposeFile, BootstrapError> {
    let port = topology.port(0)?;
    let name = format!("Archive/RPC on {}", config.network_name);
    let mut env = common_env(config, topology, &name);
    for (k, v) in [
        ("INITCONFIG_ISMINING", "false".to_string()),
        ("INITCONFIG_STORERECEIPTS", "true".into()),
        ("INITCONFIG_WEBSOCKETSENABLED", "true".into()),
        ("JSONRPCCONFIG_ENABLED", "true".into()),
        ("JSONRPCCONFIG_HOST", "0.0.0.0".into()),
        ("JSONRPCCONFIG_PORT", JSON_RPC_PORT.to_string()),
        ("JSONRPCCONFIG_WEBSOCKETSPORT", WEBSOCKET_PORT.to_string()),
        ("KEYSTORECONFIG_ENODEACCOUNT", identities.owner.address.to_checksum()),
        ("MININGCONFIG_TARGETBLOCKGASLIMIT", config.gas_limit.to_string()),
        ("NETWORKCONFIG_EXTERNALIP", topology.host.clone()),
        ("NETWORKCONFIG_DISCOVERYPORT", port.to_string()),
        ("NETWORKCONFIG_P2PPORT", port.to_string()),
        ("SYNCCONFIG_FASTSYNC", "false".into()),
        ("SYNCCONFIG_FASTBLOCKS", "true".into()),
        ("SYNCCONFIG_DOWNLOADBODIESINFASTSYNC", "true".into()),
        ("SYNCCONFIG_DOWNLOADRECEIPTSINFASTSYNC", "true".into()),
    ] {
        env.insert(format!("NETHERMIND_{k}"), v);
    }

    let mut ports = port_mappings(JSON_RPC_PORT, false);
    ports.extend(port_mappings(WEBSOCKET_PORT, false));
    ports.extend(port_mappings(port, true));

    Ok(ComposeFile::single(
        "nethermind",
        Service {
            init: true,
            image: config.nethermind_image.clone(),
            container_name: Some(format!("{}-archive", config.network_name)),
            restart: "unless-stopped".into(),
            environment: env,
            volumes: node_volumes(),
            ports,
            logging: Logging::rotated(Some("json-file"), "100m", 1),
        },
    ))
}
