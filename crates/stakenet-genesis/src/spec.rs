//! Chain specification composition.
//!
//! The base specification produced by the contracts toolchain is treated as
//! immutable input: [`compose`] clones it, strips fields the target client
//! must not see, applies operator parameters, pins the hard-fork activation
//! block and appends one enode URL per node.

use std::path::Path;

use serde_json::{json, Map, Value};
use stakenet_core::constants::{BASE_P2P_PORT, ENODE_SCHEME};
use stakenet_core::error::BootstrapError;
use stakenet_core::types::NodePublicKey;
use tracing::{debug, info};

use crate::identity::IdentitySet;
use crate::params::NetworkParams;

/// Fields removed from the base specification, as JSON object paths.
const LEGACY_FIELDS: &[&[&str]] = &[&[
    "engine",
    "authorityRound",
    "params",
    "blockGasLimitContractTransitions",
]];

/// Hard-fork transitions activated from genesis.
const UPGRADE_TRANSITIONS: &[&str] = &[
    // Byzantium
    "eip140Transition",
    "eip211Transition",
    "eip214Transition",
    "eip658Transition",
    // Constantinople / Petersburg
    "eip145Transition",
    "eip1014Transition",
    "eip1052Transition",
    // Istanbul
    "eip1283Transition",
    "eip1283ReenableTransition",
    "eip1344Transition",
    "eip1706Transition",
    "eip1884Transition",
    "eip2028Transition",
    // Berlin
    "eip2929Transition",
    "eip2930Transition",
];

const GENESIS_BLOCK: &str = "0x0";

/// Where nodes are reachable from each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    /// Externally reachable host (IP or DNS name) shared by every node.
    pub host: String,
    /// Port of the node at position 0; position `i` uses `base_port + i`.
    pub base_port: u16,
}

impl Topology {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_port: BASE_P2P_PORT,
        }
    }

    /// P2P/discovery port of the node at `position` (owner is 0).
    pub fn port(&self, position: usize) -> Result<u16, BootstrapError> {
        u16::try_from(position)
            .ok()
            .and_then(|p| self.base_port.checked_add(p))
            .ok_or_else(|| {
                BootstrapError::Specification(format!("no port for node position {position}"))
            })
    }

    /// `enode://<node id>@<host>:<port>` for the node at `position`.
    pub fn enode(&self, public_key: &NodePublicKey, position: usize) -> Result<String, BootstrapError> {
        Ok(format!(
            "{ENODE_SCHEME}://{}@{}:{}",
            public_key.to_hex(),
            self.host,
            self.port(position)?
        ))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ComposeOptions {
    /// Treat a legacy field that is already absent from the base
    /// specification as an error instead of ignoring it.
    pub strict_legacy_fields: bool,
}

/// A finalized chain specification document.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSpecification(Value);

impl ChainSpecification {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Enode URLs in node order.
    pub fn nodes(&self) -> Vec<&str> {
        self.0["nodes"]
            .as_array()
            .map(|nodes| nodes.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// `genesis.gasLimit`, decoded from its hex quantity.
    pub fn genesis_gas_limit(&self) -> Option<u64> {
        let raw = self.0["genesis"]["gasLimit"].as_str()?;
        u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
    }

    /// Two-space indented JSON, the layout the client distributions ship.
    pub fn to_pretty_json(&self) -> Result<String, BootstrapError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), BootstrapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_pretty_json()?)?;
        info!(path = %path.display(), nodes = self.nodes().len(), "chain specification written");
        Ok(())
    }
}

/// Read a base specification document.
pub fn load_base_spec(path: &Path) -> Result<Value, BootstrapError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        BootstrapError::Specification(format!("reading {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Compose with default options.
pub fn compose(
    base: &Value,
    params: &NetworkParams,
    identities: &IdentitySet,
    topology: &Topology,
) -> Result<ChainSpecification, BootstrapError> {
    compose_with(base, params, identities, topology, &ComposeOptions::default())
}

pub fn compose_with(
    base: &Value,
    params: &NetworkParams,
    identities: &IdentitySet,
    topology: &Topology,
    options: &ComposeOptions,
) -> Result<ChainSpecification, BootstrapError> {
    if identities.validators.len() != params.validator_count as usize {
        return Err(BootstrapError::Specification(format!(
            "identity set has {} validators, parameters declare {}",
            identities.validators.len(),
            params.validator_count
        )));
    }

    let mut spec = base.clone();
    let root = spec.as_object_mut().ok_or_else(|| {
        BootstrapError::Specification("base specification is not a JSON object".into())
    })?;

    for path in LEGACY_FIELDS {
        remove_path(root, path, options.strict_legacy_fields)?;
    }

    root.insert("name".into(), json!(params.network_name));

    object_at(root, "genesis")?.insert("gasLimit".into(), json!(hex_quantity(params.gas_limit)));

    let chain_params = object_at(root, "params")?;
    chain_params.insert("networkID".into(), json!(hex_quantity(params.network_id)));
    for field in UPGRADE_TRANSITIONS {
        chain_params.insert((*field).into(), json!(GENESIS_BLOCK));
    }

    let nodes = identities
        .node_identities()
        .enumerate()
        .map(|(position, key)| topology.enode(&key.public_key, position).map(Value::String))
        .collect::<Result<Vec<_>, _>>()?;
    root.insert("nodes".into(), Value::Array(nodes));

    Ok(ChainSpecification(spec))
}

fn object_at<'a>(
    root: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, BootstrapError> {
    root.get_mut(key)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| BootstrapError::Specification(format!("base specification has no `{key}` object")))
}

fn remove_path(
    root: &mut Map<String, Value>,
    path: &[&str],
    strict: bool,
) -> Result<(), BootstrapError> {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };
    let mut current = Some(root);
    for key in parents {
        current = current.and_then(|obj| obj.get_mut(*key)).and_then(Value::as_object_mut);
    }
    let removed = current.and_then(|obj| obj.remove(*last)).is_some();
    if !removed {
        let dotted = path.join(".");
        if strict {
            return Err(BootstrapError::Specification(format!("expected field `{dotted}` is missing")));
        }
        debug!(field = %dotted, "legacy field already absent");
    }
    Ok(())
}

fn hex_quantity(n: u64) -> String {
    format!("0x{n:x}")
}
