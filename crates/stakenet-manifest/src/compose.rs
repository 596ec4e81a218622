//! The subset of the docker-compose file format the manifests use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stakenet_core::error::BootstrapError;

pub const COMPOSE_VERSION: &str = "3.7";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    pub version: String,
    pub services: BTreeMap<String, Service>,
}

impl ComposeFile {
    pub fn single(name: &str, service: Service) -> Self {
        Self {
            version: COMPOSE_VERSION.to_string(),
            services: BTreeMap::from([(name.to_string(), service)]),
        }
    }

    pub fn to_yaml(&self) -> Result<String, BootstrapError> {
        serde_yaml::to_string(self).map_err(|e| BootstrapError::Serialization(e.to_string()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, BootstrapError> {
        serde_yaml::from_str(yaml).map_err(|e| BootstrapError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub init: bool,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    pub restart: String,
    /// Every value is a string; compose passes them through verbatim.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl Logging {
    /// Size-capped log rotation.
    pub fn rotated(driver: Option<&str>, max_size: &str, max_file: u32) -> Self {
        Self {
            driver: driver.map(str::to_string),
            options: BTreeMap::from([
                ("max-size".to_string(), max_size.to_string()),
                ("max-file".to_string(), max_file.to_string()),
            ]),
        }
    }
}

/// `"<host>:<container>"` and, when `udp`, the same mapping for UDP.
pub fn port_mappings(port: u16, udp: bool) -> Vec<String> {
    let mut out = vec![format!("{port}:{port}")];
    if udp {
        out.push(format!("{port}:{port}/udp"));
    }
    out
}
