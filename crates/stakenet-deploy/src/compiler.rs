use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use stakenet_core::error::BootstrapError;
use stakenet_core::types::strip_hex_prefix;
use tokio::process::Command;
use tracing::{debug, info};

use crate::abi::Method;

/// Bytecode plus ABI of one compiled contract.
#[derive(Debug, Clone)]
pub struct CompiledContract {
    pub name: String,
    pub abi: ethabi::Contract,
    pub bytecode: Vec<u8>,
}

impl CompiledContract {
    pub fn from_parts(name: &str, abi: Value, bytecode_hex: &str) -> Result<Self, BootstrapError> {
        let abi: ethabi::Contract = serde_json::from_value(abi)
            .map_err(|e| BootstrapError::Compilation(format!("{name}: ABI: {e}")))?;
        let bytecode = hex::decode(strip_hex_prefix(bytecode_hex.trim()))
            .map_err(|e| BootstrapError::Compilation(format!("{name}: bytecode: {e}")))?;
        if bytecode.is_empty() {
            return Err(BootstrapError::Compilation(format!(
                "{name}: empty bytecode (abstract contract or unlinked library?)"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            abi,
            bytecode,
        })
    }

    /// Whether the ABI declares `method` with the same input types.
    pub fn declares(&self, method: &Method) -> bool {
        self.abi
            .functions_by_name(method.name)
            .map_or(false, |overloads| overloads.iter().any(|f| method.matches(f)))
    }

    /// Fail unless every method in `methods` appears in the ABI.
    pub fn require_functions(&self, methods: &[Method]) -> Result<(), BootstrapError> {
        let missing: Vec<String> = methods
            .iter()
            .filter(|m| !self.declares(m))
            .map(Method::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BootstrapError::Compilation(format!(
                "{} ABI lacks {}",
                self.name,
                missing.join(", ")
            )))
        }
    }
}

#[async_trait]
pub trait ContractCompiler: Send + Sync {
    async fn compile(&self, contract: &str) -> Result<CompiledContract, BootstrapError>;
}

// ── solc ─────────────────────────────────────────────────────────────────────

/// Invokes a local `solc` binary on a Solidity source file.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    pub solc: PathBuf,
    pub source: PathBuf,
    /// Passed as `--base-path` so relative imports resolve.
    pub base_path: Option<PathBuf>,
    pub optimize: bool,
}

impl SolcCompiler {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            solc: PathBuf::from("solc"),
            source: source.into(),
            base_path: None,
            optimize: true,
        }
    }
}

#[async_trait]
impl ContractCompiler for SolcCompiler {
    async fn compile(&self, contract: &str) -> Result<CompiledContract, BootstrapError> {
        let mut cmd = Command::new(&self.solc);
        cmd.arg("--combined-json").arg("abi,bin");
        if self.optimize {
            cmd.arg("--optimize");
        }
        if let Some(base) = &self.base_path {
            cmd.arg("--base-path").arg(base);
        }
        cmd.arg(&self.source);
        debug!(solc = %self.solc.display(), source = %self.source.display(), "running solc");

        let output = cmd.output().await.map_err(|e| {
            BootstrapError::Compilation(format!("spawning {}: {e}", self.solc.display()))
        })?;
        if !output.status.success() {
            return Err(BootstrapError::Compilation(format!(
                "solc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| BootstrapError::Compilation(format!("solc output: {e}")))?;
        let compiled = parse_combined_json(&json, contract)?;
        info!(contract, bytes = compiled.bytecode.len(), "compiled");
        Ok(compiled)
    }
}

/// Pick `contract` out of `solc --combined-json abi,bin` output.
///
/// Keys are `<source path>:<ContractName>`. Older compilers emit the ABI as a
/// JSON-encoded string rather than an array.
pub fn parse_combined_json(json: &Value, contract: &str) -> Result<CompiledContract, BootstrapError> {
    let contracts = json["contracts"]
        .as_object()
        .ok_or_else(|| BootstrapError::Compilation("solc output has no `contracts`".into()))?;
    let suffix = format!(":{contract}");
    let entry = contracts
        .iter()
        .find(|(key, _)| key.ends_with(&suffix) || key.as_str() == contract)
        .map(|(_, v)| v)
        .ok_or_else(|| BootstrapError::Compilation(format!("contract {contract} not in solc output")))?;

    let abi = match &entry["abi"] {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| BootstrapError::Compilation(format!("{contract} ABI: {e}")))?,
        other => other.clone(),
    };
    let bin = entry["bin"]
        .as_str()
        .ok_or_else(|| BootstrapError::Compilation(format!("{contract}: no `bin`")))?;
    CompiledContract::from_parts(contract, abi, bin)
}

// ── Prebuilt artifacts ───────────────────────────────────────────────────────

/// Loads a truffle-style artifact (`{"abi": [...], "bytecode": "0x..."}`)
/// from `<dir>/<ContractName>.json`.
#[derive(Debug, Clone)]
pub struct ArtifactCompiler {
    pub dir: PathBuf,
}

impl ArtifactCompiler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, contract: &str) -> PathBuf {
        self.dir.join(format!("{contract}.json"))
    }
}

#[async_trait]
impl ContractCompiler for ArtifactCompiler {
    async fn compile(&self, contract: &str) -> Result<CompiledContract, BootstrapError> {
        let path = self.path_for(contract);
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            BootstrapError::Compilation(format!("reading artifact {}: {e}", path.display()))
        })?;
        let compiled = parse_artifact(&raw, contract, &path)?;
        info!(contract, artifact = %path.display(), "loaded prebuilt artifact");
        Ok(compiled)
    }
}

fn parse_artifact(raw: &[u8], contract: &str, path: &Path) -> Result<CompiledContract, BootstrapError> {
    let json: Value = serde_json::from_slice(raw)
        .map_err(|e| BootstrapError::Compilation(format!("{}: {e}", path.display())))?;
    let bytecode = json["bytecode"]
        .as_str()
        .ok_or_else(|| BootstrapError::Compilation(format!("{}: no `bytecode`", path.display())))?;
    CompiledContract::from_parts(contract, json["abi"].clone(), bytecode)
}
