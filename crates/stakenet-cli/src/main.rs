//! stakenet
//!
//! Operator CLI for bootstrapping a POSDAO test network.
//!
//! Usage:
//!   stakenet prepare-env        [--network-name ..] [--validators-number ..] ...
//!   stakenet start-preparation  [--base-spec <path>] [--external-ip <ip>]
//!   stakenet deploy-token       [--rpc-url <url>] (--artifact-dir <dir> | --token-source <sol>)
//!
//! Every operator parameter can also come from the environment variable of
//! the same name used by `scripts/set-env.sh`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use stakenet_core::types::Address;
use stakenet_crypto::KeyPair;
use stakenet_deploy::{
    ArtifactCompiler, ContractCompiler, DeployConfig, DeployOutcome, Orchestrator, RetryPolicy,
    SolcCompiler,
};
use stakenet_genesis::{
    compose_with, load_base_spec, prepare_environment, BootstrapRecord, ComposeOptions,
    IdentitySet, KeyStore, PrepareOutcome, RawNetworkParams, Topology, WorkspacePaths,
};
use stakenet_manifest::{render, ManifestConfig};
use stakenet_rpc::{HttpChainRpc, RpcConfig};

mod public_ip;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "stakenet", version, about = "Bootstrap a POSDAO/AuRa test network")]
struct Cli {
    /// Workspace root holding `scripts/`, `keys/` and `nodes/`.
    #[arg(long, global = true, env = "STAKENET_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate parameters, generate owner and validator keys, and write
    /// `scripts/set-env.sh`. Does nothing if the environment already exists.
    PrepareEnv(PrepareEnvArgs),

    /// Compose `nodes/spec.json` with enode URLs and render the node
    /// manifests and run/stop scripts.
    StartPreparation(StartPreparationArgs),

    /// Deploy the staking token and wire it into the staking contracts.
    DeployToken(DeployTokenArgs),
}

#[derive(Args, Debug)]
struct PrepareEnvArgs {
    #[arg(long, env = "NETWORK_NAME")]
    network_name: Option<String>,
    #[arg(long, env = "NETWORK_ID")]
    network_id: Option<String>,
    /// Owner balance in whole coins.
    #[arg(long, env = "OWNER_BALANCE")]
    owner_balance: Option<String>,
    #[arg(long, env = "DELEGATOR_MIN_STAKE")]
    delegator_min_stake: Option<String>,
    #[arg(long, env = "CANDIDATE_MIN_STAKE")]
    candidate_min_stake: Option<String>,
    /// Number of validators, 1 to 19.
    #[arg(long, env = "VALIDATORS_NUMBER")]
    validators_number: Option<String>,
    #[arg(long, env = "GAS_LIMIT")]
    gas_limit: Option<String>,
}

impl PrepareEnvArgs {
    fn into_raw(self) -> RawNetworkParams {
        let d = RawNetworkParams::default();
        RawNetworkParams {
            network_name: self.network_name.unwrap_or(d.network_name),
            network_id: self.network_id.unwrap_or(d.network_id),
            owner_balance: self.owner_balance.unwrap_or(d.owner_balance),
            delegator_min_stake: self.delegator_min_stake.unwrap_or(d.delegator_min_stake),
            candidate_min_stake: self.candidate_min_stake.unwrap_or(d.candidate_min_stake),
            validator_count: self.validators_number.unwrap_or(d.validator_count),
            gas_limit: self.gas_limit.unwrap_or(d.gas_limit),
        }
    }
}

#[derive(Args, Debug)]
struct StartPreparationArgs {
    /// Base chain specification produced by the contracts build.
    #[arg(long, env = "BASE_SPEC", default_value = "posdao-contracts/spec.json")]
    base_spec: PathBuf,

    /// Public IPv4 address advertised in enode URLs. Looked up if absent.
    #[arg(long, env = "EXTERNAL_IP")]
    external_ip: Option<String>,

    #[arg(long, env = "IP_ECHO_URL", default_value = public_ip::DEFAULT_ECHO_URL)]
    ip_echo_url: String,

    /// Fail if the base spec lacks a field that is normally removed.
    #[arg(long)]
    strict_legacy_fields: bool,

    /// API key for the nodes' log channel, copied into the manifests.
    #[arg(long, env = "SEQAPIKEY", hide_env_values = true)]
    seq_api_key: Option<String>,

    #[arg(long, env = "METRICS_PUSH_GATEWAY")]
    metrics_push_gateway: Option<String>,
}

#[derive(Args, Debug)]
struct DeployTokenArgs {
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    #[arg(long, default_value_t = 30)]
    rpc_timeout_secs: u64,

    /// Directory with a prebuilt `<Contract>.json` artifact.
    #[arg(long, env = "TOKEN_ARTIFACT_DIR", conflicts_with = "token_source")]
    artifact_dir: Option<PathBuf>,

    /// Solidity source of the token, compiled with `solc`.
    #[arg(long, env = "TOKEN_SOURCE")]
    token_source: Option<PathBuf>,

    #[arg(long, env = "SOLC", default_value = "solc")]
    solc: PathBuf,

    #[arg(long, env = "VALIDATOR_SET_CONTRACT")]
    validator_set: Option<Address>,

    #[arg(long, env = "BLOCK_REWARD_CONTRACT")]
    block_reward: Option<Address>,

    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    #[arg(long, default_value_t = 120)]
    receipt_timeout_secs: u64,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stakenet=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let paths = WorkspacePaths::under(&cli.root);

    match cli.command {
        Command::PrepareEnv(args) => cmd_prepare_env(args, &paths),
        Command::StartPreparation(args) => cmd_start_preparation(args, &paths).await,
        Command::DeployToken(args) => cmd_deploy_token(args, &paths).await,
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn cmd_prepare_env(args: PrepareEnvArgs, paths: &WorkspacePaths) -> anyhow::Result<()> {
    match prepare_environment(&args.into_raw(), paths).context("preparing environment")? {
        PrepareOutcome::Skipped { existing } => {
            println!("Environment already prepared ({}); nothing to do.", existing.display());
        }
        PrepareOutcome::Prepared { record } => {
            println!("Network:    {} (id {})", record.params.network_name, record.params.network_id);
            println!("Owner:      {}", record.identities.owner);
            for (i, v) in record.identities.validators.iter().enumerate() {
                println!("Validator{}: mining {}  staking {}", i + 1, v.mining, v.staking);
            }
            println!("Wrote {}", paths.env_file.display());
        }
    }
    Ok(())
}

async fn cmd_start_preparation(
    args: StartPreparationArgs,
    paths: &WorkspacePaths,
) -> anyhow::Result<()> {
    let (record, store) = load_workspace(paths)?;
    let identities = IdentitySet::load(&record.identities, &store)
        .context("loading identity keys from key store")?;

    let host = match args.external_ip {
        Some(ip) => ip,
        None => public_ip::lookup(&args.ip_echo_url, Duration::from_secs(10))
            .await
            .context("resolving public IP (pass --external-ip to skip)")?
            .to_string(),
    };
    info!(%host, "advertised host");
    let topology = Topology::new(host);

    let base = load_base_spec(&args.base_spec)
        .with_context(|| format!("loading base spec {}", args.base_spec.display()))?;
    let options = ComposeOptions {
        strict_legacy_fields: args.strict_legacy_fields,
    };
    let spec = compose_with(&base, &record.params, &identities, &topology, &options)
        .context("composing chain specification")?;
    spec.save(&paths.spec_file)
        .with_context(|| format!("writing {}", paths.spec_file.display()))?;

    let mut config = ManifestConfig::new(record.params.network_name.clone(), record.params.gas_limit);
    config.seq_api_key = args.seq_api_key;
    config.metrics_push_gateway = args.metrics_push_gateway;
    if config.seq_api_key.is_none() {
        warn!("SEQAPIKEY not set; node log shipping will be unauthenticated");
    }
    let manifests = render(&config, &identities, &topology).context("rendering manifests")?;
    manifests
        .write(&paths.nodes_dir)
        .with_context(|| format!("writing manifests under {}", paths.nodes_dir.display()))?;

    println!("Spec:      {}", paths.spec_file.display());
    println!("Manifests: {} files under {}", manifests.files.len(), paths.nodes_dir.display());
    println!("Start the network with {}", paths.nodes_dir.join("run_all.sh").display());
    Ok(())
}

async fn cmd_deploy_token(args: DeployTokenArgs, paths: &WorkspacePaths) -> anyhow::Result<()> {
    let (record, store) = load_workspace(paths)?;
    let owner = store
        .read(&record.identities.owner)
        .context("loading owner key")?;

    let rpc = HttpChainRpc::new(&RpcConfig {
        url: args.rpc_url.clone(),
        timeout: Duration::from_secs(args.rpc_timeout_secs),
    })?;

    let mut config = DeployConfig::posdao()?;
    if let Some(a) = args.validator_set {
        config.validator_set = a;
    }
    if let Some(a) = args.block_reward {
        config.block_reward = a;
    }
    config.receipt_timeout = Duration::from_secs(args.receipt_timeout_secs);
    config.retry = RetryPolicy {
        max_attempts: args.max_attempts,
        ..RetryPolicy::default()
    };
    info!(rpc = %args.rpc_url, owner = %owner.address, "deploying staking token");

    let outcome = match (args.artifact_dir, args.token_source) {
        (Some(dir), _) => run_deploy(rpc, ArtifactCompiler::new(dir), owner, config).await?,
        (None, Some(source)) => {
            let mut solc = SolcCompiler::new(&source);
            solc.solc = args.solc;
            solc.base_path = source.parent().map(Path::to_path_buf);
            run_deploy(rpc, solc, owner, config).await?
        }
        (None, None) => anyhow::bail!("either --artifact-dir or --token-source is required"),
    };

    match outcome {
        DeployOutcome::Deployed {
            token,
            mint_amount,
            transactions,
        } => {
            println!("Token:       {token}");
            println!("Minted:      {mint_amount}");
            for tx in transactions {
                println!("  {:<24} {}", tx.step, tx.hash);
            }
        }
        DeployOutcome::AlreadyDeployed { token } => {
            println!("Staking token already deployed at {token}; nothing to do.");
        }
        DeployOutcome::PastBootstrapWindow { epoch } => {
            println!("Staking epoch is {epoch}; the initial staking window has passed.");
        }
    }
    Ok(())
}

async fn run_deploy<C: ContractCompiler>(
    rpc: HttpChainRpc,
    compiler: C,
    owner: KeyPair,
    config: DeployConfig,
) -> anyhow::Result<DeployOutcome> {
    Orchestrator::new(rpc, compiler, owner, config)
        .run()
        .await
        .context("deploying staking token")
}

fn load_workspace(paths: &WorkspacePaths) -> anyhow::Result<(BootstrapRecord, KeyStore)> {
    let record = BootstrapRecord::load(&paths.record_file).with_context(|| {
        format!(
            "reading {} (run `stakenet prepare-env` first)",
            paths.record_file.display()
        )
    })?;
    let store = KeyStore::open(&paths.keys_dir)
        .with_context(|| format!("opening key store {}", paths.keys_dir.display()))?;
    Ok((record, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unset_parameters_fall_back_to_defaults() {
        let args = PrepareEnvArgs {
            network_name: Some("mynet".into()),
            network_id: None,
            owner_balance: None,
            delegator_min_stake: None,
            candidate_min_stake: None,
            validators_number: Some("3".into()),
            gas_limit: None,
        };
        let raw = args.into_raw();
        assert_eq!(raw.network_name, "mynet");
        assert_eq!(raw.validator_count, "3");
        assert_eq!(raw.network_id, RawNetworkParams::default().network_id);
    }
}
