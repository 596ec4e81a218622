/// ─── Stakenet bootstrap constants ──────────────────────────────────────────
///
/// Values baked into the environment artifact, the chain specification and
/// the on-chain wiring sequence. Operator-tunable values live in the config
/// structs of the crates that use them; these are the fixed ones.

// ── Network parameters (defaults) ────────────────────────────────────────────

pub const DEFAULT_NETWORK_NAME: &str = "xdaitestnet";
pub const DEFAULT_NETWORK_ID: &str = "102";

/// Owner balance in whole coins (10**18 wei each).
pub const DEFAULT_OWNER_BALANCE: &str = "100";

/// Delegator minimum stake in whole tokens.
pub const DEFAULT_DELEGATOR_MIN_STAKE: &str = "200";

/// Candidate minimum stake in whole tokens.
pub const DEFAULT_CANDIDATE_MIN_STAKE: &str = "2000";

pub const DEFAULT_VALIDATOR_COUNT: &str = "5";

/// Inclusive bounds on the number of validator nodes.
pub const MIN_VALIDATORS: u32 = 1;
pub const MAX_VALIDATORS: u32 = 19;

/// Genesis block gas limit; also the target block gas limit of every node.
pub const DEFAULT_GAS_LIMIT: u64 = 17_000_000;

// ── Staking schedule written to the environment artifact ─────────────────────

/// Staking epoch length in blocks.
pub const STAKING_EPOCH_DURATION: u64 = 120_992;

/// Blocks at the end of an epoch during which stake withdrawal is disallowed.
pub const STAKE_WITHDRAW_DISALLOW_PERIOD: u64 = 4_332;

/// Length of a random-seed collection round in blocks.
pub const COLLECT_ROUND_LENGTH: u64 = 76;

pub const IS_TESTNET: bool = true;

// ── Peer topology ────────────────────────────────────────────────────────────

/// P2P port of the owner (archive) node. Validator `i` (1-based) listens on
/// `BASE_P2P_PORT + i`.
pub const BASE_P2P_PORT: u16 = 30300;

pub const ENODE_SCHEME: &str = "enode";

// ── On-chain contracts (POSDAO genesis layout) ───────────────────────────────

/// `ValidatorSetAuRa` proxy installed at genesis.
pub const VALIDATOR_SET_CONTRACT: &str = "0x1000000000000000000000000000000000000001";

/// `BlockRewardAuRa` proxy installed at genesis.
pub const BLOCK_REWARD_CONTRACT: &str = "0x2000000000000000000000000000000000000001";

/// Staking token constructor arguments.
pub const STAKING_TOKEN_NAME: &str = "STAKE";
pub const STAKING_TOKEN_SYMBOL: &str = "STAKE";
pub const STAKING_TOKEN_DECIMALS: u8 = 18;

/// Name of the staking token contract inside its source file.
pub const STAKING_TOKEN_CONTRACT_NAME: &str = "ERC677BridgeTokenRewardable";

// ── Transactions ─────────────────────────────────────────────────────────────

/// Every bootstrap transaction is free: validators accept zero gas price
/// from the owner during the bootstrap window.
pub const BOOTSTRAP_GAS_PRICE: u128 = 0;

pub const DEPLOY_GAS_LIMIT: u64 = 4_700_000;
pub const CALL_GAS_LIMIT: u64 = 1_000_000;
