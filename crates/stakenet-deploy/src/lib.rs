//! stakenet-deploy
//!
//! Deploys the staking token on a freshly started POSDAO network and wires
//! it into the system contracts. The sequence is idempotent: the chain is
//! inspected first (`state`) and nothing is sent when the token is already
//! registered or the staking epoch has moved past 0.
//!
//! Steps (each transaction must be mined with status 1 before the next):
//!   1. CompileToken           — `compiler`
//!   2. DeployToken            — constructor (name, symbol, decimals, chainId)
//!   3. SetStakingContract     — token → StakingAuRa
//!   4. SetBlockRewardContract — token → BlockRewardAuRa
//!   5. SetTokenOnStaking      — StakingAuRa → token
//!   6. ComputeMintAmount      — candidateMinStake × validators
//!   7. Mint                   — token.mint(staking, amount)
//!   8. InitialValidatorStake  — staking.initialValidatorStake(amount)
//!
//! Once the first transaction is submitted, any failure aborts the pass as
//! `StepInterrupted` (or `TransactionFailed` for a revert) naming the step.

pub mod abi;
pub mod compiler;
pub mod config;
pub mod contracts;
pub mod orchestrator;
pub mod retry;
pub mod state;
pub mod tx;

pub use compiler::{ArtifactCompiler, CompiledContract, ContractCompiler, SolcCompiler};
pub use config::DeployConfig;
pub use orchestrator::{DeployOutcome, Orchestrator, Step, StepTransaction};
pub use retry::{retry, RetryPolicy};
pub use state::{infer_state, DeploymentState};
pub use tx::{DecodedTransaction, LegacyTransaction, SignedTransaction};
