use std::fmt;

use stakenet_core::error::BootstrapError;
use stakenet_core::types::{Address, TxHash, U256};
use stakenet_crypto::KeyPair;
use stakenet_rpc::{ChainRpc, TxReceipt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::compiler::ContractCompiler;
use crate::config::DeployConfig;
use crate::contracts::{self, StakingContract, ValidatorSetContract, TOKEN_FUNCTIONS};
use crate::retry::retry;
use crate::state::{observe, DeploymentState};
use crate::tx::LegacyTransaction;

/// One stage of the deploy-and-wire sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CompileToken,
    DeployToken,
    SetStakingContract,
    SetBlockRewardContract,
    SetTokenOnStaking,
    ComputeMintAmount,
    Mint,
    InitialValidatorStake,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::CompileToken,
        Step::DeployToken,
        Step::SetStakingContract,
        Step::SetBlockRewardContract,
        Step::SetTokenOnStaking,
        Step::ComputeMintAmount,
        Step::Mint,
        Step::InitialValidatorStake,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::CompileToken => "CompileToken",
            Step::DeployToken => "DeployToken",
            Step::SetStakingContract => "SetStakingContract",
            Step::SetBlockRewardContract => "SetBlockRewardContract",
            Step::SetTokenOnStaking => "SetTokenOnStaking",
            Step::ComputeMintAmount => "ComputeMintAmount",
            Step::Mint => "Mint",
            Step::InitialValidatorStake => "InitialValidatorStake",
        }
    }

    /// 1-based position in the sequence.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    /// Whether the step submits a transaction.
    pub fn is_transaction(self) -> bool {
        !matches!(self, Step::CompileToken | Step::ComputeMintAmount)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTransaction {
    pub step: Step,
    pub hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The full sequence ran in this invocation.
    Deployed {
        token: Address,
        mint_amount: U256,
        transactions: Vec<StepTransaction>,
    },
    AlreadyDeployed { token: Address },
    PastBootstrapWindow { epoch: U256 },
}

/// Deploys the staking token and wires it into the POSDAO contracts.
///
/// The on-chain state is re-read on every invocation. Transport failures
/// before the first transaction is submitted are retried from state
/// inference; any failure after that aborts with the step that was running,
/// since state inference cannot see a half-wired token.
pub struct Orchestrator<R, C> {
    rpc: R,
    compiler: C,
    owner: KeyPair,
    config: DeployConfig,
}

impl<R: ChainRpc, C: ContractCompiler> Orchestrator<R, C> {
    pub fn new(rpc: R, compiler: C, owner: KeyPair, config: DeployConfig) -> Self {
        Self {
            rpc,
            compiler,
            owner,
            config,
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// [`deploy_and_wire`](Self::deploy_and_wire) under the configured
    /// retry policy. Each retry starts again from state inference; errors
    /// raised once transactions are in flight are `StepInterrupted` and never
    /// retried.
    pub async fn run(&self) -> Result<DeployOutcome, BootstrapError> {
        retry(&self.config.retry, |attempt| {
            if attempt > 1 {
                info!(attempt, "re-reading chain state");
            }
            self.deploy_and_wire()
        })
        .await
    }

    /// One pass: infer state, then deploy and wire if nothing is there yet.
    pub async fn deploy_and_wire(&self) -> Result<DeployOutcome, BootstrapError> {
        let validator_set = ValidatorSetContract::new(&self.rpc, self.config.validator_set);
        let staking_address = validator_set.staking_contract().await?;
        if staking_address.is_zero() {
            return Err(BootstrapError::Specification(format!(
                "validator set {} reports no staking contract",
                self.config.validator_set
            )));
        }
        let staking = StakingContract::new(&self.rpc, staking_address);

        match observe(&staking).await? {
            DeploymentState::AlreadyDeployed { token } => {
                info!(%token, "staking token already deployed; nothing to do");
                Ok(DeployOutcome::AlreadyDeployed { token })
            }
            DeploymentState::PastBootstrapWindow { epoch } => {
                info!(%epoch, "staking epoch is past 0 without a token; initial staking window closed");
                Ok(DeployOutcome::PastBootstrapWindow { epoch })
            }
            DeploymentState::NotDeployed => self.deploy(&validator_set, &staking).await,
        }
    }

    async fn deploy(
        &self,
        validator_set: &ValidatorSetContract<'_, R>,
        staking: &StakingContract<'_, R>,
    ) -> Result<DeployOutcome, BootstrapError> {
        let cfg = &self.config;
        let chain_id = self.rpc.chain_id().await?;
        info!(chain_id, owner = %self.owner.address, staking = %staking.address(), "deploying staking token");

        let compiled = self.compiler.compile(&cfg.token_contract).await?;
        compiled.require_functions(&TOKEN_FUNCTIONS)?;
        log_step(Step::CompileToken, None);

        let mut sender = TxSender::new(&self.rpc, &self.owner, chain_id, cfg).await?;
        let result = self
            .send_sequence(&mut sender, &compiled.bytecode, chain_id, validator_set, staking)
            .await;
        if let Err(e) = &result {
            if !sender.sent.is_empty() {
                warn!(
                    sent = sender.sent.len(),
                    error = %e,
                    "deployment stopped part-way; inspect the token and staking contracts before rerunning"
                );
            }
        }
        result
    }

    /// Steps 2 to 8. Every error is attributed to the step that raised it.
    async fn send_sequence(
        &self,
        sender: &mut TxSender<'_, R>,
        bytecode: &[u8],
        chain_id: u64,
        validator_set: &ValidatorSetContract<'_, R>,
        staking: &StakingContract<'_, R>,
    ) -> Result<DeployOutcome, BootstrapError> {
        let cfg = &self.config;
        let init_code = contracts::token_init_code(
            bytecode,
            &cfg.token_name,
            &cfg.token_symbol,
            cfg.token_decimals,
            chain_id,
        );
        let receipt = sender
            .submit(Step::DeployToken, None, init_code, cfg.deploy_gas_limit)
            .await?;
        let token = receipt.contract_address.ok_or_else(|| {
            BootstrapError::RpcFailure(format!(
                "deploy receipt {} carries no contractAddress",
                receipt.transaction_hash
            ))
            .in_step(Step::DeployToken.name())
        })?;
        info!(%token, "staking token deployed");

        sender
            .submit(
                Step::SetStakingContract,
                Some(token),
                contracts::set_staking_contract(staking.address()),
                cfg.call_gas_limit,
            )
            .await?;
        sender
            .submit(
                Step::SetBlockRewardContract,
                Some(token),
                contracts::set_block_reward_contract(cfg.block_reward),
                cfg.call_gas_limit,
            )
            .await?;
        sender
            .submit(
                Step::SetTokenOnStaking,
                Some(staking.address()),
                contracts::set_erc677_token_contract(token),
                cfg.call_gas_limit,
            )
            .await?;

        let mint_amount = mint_amount(validator_set, staking)
            .await
            .map_err(|e| e.in_step(Step::ComputeMintAmount.name()))?;
        log_step(Step::ComputeMintAmount, None);

        sender
            .submit(
                Step::Mint,
                Some(token),
                contracts::mint(staking.address(), mint_amount),
                cfg.call_gas_limit,
            )
            .await?;
        sender
            .submit(
                Step::InitialValidatorStake,
                Some(staking.address()),
                contracts::initial_validator_stake(mint_amount),
                cfg.call_gas_limit,
            )
            .await?;

        info!(%token, %mint_amount, txs = sender.sent.len(), "staking token deployed and wired");
        Ok(DeployOutcome::Deployed {
            token,
            mint_amount,
            transactions: std::mem::take(&mut sender.sent),
        })
    }
}

/// `candidateMinStake × |validators|`, both read live.
async fn mint_amount<R: ChainRpc + ?Sized>(
    validator_set: &ValidatorSetContract<'_, R>,
    staking: &StakingContract<'_, R>,
) -> Result<U256, BootstrapError> {
    let min_stake = staking.candidate_min_stake().await?;
    let validators = validator_set.validators().await?;
    if validators.is_empty() {
        return Err(BootstrapError::Specification(
            "validator set returned no validators".into(),
        ));
    }
    let amount = min_stake
        .checked_mul(U256::from(validators.len()))
        .ok_or_else(|| BootstrapError::Abi(format!(
            "{min_stake} × {} validators overflows uint256",
            validators.len()
        )))?;
    debug!(%min_stake, validators = validators.len(), %amount, "mint amount");
    Ok(amount)
}

fn log_step(step: Step, tx: Option<TxHash>) {
    match tx {
        Some(tx) => info!(step = step.number(), name = %step, %tx, "step complete"),
        None => info!(step = step.number(), name = %step, "step complete"),
    }
}

/// Signs and submits the owner's transactions one at a time, waiting for
/// each receipt before the next nonce is used.
struct TxSender<'a, R: ?Sized> {
    rpc: &'a R,
    owner: &'a KeyPair,
    chain_id: u64,
    nonce: u64,
    config: &'a DeployConfig,
    sent: Vec<StepTransaction>,
}

impl<'a, R: ChainRpc + ?Sized> TxSender<'a, R> {
    async fn new(
        rpc: &'a R,
        owner: &'a KeyPair,
        chain_id: u64,
        config: &'a DeployConfig,
    ) -> Result<Self, BootstrapError> {
        let nonce = rpc.transaction_count(owner.address).await?;
        debug!(owner = %owner.address, nonce, "starting nonce");
        Ok(Self {
            rpc,
            owner,
            chain_id,
            nonce,
            config,
            sent: Vec::new(),
        })
    }

    async fn submit(
        &mut self,
        step: Step,
        to: Option<Address>,
        data: Vec<u8>,
        gas: u64,
    ) -> Result<TxReceipt, BootstrapError> {
        self.try_submit(step, to, data, gas)
            .await
            .map_err(|e| e.in_step(step.name()))
    }

    async fn try_submit(
        &mut self,
        step: Step,
        to: Option<Address>,
        data: Vec<u8>,
        gas: u64,
    ) -> Result<TxReceipt, BootstrapError> {
        let tx = LegacyTransaction {
            nonce: self.nonce,
            gas_price: self.config.gas_price,
            gas,
            to,
            value: 0,
            data,
            chain_id: self.chain_id,
        };
        let signed = tx.sign(self.owner)?;
        let hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            warn!(step = %step, local = %signed.hash, node = %hash, "node reported a different tx hash");
        }
        self.nonce += 1;
        self.sent.push(StepTransaction { step, hash });
        debug!(step = %step, nonce = tx.nonce, %hash, "transaction submitted");

        let receipt = self.wait_for_receipt(hash).await?;
        if !receipt.success {
            warn!(step = %step, %hash, "transaction reverted");
            return Err(BootstrapError::TransactionFailed {
                step: step.name().to_string(),
                tx_hash: hash.to_hex(),
            });
        }
        log_step(step, Some(hash));
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, BootstrapError> {
        let deadline = Instant::now() + self.config.receipt_timeout;
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(BootstrapError::RpcFailure(format!(
                    "no receipt for {hash} after {:?}",
                    self.config.receipt_timeout
                )));
            }
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }
}
