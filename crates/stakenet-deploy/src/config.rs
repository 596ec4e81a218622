use std::time::Duration;

use stakenet_core::constants::{
    BLOCK_REWARD_CONTRACT, BOOTSTRAP_GAS_PRICE, CALL_GAS_LIMIT, DEPLOY_GAS_LIMIT,
    STAKING_TOKEN_CONTRACT_NAME, STAKING_TOKEN_DECIMALS, STAKING_TOKEN_NAME, STAKING_TOKEN_SYMBOL,
    VALIDATOR_SET_CONTRACT,
};
use stakenet_core::error::BootstrapError;
use stakenet_core::types::Address;

use crate::retry::RetryPolicy;

/// Parameters of the token deploy-and-wire sequence.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub validator_set: Address,
    pub block_reward: Address,
    pub token_contract: String,
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub gas_price: u128,
    pub deploy_gas_limit: u64,
    pub call_gas_limit: u64,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub retry: RetryPolicy,
}

impl DeployConfig {
    /// POSDAO genesis system-contract addresses and the default token.
    pub fn posdao() -> Result<Self, BootstrapError> {
        Ok(Self {
            validator_set: Address::from_hex(VALIDATOR_SET_CONTRACT)?,
            block_reward: Address::from_hex(BLOCK_REWARD_CONTRACT)?,
            token_contract: STAKING_TOKEN_CONTRACT_NAME.to_string(),
            token_name: STAKING_TOKEN_NAME.to_string(),
            token_symbol: STAKING_TOKEN_SYMBOL.to_string(),
            token_decimals: STAKING_TOKEN_DECIMALS,
            gas_price: BOOTSTRAP_GAS_PRICE,
            deploy_gas_limit: DEPLOY_GAS_LIMIT,
            call_gas_limit: CALL_GAS_LIMIT,
            receipt_poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posdao_defaults() {
        let c = DeployConfig::posdao().unwrap();
        assert_eq!(c.validator_set.to_hex(), "1000000000000000000000000000000000000001");
        assert_eq!(c.block_reward.to_hex(), "2000000000000000000000000000000000000001");
        assert_eq!(c.gas_price, 0);
        assert_eq!((c.deploy_gas_limit, c.call_gas_limit), (4_700_000, 1_000_000));
        assert_eq!(c.token_contract, "ERC677BridgeTokenRewardable");
    }
}
