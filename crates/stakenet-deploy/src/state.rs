use stakenet_core::error::BootstrapError;
use stakenet_core::types::{Address, U256};
use stakenet_rpc::ChainRpc;

use crate::contracts::StakingContract;

/// Where the chain stands with respect to the staking-token bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    /// No token registered and still in epoch 0: the sequence must run.
    NotDeployed,
    /// The staking contract already references a token.
    AlreadyDeployed { token: Address },
    /// Epoch advanced without a token; initial staking can no longer happen.
    PastBootstrapWindow { epoch: U256 },
}

/// Classify the on-chain pair `(erc677TokenContract, stakingEpoch)`.
///
/// A registered token wins over a non-zero epoch.
pub fn infer_state(token: Address, epoch: U256) -> DeploymentState {
    if !token.is_zero() {
        DeploymentState::AlreadyDeployed { token }
    } else if !epoch.is_zero() {
        DeploymentState::PastBootstrapWindow { epoch }
    } else {
        DeploymentState::NotDeployed
    }
}

/// Read both values from the staking contract and classify them.
pub async fn observe<R: ChainRpc + ?Sized>(
    staking: &StakingContract<'_, R>,
) -> Result<DeploymentState, BootstrapError> {
    let token = staking.token().await?;
    let epoch = staking.staking_epoch().await?;
    Ok(infer_state(token, epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_chain_needs_deployment() {
        assert_eq!(infer_state(Address::ZERO, U256::zero()), DeploymentState::NotDeployed);
    }

    #[test]
    fn registered_token_means_deployed_regardless_of_epoch() {
        let token = Address::from_bytes([0x42; 20]);
        assert_eq!(
            infer_state(token, U256::zero()),
            DeploymentState::AlreadyDeployed { token }
        );
        assert_eq!(
            infer_state(token, U256::from(7u64)),
            DeploymentState::AlreadyDeployed { token }
        );
    }

    #[test]
    fn later_epoch_without_token_is_past_window() {
        assert_eq!(
            infer_state(Address::ZERO, U256::one()),
            DeploymentState::PastBootstrapWindow { epoch: U256::one() }
        );
    }
}
