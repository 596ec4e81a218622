//! Typed views over the POSDAO system contracts and the staking token.
//!
//! Read-only getters go through `eth_call`; state-changing methods only build
//! calldata, which the orchestrator signs and submits.

use stakenet_core::error::BootstrapError;
use stakenet_core::types::{Address, U256};
use stakenet_rpc::ChainRpc;

use crate::abi::{self, Method, ParamType, Token};

// ── ValidatorSetAuRa ─────────────────────────────────────────────────────────

pub const STAKING_CONTRACT: Method = Method::new("stakingContract", &[]);
pub const GET_VALIDATORS: Method = Method::new("getValidators", &[]);

pub struct ValidatorSetContract<'a, R: ChainRpc + ?Sized> {
    rpc: &'a R,
    address: Address,
}

impl<'a, R: ChainRpc + ?Sized> ValidatorSetContract<'a, R> {
    pub fn new(rpc: &'a R, address: Address) -> Self {
        Self { rpc, address }
    }

    pub async fn staking_contract(&self) -> Result<Address, BootstrapError> {
        let out = self.rpc.call(self.address, &STAKING_CONTRACT.encode_call(&[])).await?;
        abi::decode_address(&out)
    }

    pub async fn validators(&self) -> Result<Vec<Address>, BootstrapError> {
        let out = self.rpc.call(self.address, &GET_VALIDATORS.encode_call(&[])).await?;
        abi::decode_address_array(&out)
    }
}

// ── StakingAuRa ──────────────────────────────────────────────────────────────

pub const ERC677_TOKEN_CONTRACT: Method = Method::new("erc677TokenContract", &[]);
pub const STAKING_EPOCH: Method = Method::new("stakingEpoch", &[]);
pub const CANDIDATE_MIN_STAKE: Method = Method::new("candidateMinStake", &[]);
pub const SET_ERC677_TOKEN_CONTRACT: Method =
    Method::new("setErc677TokenContract", &[ParamType::Address]);
pub const INITIAL_VALIDATOR_STAKE: Method =
    Method::new("initialValidatorStake", &[ParamType::Uint(256)]);

pub struct StakingContract<'a, R: ChainRpc + ?Sized> {
    rpc: &'a R,
    address: Address,
}

impl<'a, R: ChainRpc + ?Sized> StakingContract<'a, R> {
    pub fn new(rpc: &'a R, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Zero until the token has been registered.
    pub async fn token(&self) -> Result<Address, BootstrapError> {
        let out = self
            .rpc
            .call(self.address, &ERC677_TOKEN_CONTRACT.encode_call(&[]))
            .await?;
        abi::decode_address(&out)
    }

    pub async fn staking_epoch(&self) -> Result<U256, BootstrapError> {
        let out = self.rpc.call(self.address, &STAKING_EPOCH.encode_call(&[])).await?;
        abi::decode_uint(&out)
    }

    pub async fn candidate_min_stake(&self) -> Result<U256, BootstrapError> {
        let out = self
            .rpc
            .call(self.address, &CANDIDATE_MIN_STAKE.encode_call(&[]))
            .await?;
        abi::decode_uint(&out)
    }
}

pub fn set_erc677_token_contract(token: Address) -> Vec<u8> {
    SET_ERC677_TOKEN_CONTRACT.encode_call(&[abi::address(token)])
}

pub fn initial_validator_stake(amount: U256) -> Vec<u8> {
    INITIAL_VALIDATOR_STAKE.encode_call(&[abi::uint(amount)])
}

// ── ERC677BridgeTokenRewardable ──────────────────────────────────────────────

pub const SET_STAKING_CONTRACT: Method = Method::new("setStakingContract", &[ParamType::Address]);
pub const SET_BLOCK_REWARD_CONTRACT: Method =
    Method::new("setBlockRewardContract", &[ParamType::Address]);
pub const MINT: Method = Method::new("mint", &[ParamType::Address, ParamType::Uint(256)]);

/// Functions the bootstrap sequence invokes on the token; a compiled artifact
/// must declare each of them.
pub const TOKEN_FUNCTIONS: [Method; 3] = [SET_STAKING_CONTRACT, SET_BLOCK_REWARD_CONTRACT, MINT];

pub fn set_staking_contract(staking: Address) -> Vec<u8> {
    SET_STAKING_CONTRACT.encode_call(&[abi::address(staking)])
}

pub fn set_block_reward_contract(block_reward: Address) -> Vec<u8> {
    SET_BLOCK_REWARD_CONTRACT.encode_call(&[abi::address(block_reward)])
}

pub fn mint(to: Address, amount: U256) -> Vec<u8> {
    MINT.encode_call(&[abi::address(to), abi::uint(amount)])
}

/// Init code for the token: bytecode followed by the encoded constructor
/// arguments in the contract's declared order,
/// `constructor(string _name, string _symbol, uint8 _decimals, uint256 _chainId)`.
pub fn token_init_code(
    bytecode: &[u8],
    name: &str,
    symbol: &str,
    decimals: u8,
    chain_id: u64,
) -> Vec<u8> {
    let mut code = bytecode.to_vec();
    code.extend(ethabi::encode(&[
        Token::String(name.to_string()),
        Token::String(symbol.to_string()),
        abi::uint(U256::from(decimals)),
        abi::uint(U256::from(chain_id)),
    ]));
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_starts_with_selector() {
        let a = Address::from_bytes([0x11; 20]);
        assert_eq!(set_staking_contract(a)[..4], SET_STAKING_CONTRACT.selector());
        assert_eq!(set_block_reward_contract(a)[..4], SET_BLOCK_REWARD_CONTRACT.selector());
        assert_eq!(set_erc677_token_contract(a)[..4], SET_ERC677_TOKEN_CONTRACT.selector());
        assert_eq!(initial_validator_stake(U256::one())[..4], INITIAL_VALIDATOR_STAKE.selector());
        assert_eq!(hex::encode(MINT.selector()), "40c10f19");
        assert_eq!(mint(a, U256::one()).len(), 4 + 64);
    }

    #[test]
    fn init_code_appends_constructor_args_name_first() {
        let code = token_init_code(&[0x60, 0x80], "Stake Token", "STAKE", 18, 102);
        assert_eq!(code[..2], [0x60u8, 0x80]);

        let args = ethabi::decode(
            &[ParamType::String, ParamType::String, ParamType::Uint(8), ParamType::Uint(256)],
            &code[2..],
        )
        .unwrap();
        assert_eq!(
            args,
            vec![
                Token::String("Stake Token".into()),
                Token::String("STAKE".into()),
                Token::Uint(U256::from(18u8)),
                Token::Uint(U256::from(102u64)),
            ]
        );
    }
}
