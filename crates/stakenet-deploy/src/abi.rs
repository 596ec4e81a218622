//! Contract call encoding on top of `ethabi`.
//!
//! A [`Method`] names a contract function and its input types; calldata is
//! its selector followed by the `ethabi`-encoded arguments.

use std::fmt;

use stakenet_core::error::BootstrapError;
use stakenet_core::types::{Address, U256};

pub use ethabi::{ParamType, Token};

/// A contract function by name and input types.
#[derive(Debug, Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    pub inputs: &'static [ParamType],
}

impl Method {
    pub const fn new(name: &'static str, inputs: &'static [ParamType]) -> Self {
        Self { name, inputs }
    }

    pub fn selector(&self) -> [u8; 4] {
        ethabi::short_signature(self.name, self.inputs)
    }

    /// Selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[Token]) -> Vec<u8> {
        debug_assert!(Token::types_check(args, self.inputs), "{self} called with {args:?}");
        let mut out = self.selector().to_vec();
        out.extend(ethabi::encode(args));
        out
    }

    /// Whether `function` from a compiled ABI has exactly these inputs.
    pub fn matches(&self, function: &ethabi::Function) -> bool {
        function.name == self.name && function.inputs.iter().map(|p| &p.kind).eq(self.inputs)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(ParamType::to_string).collect();
        write!(f, "{}({})", self.name, inputs.join(","))
    }
}

pub fn address(a: Address) -> Token {
    Token::Address(ethabi::Address::from(*a.as_bytes()))
}

pub fn uint(n: U256) -> Token {
    Token::Uint(n)
}

fn decode_single(kind: ParamType, data: &[u8]) -> Result<Token, BootstrapError> {
    let expected = kind.to_string();
    ethabi::decode(&[kind], data)
        .map_err(|e| BootstrapError::Abi(format!("decoding {expected}: {e}")))?
        .pop()
        .ok_or_else(|| BootstrapError::Abi(format!("decoding {expected}: no value")))
}

fn unexpected(expected: &str, token: &Token) -> BootstrapError {
    BootstrapError::Abi(format!("expected {expected}, decoded {token:?}"))
}

fn token_address(token: Token) -> Result<Address, BootstrapError> {
    match token {
        Token::Address(a) => Ok(Address::from_bytes(a.0)),
        other => Err(unexpected("address", &other)),
    }
}

pub fn decode_uint(data: &[u8]) -> Result<U256, BootstrapError> {
    match decode_single(ParamType::Uint(256), data)? {
        Token::Uint(n) => Ok(n),
        other => Err(unexpected("uint256", &other)),
    }
}

pub fn decode_address(data: &[u8]) -> Result<Address, BootstrapError> {
    token_address(decode_single(ParamType::Address, data)?)
}

pub fn decode_address_array(data: &[u8]) -> Result<Vec<Address>, BootstrapError> {
    match decode_single(ParamType::Array(Box::new(ParamType::Address)), data)? {
        Token::Array(items) => items.into_iter().map(token_address).collect(),
        other => Err(unexpected("address[]", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER: Method = Method::new("transfer", &[ParamType::Address, ParamType::Uint(256)]);

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(hex::encode(TRANSFER.selector()), "a9059cbb");
        assert_eq!(hex::encode(Method::new("balanceOf", &[ParamType::Address]).selector()), "70a08231");
        assert_eq!(TRANSFER.to_string(), "transfer(address,uint256)");
    }

    #[test]
    fn static_arguments_are_one_word_each() {
        let to = Address::from_hex("0x1100000000000000000000000000000000000001").unwrap();
        let data = TRANSFER.encode_call(&[address(to), uint(U256::from(10_000u64))]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[..4], TRANSFER.selector());
        assert_eq!(decode_address(&data[4..]).unwrap(), to);
        assert_eq!(decode_uint(&data[36..]).unwrap(), U256::from(10_000u64));
    }

    #[test]
    fn address_array_decodes() {
        let a = Address::from_bytes([0xaa; 20]);
        let b = Address::from_bytes([0xbb; 20]);
        let data = ethabi::encode(&[Token::Array(vec![address(a), address(b)])]);

        assert_eq!(decode_address_array(&data).unwrap(), vec![a, b]);
    }

    #[test]
    fn truncated_return_data_is_an_error() {
        assert!(matches!(decode_uint(&[]), Err(BootstrapError::Abi(_))));
        assert!(matches!(decode_address(&[0u8; 12]), Err(BootstrapError::Abi(_))));

        let mut data = ethabi::encode(&[uint(U256::from(32u64)), uint(U256::from(3u64))]);
        data.truncate(64);
        assert!(matches!(decode_address_array(&data), Err(BootstrapError::Abi(_))));
    }

    #[test]
    fn matches_compiled_function_by_input_types() {
        let contract = ethabi::Contract::load(
            br#"[{"type":"function","name":"transfer","stateMutability":"nonpayable",
                 "inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],
                 "outputs":[{"name":"","type":"bool"}]}]"#
                .as_slice(),
        )
        .unwrap();
        let function = contract.function("transfer").unwrap();
        assert!(TRANSFER.matches(function));
        assert!(!Method::new("transfer", &[ParamType::Address]).matches(function));
    }
}
