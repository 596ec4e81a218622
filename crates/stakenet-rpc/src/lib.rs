//! stakenet-rpc
//!
//! Minimal Ethereum JSON-RPC 2.0 client used to observe and drive a running
//! network.
//!
//! Methods:
//!   eth_chainId               — chain id for EIP-155 signing
//!   eth_call                  — read contract state
//!   eth_getTransactionCount   — next nonce of the signing account
//!   eth_sendRawTransaction    — submit a locally signed transaction
//!   eth_getTransactionReceipt — confirm a transaction's outcome

pub mod client;
pub mod types;

pub use client::{ChainRpc, HttpChainRpc, RpcConfig};
pub use types::{parse_data, parse_quantity, to_data, TxReceipt};
