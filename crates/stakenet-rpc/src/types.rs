use serde_json::Value;
use stakenet_core::error::BootstrapError;
use stakenet_core::types::{strip_hex_prefix, Address, TxHash};

/// Mined transaction receipt, reduced to the fields the bootstrap needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    /// `status == 0x1`.
    pub success: bool,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
}

impl TxReceipt {
    pub fn from_json(value: &Value) -> Result<Self, BootstrapError> {
        let transaction_hash = value["transactionHash"]
            .as_str()
            .ok_or_else(|| malformed("receipt without transactionHash"))
            .and_then(TxHash::from_hex)?;
        let success = match &value["status"] {
            Value::Null => return Err(malformed("receipt without status")),
            status => parse_quantity(status)? == 1,
        };
        let contract_address = match value["contractAddress"].as_str() {
            Some(s) => Some(Address::from_hex(s)?),
            None => None,
        };
        let block_number = match &value["blockNumber"] {
            Value::Null => None,
            n => Some(parse_quantity(n)?),
        };
        Ok(Self {
            transaction_hash,
            success,
            contract_address,
            block_number,
        })
    }
}

/// Decode a JSON-RPC hex quantity (`"0x1a"`).
pub fn parse_quantity(value: &Value) -> Result<u64, BootstrapError> {
    let s = value
        .as_str()
        .ok_or_else(|| malformed(format!("expected hex quantity, got {value}")))?;
    let digits = strip_hex_prefix(s);
    if digits.is_empty() {
        return Err(malformed(format!("empty quantity {s:?}")));
    }
    u64::from_str_radix(digits, 16).map_err(|e| malformed(format!("quantity {s:?}: {e}")))
}

/// Decode a JSON-RPC hex data string (`"0x..."`).
pub fn parse_data(value: &Value) -> Result<Vec<u8>, BootstrapError> {
    let s = value
        .as_str()
        .ok_or_else(|| malformed(format!("expected hex data, got {value}")))?;
    hex::decode(strip_hex_prefix(s)).map_err(|e| malformed(format!("data {s:?}: {e}")))
}

pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn malformed(msg: impl Into<String>) -> BootstrapError {
    BootstrapError::RpcFailure(format!("malformed response: {}", msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantities_round_trip_through_hex() {
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity(&json!("0x66")).unwrap(), 102);
        assert!(parse_quantity(&json!("0x")).is_err());
        assert!(parse_quantity(&json!(12)).is_err());
    }

    #[test]
    fn deploy_receipt_carries_contract_address() {
        let receipt = TxReceipt::from_json(&json!({
            "transactionHash": "0x8f1c0d4bd2b03e77f8c0d53de0fbeaa4cf9d6e4fa6be6fb1ea3acd8fa1b0c2de",
            "status": "0x1",
            "contractAddress": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "blockNumber": "0x2a"
        }))
        .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(42));
        assert_eq!(
            receipt.contract_address.unwrap().to_checksum(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn failed_call_receipt() {
        let receipt = TxReceipt::from_json(&json!({
            "transactionHash": "0x8f1c0d4bd2b03e77f8c0d53de0fbeaa4cf9d6e4fa6be6fb1ea3acd8fa1b0c2de",
            "status": "0x0",
            "contractAddress": null
        }))
        .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.contract_address, None);
        assert_eq!(receipt.block_number, None);
    }

    #[test]
    fn receipt_without_status_is_rejected() {
        let err = TxReceipt::from_json(&json!({
            "transactionHash": "0x8f1c0d4bd2b03e77f8c0d53de0fbeaa4cf9d6e4fa6be6fb1ea3acd8fa1b0c2de"
        }))
        .unwrap_err();
        assert!(matches!(err, BootstrapError::RpcFailure(_)));
    }
}
