use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use stakenet_core::constants::{
    DEFAULT_CANDIDATE_MIN_STAKE, DEFAULT_DELEGATOR_MIN_STAKE, DEFAULT_GAS_LIMIT,
    DEFAULT_NETWORK_ID, DEFAULT_NETWORK_NAME, DEFAULT_OWNER_BALANCE, DEFAULT_VALIDATOR_COUNT,
    MAX_VALIDATORS, MIN_VALIDATORS,
};
use stakenet_core::error::BootstrapError;

static NETWORK_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static regex"));
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("static regex"));

/// Operator-supplied network parameters exactly as read from the
/// environment, before validation. Field names in errors are the
/// environment variable names the operator sets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawNetworkParams {
    pub network_name: String,
    pub network_id: String,
    pub owner_balance: String,
    pub delegator_min_stake: String,
    pub candidate_min_stake: String,
    pub validator_count: String,
    pub gas_limit: String,
}

impl Default for RawNetworkParams {
    fn default() -> Self {
        Self {
            network_name: DEFAULT_NETWORK_NAME.into(),
            network_id: DEFAULT_NETWORK_ID.into(),
            owner_balance: DEFAULT_OWNER_BALANCE.into(),
            delegator_min_stake: DEFAULT_DELEGATOR_MIN_STAKE.into(),
            candidate_min_stake: DEFAULT_CANDIDATE_MIN_STAKE.into(),
            validator_count: DEFAULT_VALIDATOR_COUNT.into(),
            gas_limit: DEFAULT_GAS_LIMIT.to_string(),
        }
    }
}

/// Validated network parameters.
///
/// Balances and stakes stay decimal strings: they are whole-coin amounts that
/// are written verbatim into the environment artifact and may exceed `u64`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub network_name: String,
    pub network_id: u64,
    pub owner_balance: String,
    pub delegator_min_stake: String,
    pub candidate_min_stake: String,
    pub validator_count: u32,
    pub gas_limit: u64,
}

impl RawNetworkParams {
    /// Validate every field. Nothing is generated or written by callers until
    /// this succeeds, so a bad value leaves the workspace untouched.
    pub fn validate(&self) -> Result<NetworkParams, BootstrapError> {
        let network_name = self.network_name.trim();
        if !NETWORK_NAME_RE.is_match(network_name) {
            return Err(BootstrapError::invalid(
                "NETWORK_NAME",
                "must only contain a-z symbols and digits",
            ));
        }

        let network_id = self.network_id.trim();
        if !DIGITS_RE.is_match(network_id) {
            return Err(BootstrapError::invalid("NETWORK_ID", "must be integer"));
        }
        let network_id: u64 = network_id
            .parse()
            .map_err(|_| BootstrapError::invalid("NETWORK_ID", "does not fit in 64 bits"))?;

        let owner_balance = positive_integer("OWNER_BALANCE", &self.owner_balance)?;
        let delegator_min_stake = positive_integer("DELEGATOR_MIN_STAKE", &self.delegator_min_stake)?;
        let candidate_min_stake = positive_integer("CANDIDATE_MIN_STAKE", &self.candidate_min_stake)?;

        let validator_count = self
            .validator_count
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| (MIN_VALIDATORS..=MAX_VALIDATORS).contains(n))
            .ok_or_else(|| {
                BootstrapError::invalid(
                    "VALIDATORS_NUMBER",
                    format!("must be in the range {MIN_VALIDATORS}...{MAX_VALIDATORS}"),
                )
            })?;

        let gas_limit = positive_integer("GAS_LIMIT", &self.gas_limit)?
            .parse::<u64>()
            .map_err(|_| BootstrapError::invalid("GAS_LIMIT", "does not fit in 64 bits"))?;

        Ok(NetworkParams {
            network_name: network_name.to_string(),
            network_id,
            owner_balance,
            delegator_min_stake,
            candidate_min_stake,
            validator_count,
            gas_limit,
        })
    }
}

/// Digits only and not numerically zero (`"000"` is zero).
fn positive_integer(field: &'static str, value: &str) -> Result<String, BootstrapError> {
    let value = value.trim();
    if !DIGITS_RE.is_match(value) || value.bytes().all(|b| b == b'0') {
        return Err(BootstrapError::invalid(field, "must be positive integer"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: BootstrapError) -> &'static str {
        match err {
            BootstrapError::InvalidParameter { field, .. } => field,
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let params = RawNetworkParams::default().validate().unwrap();
        assert_eq!(params.network_name, "xdaitestnet");
        assert_eq!(params.network_id, 102);
        assert_eq!(params.validator_count, 5);
        assert_eq!(params.gas_limit, 17_000_000);
    }

    #[test]
    fn network_name_with_space_is_rejected() {
        let raw = RawNetworkParams {
            network_name: "my network".into(),
            ..Default::default()
        };
        assert_eq!(field_of(raw.validate().unwrap_err()), "NETWORK_NAME");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let raw = RawNetworkParams {
            network_name: "  devnet \n".into(),
            network_id: " 77 ".into(),
            ..Default::default()
        };
        let params = raw.validate().unwrap();
        assert_eq!(params.network_name, "devnet");
        assert_eq!(params.network_id, 77);
    }

    #[test]
    fn validator_count_bounds() {
        for bad in ["0", "20", "-1", "five", ""] {
            let raw = RawNetworkParams {
                validator_count: bad.into(),
                ..Default::default()
            };
            assert_eq!(field_of(raw.validate().unwrap_err()), "VALIDATORS_NUMBER", "{bad:?}");
        }
        for good in ["1", "19"] {
            let raw = RawNetworkParams {
                validator_count: good.into(),
                ..Default::default()
            };
            assert!(raw.validate().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn zero_amounts_are_rejected() {
        let raw = RawNetworkParams {
            owner_balance: "0".into(),
            ..Default::default()
        };
        assert_eq!(field_of(raw.validate().unwrap_err()), "OWNER_BALANCE");

        let raw = RawNetworkParams {
            delegator_min_stake: "000".into(),
            ..Default::default()
        };
        assert_eq!(field_of(raw.validate().unwrap_err()), "DELEGATOR_MIN_STAKE");

        let raw = RawNetworkParams {
            candidate_min_stake: "1e3".into(),
            ..Default::default()
        };
        assert_eq!(field_of(raw.validate().unwrap_err()), "CANDIDATE_MIN_STAKE");
    }

    #[test]
    fn non_numeric_network_id_is_rejected() {
        let raw = RawNetworkParams {
            network_id: "0x66".into(),
            ..Default::default()
        };
        assert_eq!(field_of(raw.validate().unwrap_err()), "NETWORK_ID");
    }

    #[test]
    fn large_stakes_are_kept_verbatim() {
        let raw = RawNetworkParams {
            candidate_min_stake: "340282366920938463463374607431768211456".into(),
            ..Default::default()
        };
        assert_eq!(
            raw.validate().unwrap().candidate_min_stake,
            "340282366920938463463374607431768211456"
        );
    }
}
