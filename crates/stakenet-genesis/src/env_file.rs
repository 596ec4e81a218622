use stakenet_core::constants::{
    COLLECT_ROUND_LENGTH, IS_TESTNET, STAKE_WITHDRAW_DISALLOW_PERIOD, STAKING_EPOCH_DURATION,
};
use stakenet_core::types::Address;

use crate::identity::IdentityRecord;
use crate::params::NetworkParams;

/// Render the shell environment artifact consumed by the contracts
/// toolchain's spec generator (`set -a` exports every assignment).
pub fn render_env_file(params: &NetworkParams, identities: &IdentityRecord) -> String {
    let mining: Vec<Address> = identities.validators.iter().map(|v| v.mining).collect();
    let staking: Vec<Address> = identities.validators.iter().map(|v| v.staking).collect();

    let lines = [
        "#!/bin/bash".to_string(),
        "set -a".to_string(),
        format!("NETWORK_NAME={}", params.network_name),
        format!("NETWORK_ID={}", params.network_id),
        format!("OWNER={}", identities.owner),
        format!("OWNER_BALANCE={}", params.owner_balance),
        format!("INITIAL_VALIDATORS={}", join(&mining)),
        format!("STAKING_ADDRESSES={}", join(&staking)),
        format!("STAKING_EPOCH_DURATION={STAKING_EPOCH_DURATION}"),
        format!("STAKE_WITHDRAW_DISALLOW_PERIOD={STAKE_WITHDRAW_DISALLOW_PERIOD}"),
        format!("COLLECT_ROUND_LENGTH={COLLECT_ROUND_LENGTH}"),
        format!("IS_TESTNET={IS_TESTNET}"),
        format!("DELEGATOR_MIN_STAKE={}", params.delegator_min_stake),
        format!("CANDIDATE_MIN_STAKE={}", params.candidate_min_stake),
    ];
    lines.join("\n")
}

fn join(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::to_checksum)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ValidatorAddresses;
    use crate::params::RawNetworkParams;

    fn addr(last: u8) -> Address {
        let mut b = [0u8; 20];
        b[19] = last;
        Address::from_bytes(b)
    }

    #[test]
    fn artifact_lists_every_assignment_in_order() {
        let params = RawNetworkParams {
            validator_count: "2".into(),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let record = IdentityRecord {
            owner: addr(1),
            validators: vec![
                ValidatorAddresses { mining: addr(2), staking: addr(3) },
                ValidatorAddresses { mining: addr(4), staking: addr(5) },
            ],
        };

        let rendered = render_env_file(&params, &record);
        let keys: Vec<&str> = rendered
            .lines()
            .skip(2)
            .map(|l| l.split('=').next().unwrap())
            .collect();
        assert_eq!(
            keys,
            [
                "NETWORK_NAME",
                "NETWORK_ID",
                "OWNER",
                "OWNER_BALANCE",
                "INITIAL_VALIDATORS",
                "STAKING_ADDRESSES",
                "STAKING_EPOCH_DURATION",
                "STAKE_WITHDRAW_DISALLOW_PERIOD",
                "COLLECT_ROUND_LENGTH",
                "IS_TESTNET",
                "DELEGATOR_MIN_STAKE",
                "CANDIDATE_MIN_STAKE",
            ]
        );
        assert!(rendered.starts_with("#!/bin/bash\nset -a\n"));
        assert!(rendered.contains(&format!(
            "INITIAL_VALIDATORS={},{}",
            addr(2).to_checksum(),
            addr(4).to_checksum()
        )));
        assert!(rendered.contains("STAKING_EPOCH_DURATION=120992"));
        assert!(rendered.contains("IS_TESTNET=true"));
        assert!(rendered.contains("CANDIDATE_MIN_STAKE=2000"));
    }
}
