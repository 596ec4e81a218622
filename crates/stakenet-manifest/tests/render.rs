use std::path::Path;

use stakenet_genesis::{IdentitySet, Topology};
use stakenet_manifest::{render, ComposeFile, ManifestConfig};

fn config() -> ManifestConfig {
    let mut config = ManifestConfig::new("posdaotest", 12_500_000);
    config.ethstats_secret = "Zx81Qw7mPa".into();
    config.seq_api_key = Some("seq-key-from-operator".into());
    config
}

fn compose_at(set: &stakenet_manifest::ManifestSet, path: &str) -> ComposeFile {
    let file = set.get(path).unwrap_or_else(|| panic!("{path} not rendered"));
    ComposeFile::from_yaml(&file.contents).unwrap()
}

#[test]
fn renders_one_manifest_per_validator_plus_dashboard_and_archive() {
    let identities = IdentitySet::generate(3).unwrap();
    let set = render(&config(), &identities, &Topology::new("203.0.113.7")).unwrap();

    let paths: Vec<&Path> = set.files.iter().map(|f| f.path.as_path()).collect();
    assert_eq!(
        paths,
        vec![
            Path::new("ethstats/docker-compose.yml"),
            Path::new("validator1/docker-compose.yml"),
            Path::new("validator2/docker-compose.yml"),
            Path::new("validator3/docker-compose.yml"),
            Path::new("archive/docker-compose.yml"),
            Path::new("run_all.sh"),
            Path::new("stop_all.sh"),
        ]
    );
}

#[test]
fn validator_manifests_follow_identity_order() {
    let identities = IdentitySet::generate(2).unwrap();
    let set = render(&config(), &identities, &Topology::new("203.0.113.7")).unwrap();

    for (i, validator) in identities.validators.iter().enumerate() {
        let n = i + 1;
        let file = compose_at(&set, &format!("validator{n}/docker-compose.yml"));
        let svc = &file.services["nethermind"];
        let env = &svc.environment;
        let port = (30300 + n).to_string();

        assert_eq!(svc.container_name.as_deref(), Some(format!("posdaotest-validator{n}").as_str()));
        assert_eq!(env["NETHERMIND_KEYSTORECONFIG_TESTNODEKEY"], *validator.mining.secret_hex());
        assert_eq!(env["NETHERMIND_NETWORKCONFIG_P2PPORT"], port);
        assert_eq!(env["NETHERMIND_NETWORKCONFIG_DISCOVERYPORT"], port);
        assert_eq!(env["NETHERMIND_MININGCONFIG_TARGETBLOCKGASLIMIT"], "12500000");
        assert_eq!(env["NETHERMIND_SEQCONFIG_APIKEY"], "seq-key-from-operator");
        assert_eq!(env["NETHERMIND_ETHSTATSCONFIG_SECRET"], "Zx81Qw7mPa");
        assert_eq!(env["NETHERMIND_ETHSTATSCONFIG_SERVER"], "ws://203.0.113.7:3000/api");
        assert!(svc.volumes.contains(&"../spec.json:/nethermind/spec.json:ro".to_string()));
        assert_eq!(svc.ports, vec![format!("{port}:{port}"), format!("{port}:{port}/udp")]);
    }
}

#[test]
fn archive_node_is_keyed_by_owner_and_exposes_rpc() {
    let identities = IdentitySet::generate(1).unwrap();
    let set = render(&config(), &identities, &Topology::new("198.51.100.2")).unwrap();

    let file = compose_at(&set, "archive/docker-compose.yml");
    let svc = &file.services["nethermind"];
    assert_eq!(
        svc.environment["NETHERMIND_KEYSTORECONFIG_ENODEACCOUNT"],
        identities.owner.address.to_checksum()
    );
    assert_eq!(svc.environment["NETHERMIND_NETWORKCONFIG_P2PPORT"], "30300");
    assert_eq!(svc.environment["NETHERMIND_NETWORKCONFIG_EXTERNALIP"], "198.51.100.2");
    for mapping in ["8545:8545", "8546:8546", "30300:30300", "30300:30300/udp"] {
        assert!(svc.ports.iter().any(|p| p == mapping), "missing {mapping}");
    }
    // The archive never carries a private key.
    assert!(!set
        .get("archive/docker-compose.yml")
        .unwrap()
        .contents
        .contains(identities.owner.secret_hex().as_str()));
}

#[test]
fn writes_tree_with_executable_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let identities = IdentitySet::generate(2).unwrap();
    let set = render(&config(), &identities, &Topology::new("203.0.113.7")).unwrap();
    set.write(dir.path()).unwrap();

    assert!(dir.path().join("validator2/docker-compose.yml").is_file());
    let run_all = std::fs::read_to_string(dir.path().join("run_all.sh")).unwrap();
    assert!(run_all.contains("./validator2 && docker-compose up -d"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(dir.path().join("stop_all.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    // Rendering again replaces the files in place.
    set.write(dir.path()).unwrap();
}
