//! `run_all.sh` / `stop_all.sh`: bring the network up or down, dashboard
//! first, then validators in order, then the archive node.

pub const ETHSTATS_DIR: &str = "ethstats";
pub const ARCHIVE_DIR: &str = "archive";

pub fn validator_dir(number: usize) -> String {
    format!("validator{number}")
}

/// Service directories in start order.
pub fn service_dirs(validator_count: usize) -> Vec<String> {
    let mut dirs = vec![ETHSTATS_DIR.to_string()];
    dirs.extend((1..=validator_count).map(validator_dir));
    dirs.push(ARCHIVE_DIR.to_string());
    dirs
}

pub fn run_all(validator_count: usize, images: &[&str]) -> String {
    let mut out = script_header();
    for image in images {
        out.push_str(&format!("docker pull {image}\n"));
    }
    for dir in service_dirs(validator_count) {
        out.push_str(&format!("(cd ./{dir} && docker-compose up -d)\n"));
        if dir == ETHSTATS_DIR {
            out.push_str("sleep 5\n");
        } else if dir != ARCHIVE_DIR {
            out.push_str("sleep 3\n");
        }
    }
    out
}

pub fn stop_all(validator_count: usize) -> String {
    let mut out = script_header();
    for dir in service_dirs(validator_count) {
        out.push_str(&format!("(cd ./{dir} && docker-compose down)\n"));
    }
    out
}

fn script_header() -> String {
    "#!/bin/bash\nset -e\ncd \"$(dirname \"$0\")\"\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_all_starts_dashboard_validators_then_archive() {
        let script = run_all(2, &["nethermind/nethermind:latest"]);
        let ups: Vec<&str> = script.lines().filter(|l| l.contains("up -d")).collect();
        assert_eq!(
            ups,
            vec![
                "(cd ./ethstats && docker-compose up -d)",
                "(cd ./validator1 && docker-compose up -d)",
                "(cd ./validator2 && docker-compose up -d)",
                "(cd ./archive && docker-compose up -d)",
            ]
        );
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("docker pull nethermind/nethermind:latest\n"));
    }

    #[test]
    fn stop_all_covers_every_service() {
        let script = stop_all(19);
        assert_eq!(script.matches("docker-compose down").count(), 21);
        assert!(script.contains("./validator19 "));
    }
}
