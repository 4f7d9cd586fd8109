/// Integration tests for the equi-join demo binary: spawn it as a real
/// subprocess, the way the teacher's own CLI integration tests drive
/// `cargo run -p cli` and assert on stdout, rather than calling `main`
/// in-process.
use std::process::Command;

fn run_cli(num_instances: &str, threshold_mb: &str, algorithm: Option<&str>) -> String {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-p", "cli", "--"])
        .env("JOIN_NUM_INSTANCES", num_instances)
        .env("JOIN_HASH_THRESHOLD_MB", threshold_mb);
    if let Some(a) = algorithm {
        cmd.env("JOIN_ALGORITHM", a);
    } else {
        cmd.env_remove("JOIN_ALGORITHM");
    }
    let output = cmd.output().expect("failed to spawn cli");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn default_run_joins_the_demo_dataset() {
    let output = run_cli("2", "1", None);
    assert!(output.contains("total output rows across all peers: 3"));
}

#[test]
fn single_instance_still_joins_correctly() {
    let output = run_cli("1", "1", None);
    assert!(output.contains("total output rows across all peers: 3"));
}

#[test]
fn forced_merge_algorithm_produces_the_same_row_count() {
    let output = run_cli("2", "1", Some("merge_left_first"));
    assert!(output.contains("total output rows across all peers: 3"));
}
