//! CLI subprocess integration tests.
//!
//! These run the `wpdev` binary against temporary projects. None of them
//! needs a container engine: `topology` and `doctor` never start containers,
//! and `start` is only exercised up to configuration loading.

use std::path::Path;
use std::process::{Command, Output};

fn wpdev_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wpdev"));
    cmd.env("WPDEV_SKIP_PREREQS", "1");
    cmd.env_remove("WPDEV_PORT");
    cmd.env_remove("WPDEV_HOME");
    cmd.env_remove("WPDEV_LOG");
    cmd
}

fn run_in(project: &Path, home: &Path, args: &[&str]) -> Output {
    wpdev_bin()
        .arg("--project")
        .arg(project)
        .arg("--home")
        .arg(home)
        .args(args)
        .output()
        .unwrap()
}

fn write_config(project: &Path, content: &str) {
    std::fs::write(project.join("wpdev.toml"), content).unwrap();
}

#[test]
fn cli_version_exits_zero() {
    let output = wpdev_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "wpdev --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wpdev"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let output = wpdev_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["start", "stop", "topology", "doctor"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_unknown_command_fails() {
    let output = wpdev_bin().arg("destroy-everything").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn topology_prints_compose_document() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_config(
        project.path(),
        "[env.development]\nport = 8080\nphp_version = \"8.1\"\n",
    );

    let output = run_in(project.path(), home.path(), &["topology"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mysql"));
    assert!(stdout.contains("wordpress:php8.1"));
    assert!(stdout.contains("wordpress:cli-php8.1"));
    assert!(stdout.contains("${WPDEV_PORT:-8080}:80"));
}

#[test]
fn topology_does_not_create_work_directory() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let output = run_in(project.path(), home.path(), &["topology"]);
    assert!(output.status.success());
    let entries = std::fs::read_dir(home.path()).unwrap().count();
    assert_eq!(entries, 0, "topology must not write into the tool home");
}

#[test]
fn topology_json_lists_services() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let output = run_in(project.path(), home.path(), &["--json", "topology"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let services = json["services"].as_object().unwrap();
    for name in ["mysql", "wordpress", "cli", "composer"] {
        assert!(services.contains_key(name), "missing service {name}");
    }
    assert_eq!(json["services"]["wordpress"]["depends_on"][0], "mysql");
}

#[test]
fn topology_port_flag_overrides_config() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_config(project.path(), "[env.development]\nport = 8080\n");
    let output = run_in(project.path(), home.path(), &["topology", "--port", "9001"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("${WPDEV_PORT:-9001}:80"));
}

#[test]
fn invalid_config_exits_with_config_error() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_config(project.path(), "[env.development]\nport = \"not a port\"\n");

    let output = run_in(project.path(), home.path(), &["topology"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config error"), "stderr: {stderr}");
}

#[test]
fn start_with_invalid_config_exits_with_config_error() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_config(project.path(), "config_version = 9\n");

    let output = run_in(project.path(), home.path(), &["--json", "start"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading_config"), "stderr: {stderr}");
}

#[test]
fn missing_project_directory_fails() {
    let home = tempfile::tempdir().unwrap();
    let project = home.path().join("absent");
    let output = run_in(&project, home.path(), &["topology"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn doctor_json_is_parseable() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    let output = run_in(project.path(), home.path(), &["--json", "doctor"]);
    // Healthy or not depends on the host's container engine.
    assert!(matches!(output.status.code(), Some(0 | 1)));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["healthy"].is_boolean());
    let names: Vec<&str> = json["checks"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"runtime_prereqs"));
    assert!(names.contains(&"config"));
}

#[test]
fn doctor_reports_invalid_config() {
    let project = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_config(project.path(), "unknown_key = true\n");
    let output = run_in(project.path(), home.path(), &["--json", "doctor"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["healthy"], false);
    let config = json["checks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "config")
        .unwrap();
    assert_eq!(config["status"], "fail");
}
