use std::fmt;
use std::process::{Command, Stdio};

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check the container engine and its compose plugin.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_compose_prereqs() -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !succeeds("docker", &["--version"]) {
        missing.push(MissingPrereq {
            name: "docker",
            purpose: "running the database and web server containers",
            install_hint: "https://docs.docker.com/engine/install/",
        });
    } else if !succeeds("docker", &["compose", "version"]) {
        missing.push(MissingPrereq {
            name: "docker compose",
            purpose: "bringing services up in dependency order",
            install_hint:
                "zypper install docker-compose | apt install docker-compose-plugin | dnf install docker-compose-plugin | pacman -S docker-compose",
        });
    } else if !succeeds("docker", &["info"]) {
        missing.push(MissingPrereq {
            name: "docker daemon",
            purpose: "container execution",
            install_hint: "start the daemon (systemctl start docker) and check socket permissions",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nwpdev requires these tools to run local WordPress environments.");
    msg
}
