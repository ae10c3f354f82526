//! Container topology and external collaborators for wpdev environments.
//!
//! This crate implements the execution layer: the pure mount resolver and
//! topology builder, the compose document writer, the `ServiceLifecycle` and
//! `SiteInstaller` seams with `docker compose` backends, rewrite-rule file
//! generation, prerequisite checks, and recording mocks for tests.

pub mod compose;
pub mod installer;
pub mod lifecycle;
pub mod mock;
pub mod mounts;
pub mod prereq;
pub mod rewrite;
pub mod topology;

pub use compose::ComposeProject;
pub use installer::{ComposeInstaller, SiteInstaller};
pub use lifecycle::{ComposeCli, ServiceLifecycle, UpOptions, VolumeRemoval};
pub use mounts::resolve_mounts;
pub use prereq::{check_compose_prereqs, format_missing, MissingPrereq};
pub use rewrite::{rewrite_rules_exist, write_rewrite_rules};
pub use topology::{build_topology, HostPort, PortBinding, Service, Topology};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render compose document: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("service '{0}' is not part of the topology")]
    UnknownService(String),
    #[error("environment '{0}' is not configured")]
    UnknownEnvironment(String),
    #[error("service '{service}' does not publish port {port}")]
    PortNotPublished { service: String, port: u16 },
    #[error("runtime execution failed: {0}")]
    ExecFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_stderr() {
        let e = RuntimeError::CommandFailed {
            command: "docker compose up".to_owned(),
            status: "exit status: 1".to_owned(),
            stderr: "no such image".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("docker compose up"));
        assert!(msg.contains("no such image"));
    }

    #[test]
    fn port_not_published_display() {
        let e = RuntimeError::PortNotPublished {
            service: "mysql".to_owned(),
            port: 3306,
        };
        assert!(e.to_string().contains("3306"));
    }
}
