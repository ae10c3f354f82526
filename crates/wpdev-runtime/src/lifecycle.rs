use crate::compose::ComposeProject;
use crate::RuntimeError;
use serde::Serialize;
use std::process::{Command, Output, Stdio};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpOptions {
    /// Recreate containers even if their configuration is unchanged.
    pub force_recreate: bool,
    /// Rebuild images before starting.
    pub rebuild_image: bool,
}

impl UpOptions {
    /// Options used while reconfiguring: rebuild and recreate everything.
    pub fn recreate() -> Self {
        Self {
            force_recreate: true,
            rebuild_image: true,
        }
    }
}

/// Outcome of removing a named volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeRemoval {
    Removed,
    /// The volume did not exist. Expected on a fresh project.
    Absent,
}

/// Container lifecycle operations over a compose project.
///
/// Every call blocks until the engine has finished.
pub trait ServiceLifecycle {
    fn pull_all(&self, project: &ComposeProject) -> Result<(), RuntimeError>;

    fn up_one(
        &self,
        service: &str,
        project: &ComposeProject,
        options: UpOptions,
    ) -> Result<(), RuntimeError> {
        self.up_many(&[service], project, options)
    }

    fn up_many(
        &self,
        services: &[&str],
        project: &ComposeProject,
        options: UpOptions,
    ) -> Result<(), RuntimeError>;

    fn stop_all(&self, project: &ComposeProject) -> Result<(), RuntimeError>;

    /// Host port the engine bound for `internal_port` of `service`.
    fn published_port(
        &self,
        service: &str,
        internal_port: u16,
        project: &ComposeProject,
    ) -> Result<u16, RuntimeError>;

    fn remove_volume(&self, name: &str) -> Result<VolumeRemoval, RuntimeError>;
}

/// `docker compose` command-line backend.
#[derive(Debug, Clone, Default)]
pub struct ComposeCli {
    debug: bool,
}

impl ComposeCli {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    fn compose(project: &ComposeProject) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose").arg("--file").arg(&project.compose_file);
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Output, RuntimeError> {
        let rendered = render_command(&cmd);
        debug!("running {rendered}");
        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RuntimeError::ExecFailed(format!("{rendered}: {e}")))?;

        if self.debug {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.trim().is_empty() {
                debug!("{rendered} stdout:\n{}", stdout.trim_end());
            }
        }

        if output.status.success() {
            Ok(output)
        } else {
            Err(RuntimeError::CommandFailed {
                command: rendered,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

pub(crate) fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ServiceLifecycle for ComposeCli {
    fn pull_all(&self, project: &ComposeProject) -> Result<(), RuntimeError> {
        let mut cmd = Self::compose(project);
        cmd.args(["pull", "--quiet"]);
        self.run(cmd)?;
        Ok(())
    }

    fn up_many(
        &self,
        services: &[&str],
        project: &ComposeProject,
        options: UpOptions,
    ) -> Result<(), RuntimeError> {
        for service in services {
            project.ensure_service(service)?;
        }
        let mut cmd = Self::compose(project);
        cmd.args(["up", "--detach"]);
        if options.rebuild_image {
            cmd.arg("--build");
        }
        if options.force_recreate {
            cmd.arg("--force-recreate");
        }
        cmd.args(services);
        self.run(cmd)?;
        Ok(())
    }

    fn stop_all(&self, project: &ComposeProject) -> Result<(), RuntimeError> {
        let mut cmd = Self::compose(project);
        cmd.arg("down");
        self.run(cmd)?;
        Ok(())
    }

    fn published_port(
        &self,
        service: &str,
        internal_port: u16,
        project: &ComposeProject,
    ) -> Result<u16, RuntimeError> {
        project.ensure_service(service)?;
        let mut cmd = Self::compose(project);
        cmd.arg("port").arg(service).arg(internal_port.to_string());
        let output = self.run(cmd)?;
        parse_published_port(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            RuntimeError::PortNotPublished {
                service: service.to_owned(),
                port: internal_port,
            }
        })
    }

    fn remove_volume(&self, name: &str) -> Result<VolumeRemoval, RuntimeError> {
        let mut cmd = Command::new("docker");
        cmd.args(["volume", "rm", name]);
        match self.run(cmd) {
            Ok(_) => Ok(VolumeRemoval::Removed),
            Err(RuntimeError::CommandFailed { stderr, .. })
                if stderr.to_lowercase().contains("no such volume") =>
            {
                debug!("volume {name} does not exist");
                Ok(VolumeRemoval::Absent)
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse `docker compose port` output such as `0.0.0.0:49153` or `[::]:49153`.
///
/// Only the first line is considered; the port is whatever follows the last `:`.
pub fn parse_published_port(output: &str) -> Option<u16> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    line.rsplit(':').next()?.parse().ok()
}
