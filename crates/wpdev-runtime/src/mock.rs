//! Recording collaborators for tests. Nothing here touches a container engine.

use crate::compose::ComposeProject;
use crate::installer::SiteInstaller;
use crate::lifecycle::{ServiceLifecycle, UpOptions, VolumeRemoval};
use crate::RuntimeError;
use std::sync::{Mutex, MutexGuard};
use wpdev_schema::ProjectConfig;

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, RuntimeError> {
    m.lock()
        .map_err(|e| RuntimeError::ExecFailed(format!("mutex poisoned: {e}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCall {
    PullAll,
    UpOne {
        service: String,
        options: UpOptions,
    },
    UpMany {
        services: Vec<String>,
        options: UpOptions,
    },
    StopAll,
    PublishedPort {
        service: String,
        internal_port: u16,
    },
    RemoveVolume(String),
}

/// How [`MockLifecycle::remove_volume`] responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeBehavior {
    Present,
    Absent,
    Fail,
}

pub struct MockLifecycle {
    calls: Mutex<Vec<LifecycleCall>>,
    last_project: Mutex<Option<ComposeProject>>,
    published_port: u16,
    volume: VolumeBehavior,
    failing_service: Option<String>,
}

impl Default for MockLifecycle {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            last_project: Mutex::new(None),
            published_port: 49153,
            volume: VolumeBehavior::Present,
            failing_service: None,
        }
    }
}

impl MockLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_published_port(mut self, port: u16) -> Self {
        self.published_port = port;
        self
    }

    #[must_use]
    pub fn with_volume(mut self, behavior: VolumeBehavior) -> Self {
        self.volume = behavior;
        self
    }

    /// Make bringing up `service` fail.
    #[must_use]
    pub fn failing_up(mut self, service: &str) -> Self {
        self.failing_service = Some(service.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<LifecycleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// The project passed to the most recent `up_*` call.
    pub fn last_project(&self) -> Option<ComposeProject> {
        self.last_project.lock().ok().and_then(|p| p.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: LifecycleCall) -> Result<(), RuntimeError> {
        lock(&self.calls)?.push(call);
        Ok(())
    }

    fn bring_up(&self, services: &[&str], project: &ComposeProject) -> Result<(), RuntimeError> {
        for service in services {
            project.ensure_service(service)?;
        }
        *lock(&self.last_project)? = Some(project.clone());
        if let Some(failing) = &self.failing_service {
            if services.contains(&failing.as_str()) {
                return Err(RuntimeError::ExecFailed(format!(
                    "mock: {failing} failed to start"
                )));
            }
        }
        Ok(())
    }
}

impl ServiceLifecycle for MockLifecycle {
    fn pull_all(&self, _project: &ComposeProject) -> Result<(), RuntimeError> {
        self.record(LifecycleCall::PullAll)
    }

    fn up_one(
        &self,
        service: &str,
        project: &ComposeProject,
        options: UpOptions,
    ) -> Result<(), RuntimeError> {
        self.record(LifecycleCall::UpOne {
            service: service.to_owned(),
            options,
        })?;
        self.bring_up(&[service], project)
    }

    fn up_many(
        &self,
        services: &[&str],
        project: &ComposeProject,
        options: UpOptions,
    ) -> Result<(), RuntimeError> {
        self.record(LifecycleCall::UpMany {
            services: services.iter().map(|s| (*s).to_owned()).collect(),
            options,
        })?;
        self.bring_up(services, project)
    }

    fn stop_all(&self, _project: &ComposeProject) -> Result<(), RuntimeError> {
        self.record(LifecycleCall::StopAll)
    }

    fn published_port(
        &self,
        service: &str,
        internal_port: u16,
        project: &ComposeProject,
    ) -> Result<u16, RuntimeError> {
        self.record(LifecycleCall::PublishedPort {
            service: service.to_owned(),
            internal_port,
        })?;
        project.ensure_service(service)?;
        let exposed = project
            .topology
            .service(service)
            .is_some_and(|s| s.exposes(internal_port));
        if exposed {
            Ok(self.published_port)
        } else {
            Err(RuntimeError::PortNotPublished {
                service: service.to_owned(),
                port: internal_port,
            })
        }
    }

    fn remove_volume(&self, name: &str) -> Result<VolumeRemoval, RuntimeError> {
        self.record(LifecycleCall::RemoveVolume(name.to_owned()))?;
        match self.volume {
            VolumeBehavior::Present => Ok(VolumeRemoval::Removed),
            VolumeBehavior::Absent => Ok(VolumeRemoval::Absent),
            VolumeBehavior::Fail => Err(RuntimeError::CommandFailed {
                command: format!("docker volume rm {name}"),
                status: "exit status: 1".to_owned(),
                stderr: "volume is in use".to_owned(),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct InstallerState {
    probe_failures: u32,
    configure_failures: u32,
    probes: u32,
    configured: Vec<String>,
}

/// Site installer whose probes and configure calls fail a fixed number of
/// times before succeeding.
#[derive(Default)]
pub struct MockInstaller {
    state: Mutex<InstallerState>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_probes(mut self, times: u32) -> Self {
        if let Ok(state) = self.state.get_mut() {
            state.probe_failures = times;
        }
        self
    }

    #[must_use]
    pub fn failing_configures(mut self, times: u32) -> Self {
        if let Ok(state) = self.state.get_mut() {
            state.configure_failures = times;
        }
        self
    }

    pub fn probe_count(&self) -> u32 {
        self.state.lock().map(|s| s.probes).unwrap_or(0)
    }

    /// Every configure attempt, successful or not, by environment name.
    pub fn configure_attempts(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.configured.clone())
            .unwrap_or_default()
    }
}

impl SiteInstaller for MockInstaller {
    fn check_connection(&self, _config: &ProjectConfig) -> Result<(), RuntimeError> {
        let mut state = lock(&self.state)?;
        state.probes += 1;
        if state.probe_failures > 0 {
            state.probe_failures -= 1;
            return Err(RuntimeError::ExecFailed("mock: database not ready".to_owned()));
        }
        Ok(())
    }

    fn configure(&self, env_name: &str, config: &ProjectConfig) -> Result<(), RuntimeError> {
        let mut state = lock(&self.state)?;
        state.configured.push(env_name.to_owned());
        if config.environments.get(env_name).is_none() {
            return Err(RuntimeError::UnknownEnvironment(env_name.to_owned()));
        }
        if state.configure_failures > 0 {
            state.configure_failures -= 1;
            return Err(RuntimeError::ExecFailed("mock: configuration failed".to_owned()));
        }
        Ok(())
    }
}
