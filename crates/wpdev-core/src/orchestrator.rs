use crate::files::{ensure_index_file, remove_generated_files};
use crate::legacy::{check_legacy_install, LegacyOutcome, Prompt};
use crate::retry::{retry, RetryPolicy, Sleeper};
use crate::signal::shutdown_requested;
use crate::start::{transition, Effect, Facts, StartState};
use crate::{CoreError, StartFailure};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use wpdev_runtime::topology::{APP_SERVICE, DB_INTERNAL_PORT, DB_SERVICE};
use wpdev_runtime::{
    build_topology, rewrite_rules_exist, write_rewrite_rules, ComposeProject, ServiceLifecycle,
    SiteInstaller, UpOptions, VolumeRemoval,
};
use wpdev_schema::{
    config_checksum, load_project_config, Checksum, LoadOptions, ProjectConfig, CONFIG_FILE_NAME,
    DEVELOPMENT,
};
use wpdev_store::{CacheProvider, ChangeCache, WorkLayout, CONFIG_CACHE_KEY};

#[derive(Debug, Clone)]
pub struct StartOptions {
    pub project_root: PathBuf,
    pub tool_home: PathBuf,
    pub port_override: Option<u16>,
    /// Reconfigure even when the configuration is unchanged.
    pub update: bool,
    pub debug: bool,
}

impl StartOptions {
    pub fn new(project_root: impl Into<PathBuf>, tool_home: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            tool_home: tool_home.into(),
            port_override: None,
            update: false,
            debug: false,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            project_root: self.project_root.clone(),
            tool_home: self.tool_home.clone(),
            port_override: self.port_override,
            debug: self.debug,
        }
    }
}

/// Readiness and setup timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartPolicy {
    /// Retries after the first failed database probe.
    pub db_probe: RetryPolicy,
    /// Extra wait once a retried probe succeeds.
    pub db_grace: Duration,
    pub configure: RetryPolicy,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            db_probe: RetryPolicy::new(30, Duration::from_secs(1)),
            db_grace: Duration::from_secs(4),
            configure: RetryPolicy::new(2, Duration::from_secs(5)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartReport {
    pub site_url: Option<String>,
    /// Host port of the application service.
    pub port: u16,
    pub database_port: u16,
    pub reconfigured: bool,
    pub work_directory: PathBuf,
    pub warnings: Vec<String>,
    pub states: Vec<StartState>,
}

/// Lay out the work directory and write the compose document for `config`.
pub fn write_compose_project(config: &ProjectConfig) -> Result<ComposeProject, CoreError> {
    let layout = WorkLayout::new(&config.work_directory_path);
    layout.initialize()?;
    let project = ComposeProject::new(&layout, build_topology(config));
    project.write()?;
    Ok(project)
}

fn up_options(recreate: bool) -> UpOptions {
    if recreate {
        UpOptions::recreate()
    } else {
        UpOptions::default()
    }
}

/// State accumulated over one start cycle.
struct Run<'o> {
    options: &'o StartOptions,
    facts: Facts,
    config: Option<ProjectConfig>,
    project: Option<ComposeProject>,
    checksum: Option<Checksum>,
    cache: Option<ChangeCache>,
    database_port: Option<u16>,
    warnings: Vec<String>,
    states: Vec<StartState>,
}

impl<'o> Run<'o> {
    fn new(options: &'o StartOptions) -> Self {
        Self {
            options,
            facts: Facts::default(),
            config: None,
            project: None,
            checksum: None,
            cache: None,
            database_port: None,
            warnings: Vec::new(),
            states: Vec::new(),
        }
    }

    fn config(&self) -> Result<&ProjectConfig, CoreError> {
        self.config.as_ref().ok_or(CoreError::OutOfOrder("configuration"))
    }

    fn project(&self) -> Result<&ComposeProject, CoreError> {
        self.project.as_ref().ok_or(CoreError::OutOfOrder("compose project"))
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn into_report(self) -> Result<StartReport, CoreError> {
        let database_port = self.database_port.ok_or(CoreError::OutOfOrder("database port"))?;
        let config = self.config.ok_or(CoreError::OutOfOrder("configuration"))?;
        Ok(StartReport {
            site_url: config.development().site_url().map(str::to_owned),
            port: config.development().port,
            database_port,
            reconfigured: self.facts.reconfigure,
            work_directory: config.work_directory_path,
            warnings: self.warnings,
            states: self.states,
        })
    }
}

/// Executes the start cycle against injected collaborators.
///
/// Effects run strictly in the order [`transition`] yields them. The first
/// error halts the cycle; nothing already done is undone.
pub struct Orchestrator<'a> {
    lifecycle: &'a dyn ServiceLifecycle,
    installer: &'a dyn SiteInstaller,
    cache: &'a dyn CacheProvider,
    prompt: &'a dyn Prompt,
    sleeper: &'a dyn Sleeper,
    policy: StartPolicy,
    interrupted: fn() -> bool,
    on_state: Option<&'a dyn Fn(StartState)>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        lifecycle: &'a dyn ServiceLifecycle,
        installer: &'a dyn SiteInstaller,
        cache: &'a dyn CacheProvider,
        prompt: &'a dyn Prompt,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            lifecycle,
            installer,
            cache,
            prompt,
            sleeper,
            policy: StartPolicy::default(),
            interrupted: shutdown_requested,
            on_state: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: StartPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the interruption check consulted between states.
    #[must_use]
    pub fn with_interrupt(mut self, interrupted: fn() -> bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Called on entry to every state.
    #[must_use]
    pub fn on_state(mut self, callback: &'a dyn Fn(StartState)) -> Self {
        self.on_state = Some(callback);
        self
    }

    pub fn start(&self, options: &StartOptions) -> Result<StartReport, StartFailure> {
        let mut run = Run::new(options);
        let mut state = StartState::INITIAL;
        let mut effects = state.effects(run.facts);

        loop {
            debug!("entering {state}");
            run.states.push(state);
            if let Some(callback) = self.on_state {
                callback(state);
            }

            for effect in effects {
                self.apply(effect, &mut run)
                    .map_err(|source| StartFailure { state, source })?;
            }
            if state.is_terminal() {
                break;
            }

            // Reported against the last state that ran to completion.
            if (self.interrupted)() {
                return Err(StartFailure {
                    state,
                    source: CoreError::Interrupted,
                });
            }
            let next = transition(state, run.facts);
            state = next.next;
            effects = next.effects;
        }

        if let Some(cache) = run.cache.take() {
            cache.close().map_err(|e| StartFailure {
                state,
                source: e.into(),
            })?;
        }
        let report = run
            .into_report()
            .map_err(|source| StartFailure { state, source })?;
        info!(
            "environment started (database port {}, reconfigured: {})",
            report.database_port, report.reconfigured
        );
        Ok(report)
    }

    fn apply(&self, effect: Effect, run: &mut Run<'_>) -> Result<(), CoreError> {
        debug!("effect {effect:?}");
        match effect {
            Effect::CheckLegacyInstall => {
                match check_legacy_install(&run.options.project_root, self.prompt) {
                    LegacyOutcome::NotFound | LegacyOutcome::Removed(_) => {}
                    LegacyOutcome::Kept(path) => {
                        run.warn(format!("legacy install left in place at {}", path.display()));
                    }
                    LegacyOutcome::RemovalFailed { path, error } => run.warn(format!(
                        "could not remove legacy install at {}: {error}",
                        path.display()
                    )),
                }
            }
            Effect::LoadConfig => {
                let config = load_project_config(&run.options.load_options())?;
                if !config.detected_local_config {
                    run.warn(format!(
                        "no {CONFIG_FILE_NAME} found in {}; using defaults",
                        run.options.project_root.display()
                    ));
                }
                run.config = Some(config);
            }
            Effect::EnsureIndexFile => {
                ensure_index_file(&run.options.project_root)?;
            }
            Effect::WriteComposeFile => {
                let project = write_compose_project(run.config()?)?;
                run.project = Some(project);
            }
            Effect::DetectChange => {
                let config = run.config()?;
                let checksum = config_checksum(config)?;
                let cache = ChangeCache::open(self.cache, &config.work_directory_path)?;
                let changed = cache.has_changed(CONFIG_CACHE_KEY, &checksum)?;
                info!(
                    "configuration changed: {changed}, update requested: {}",
                    run.options.update
                );
                run.facts.reconfigure = changed || run.options.update;
                run.checksum = Some(checksum);
                run.cache = Some(cache);
            }
            Effect::StopAll => self.lifecycle.stop_all(run.project()?)?,
            Effect::RemoveDataVolume => {
                let volume = WorkLayout::new(&run.config()?.work_directory_path).data_volume();
                match self.lifecycle.remove_volume(&volume) {
                    Ok(VolumeRemoval::Removed) => debug!("removed volume {volume}"),
                    Ok(VolumeRemoval::Absent) => debug!("volume {volume} did not exist"),
                    Err(e) => run.warn(format!("could not remove volume {volume}: {e}")),
                }
            }
            Effect::PullAll => self.lifecycle.pull_all(run.project()?)?,
            Effect::BringUpDatabase { recreate } => {
                self.lifecycle.up_one(DB_SERVICE, run.project()?, up_options(recreate))?;
            }
            Effect::WriteRewriteRules => {
                let env = run.config()?.development();
                if !rewrite_rules_exist(&env.public_directory) {
                    write_rewrite_rules(&env.public_directory, env.multisite)?;
                }
            }
            Effect::BringUpApplication { recreate } => {
                self.lifecycle.up_many(&[APP_SERVICE], run.project()?, up_options(recreate))?;
            }
            Effect::AwaitDatabase => self.await_database(run.config()?)?,
            Effect::ConfigureSite => {
                let config = run.config()?;
                retry(self.policy.configure, self.sleeper, || {
                    self.installer.configure(DEVELOPMENT, config)
                })?;
            }
            Effect::CommitChecksum => {
                let checksum = run
                    .checksum
                    .as_ref()
                    .ok_or(CoreError::OutOfOrder("checksum"))?;
                let cache = run
                    .cache
                    .as_mut()
                    .ok_or(CoreError::OutOfOrder("change cache"))?;
                cache.commit(CONFIG_CACHE_KEY, checksum)?;
            }
            Effect::RemoveGeneratedFiles => {
                let warnings = remove_generated_files(&run.options.project_root);
                run.warnings.extend(warnings);
            }
            Effect::ReportStatus => {
                let port = self
                    .lifecycle
                    .published_port(DB_SERVICE, DB_INTERNAL_PORT, run.project()?)?;
                run.database_port = Some(port);
            }
        }
        Ok(())
    }

    /// Probe once; if that fails, keep probing under the retry policy and then
    /// give the database a grace period to finish initializing.
    fn await_database(&self, config: &ProjectConfig) -> Result<(), CoreError> {
        if let Err(e) = self.installer.check_connection(config) {
            debug!("database not ready: {e}");
            retry(self.policy.db_probe, self.sleeper, || {
                self.installer.check_connection(config)
            })?;
            self.sleeper.sleep(self.policy.db_grace);
        }
        Ok(())
    }
}
