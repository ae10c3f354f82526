use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wpdev_core::{
    CoreError, FixedAnswer, Orchestrator, RecordingSleeper, StartFailure, StartOptions,
    StartReport, StartState,
};
use wpdev_runtime::mock::{LifecycleCall, MockInstaller, MockLifecycle, VolumeBehavior};
use wpdev_runtime::topology::APP_SERVICE;
use wpdev_runtime::UpOptions;
use wpdev_store::{MemoryCacheProvider, CONFIG_CACHE_KEY};

fn never() -> bool {
    false
}

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
    home: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        let home = dir.path().join("home");
        fs::create_dir_all(&root).unwrap();
        Self {
            _dir: dir,
            root,
            home,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(self.root.join("wpdev.toml"), content).unwrap();
    }

    fn options(&self) -> StartOptions {
        StartOptions::new(&self.root, &self.home)
    }
}

fn run(
    options: &StartOptions,
    lifecycle: &MockLifecycle,
    installer: &MockInstaller,
    cache: &MemoryCacheProvider,
    sleeper: &RecordingSleeper,
) -> Result<StartReport, StartFailure> {
    let prompt = FixedAnswer(false);
    Orchestrator::new(lifecycle, installer, cache, &prompt, sleeper)
        .with_interrupt(never)
        .start(options)
}

fn start(project: &Project, lifecycle: &MockLifecycle, cache: &MemoryCacheProvider) -> StartReport {
    run(
        &project.options(),
        lifecycle,
        &MockInstaller::new(),
        cache,
        &RecordingSleeper::new(),
    )
    .unwrap()
}

fn work_dir(report: &StartReport) -> &Path {
    &report.work_directory
}

// Fresh project: reconfigures and commits; the next run skips both.
#[test]
fn fresh_project_reconfigures_once() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();

    let lifecycle = MockLifecycle::new();
    let first = start(&project, &lifecycle, &cache);
    assert!(first.reconfigured);
    assert!(first.states.contains(&StartState::Reconfiguring));
    assert!(first.states.contains(&StartState::ConfiguringApp));
    assert!(cache.peek(work_dir(&first), CONFIG_CACHE_KEY).is_some());
    assert_eq!(
        lifecycle.calls(),
        [
            LifecycleCall::StopAll,
            LifecycleCall::RemoveVolume(format!(
                "{}_wordpress",
                work_dir(&first).file_name().unwrap().to_string_lossy()
            )),
            LifecycleCall::PullAll,
            LifecycleCall::UpOne {
                service: "mysql".to_owned(),
                options: UpOptions::recreate(),
            },
            LifecycleCall::UpMany {
                services: vec![APP_SERVICE.to_owned()],
                options: UpOptions::recreate(),
            },
            LifecycleCall::PublishedPort {
                service: "mysql".to_owned(),
                internal_port: 3306,
            },
        ]
    );

    let lifecycle = MockLifecycle::new();
    let second = start(&project, &lifecycle, &cache);
    assert!(!second.reconfigured);
    assert!(!second.states.contains(&StartState::Reconfiguring));
    assert!(!second.states.contains(&StartState::ConfiguringApp));
    assert_eq!(
        second.states,
        [
            StartState::CheckingLegacy,
            StartState::LoadingConfig,
            StartState::DetectingChange,
            StartState::BringingUpDb,
            StartState::BringingUpApp,
            StartState::CleaningUp,
            StartState::Done,
        ]
    );
    assert_eq!(
        lifecycle.calls()[0],
        LifecycleCall::UpOne {
            service: "mysql".to_owned(),
            options: UpOptions::default(),
        }
    );
}

// Changing the port forces reconfiguration and shows up in the topology.
#[test]
fn port_change_reconfigures() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();

    project.write_config("[env.development]\nport = 8080\n");
    let first = start(&project, &MockLifecycle::new(), &cache);
    assert!(first.reconfigured);
    assert!(!start(&project, &MockLifecycle::new(), &cache).reconfigured);

    project.write_config("[env.development]\nport = 8888\n");
    let lifecycle = MockLifecycle::new();
    let report = start(&project, &lifecycle, &cache);
    assert!(report.reconfigured);
    assert!(report.states.contains(&StartState::Reconfiguring));

    let compose = lifecycle.last_project().unwrap();
    let app = compose.topology.service(APP_SERVICE).unwrap();
    assert_eq!(app.ports[0].to_string(), "${WPDEV_PORT:-8888}:80");

    let document = fs::read_to_string(&compose.compose_file).unwrap();
    assert!(document.contains("${WPDEV_PORT:-8888}:80"));
    assert!(!document.contains("8080"));
}

// Database probe fails five times, then succeeds.
#[test]
fn slow_database_is_waited_for() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let installer = MockInstaller::new().failing_probes(5);
    let sleeper = RecordingSleeper::new();

    let report = run(
        &project.options(),
        &MockLifecycle::new(),
        &installer,
        &cache,
        &sleeper,
    )
    .unwrap();

    assert!(report.reconfigured);
    assert_eq!(installer.probe_count(), 6);
    assert_eq!(installer.configure_attempts(), ["development"]);
    assert!(sleeper.total() >= Duration::from_secs(5));
    // Four retry delays, then the grace period.
    assert_eq!(
        sleeper.sleeps(),
        [
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(4),
        ]
    );
    assert!(cache.peek(work_dir(&report), CONFIG_CACHE_KEY).is_some());
}

#[test]
fn unreachable_database_is_fatal() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let installer = MockInstaller::new().failing_probes(u32::MAX);
    let sleeper = RecordingSleeper::new();

    let failure = run(
        &project.options(),
        &MockLifecycle::new(),
        &installer,
        &cache,
        &sleeper,
    )
    .unwrap_err();

    assert_eq!(failure.state, StartState::ConfiguringApp);
    assert!(matches!(failure.source, CoreError::Runtime(_)));
    // One initial probe plus thirty retries.
    assert_eq!(installer.probe_count(), 31);
    assert!(installer.configure_attempts().is_empty());
}

// A failed configuration never commits, so the next run reconfigures again.
#[test]
fn failed_configuration_is_not_committed() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let installer = MockInstaller::new().failing_configures(2);
    let sleeper = RecordingSleeper::new();
    let options = project.options();

    let failure = run(
        &options,
        &MockLifecycle::new(),
        &installer,
        &cache,
        &sleeper,
    )
    .unwrap_err();
    assert_eq!(failure.state, StartState::ConfiguringApp);
    assert_eq!(installer.configure_attempts().len(), 2);
    assert_eq!(sleeper.sleeps(), [Duration::from_secs(5)]);

    let work = wpdev_schema::work_directory_for(&project.home, &project.root);
    assert!(cache.peek(&work, CONFIG_CACHE_KEY).is_none());

    let retry = start(&project, &MockLifecycle::new(), &cache);
    assert!(retry.reconfigured);
    assert!(cache.peek(&work, CONFIG_CACHE_KEY).is_some());
}

#[test]
fn configuration_retry_recovers() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let installer = MockInstaller::new().failing_configures(1);
    let sleeper = RecordingSleeper::new();

    let report = run(
        &project.options(),
        &MockLifecycle::new(),
        &installer,
        &cache,
        &sleeper,
    )
    .unwrap();
    assert!(report.reconfigured);
    assert_eq!(installer.configure_attempts().len(), 2);
}

#[test]
fn update_flag_forces_reconfiguration() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    start(&project, &MockLifecycle::new(), &cache);

    let mut options = project.options();
    options.update = true;
    let report = run(
        &options,
        &MockLifecycle::new(),
        &MockInstaller::new(),
        &cache,
        &RecordingSleeper::new(),
    )
    .unwrap();
    assert!(report.reconfigured);
}

#[test]
fn port_override_feeds_checksum() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    start(&project, &MockLifecycle::new(), &cache);

    let mut options = project.options();
    options.port_override = Some(9000);
    let lifecycle = MockLifecycle::new();
    let report = run(
        &options,
        &lifecycle,
        &MockInstaller::new(),
        &cache,
        &RecordingSleeper::new(),
    )
    .unwrap();
    assert!(report.reconfigured);
    let compose = lifecycle.last_project().unwrap();
    assert_eq!(
        compose.topology.service(APP_SERVICE).unwrap().ports[0].to_string(),
        "${WPDEV_PORT:-9000}:80"
    );
}

#[test]
fn volume_removal_failure_is_a_warning() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new().with_volume(VolumeBehavior::Fail);

    let report = start(&project, &lifecycle, &cache);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("could not remove volume")));
    assert!(lifecycle.calls().contains(&LifecycleCall::PullAll));
}

#[test]
fn absent_volume_is_silent() {
    let project = Project::new();
    project.write_config("[env.development]\n");
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new().with_volume(VolumeBehavior::Absent);

    let report = start(&project, &lifecycle, &cache);
    assert!(report.warnings.is_empty());
}

#[test]
fn missing_config_file_warns_and_uses_defaults() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new();

    let report = start(&project, &lifecycle, &cache);
    assert!(report.warnings.iter().any(|w| w.contains("wpdev.toml")));
    let compose = lifecycle.last_project().unwrap();
    assert_eq!(
        compose.topology.service(APP_SERVICE).unwrap().ports[0].to_string(),
        "${WPDEV_PORT:-8888}:80"
    );
}

#[test]
fn invalid_config_file_is_fatal() {
    let project = Project::new();
    project.write_config("[env.development]\nport = \"not a port\"\n");
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new();

    let failure = run(
        &project.options(),
        &lifecycle,
        &MockInstaller::new(),
        &cache,
        &RecordingSleeper::new(),
    )
    .unwrap_err();
    assert_eq!(failure.state, StartState::LoadingConfig);
    assert!(matches!(failure.source, CoreError::Config(_)));
    assert!(lifecycle.calls().is_empty());
}

#[test]
fn start_creates_index_and_rewrite_rules() {
    let project = Project::new();
    project.write_config("[env.development]\nmultisite = true\n");
    let cache = MemoryCacheProvider::new();
    start(&project, &MockLifecycle::new(), &cache);

    let index = fs::read_to_string(project.root.join("index.php")).unwrap();
    assert_eq!(index, "<?php // Silence is golden.");
    let rules = fs::read_to_string(project.root.join(".htaccess")).unwrap();
    assert!(rules.contains("WordPress Multisite"));
}

#[test]
fn existing_rewrite_rules_are_kept() {
    let project = Project::new();
    fs::write(project.root.join(".htaccess"), "# custom").unwrap();
    let cache = MemoryCacheProvider::new();
    start(&project, &MockLifecycle::new(), &cache);
    assert_eq!(
        fs::read_to_string(project.root.join(".htaccess")).unwrap(),
        "# custom"
    );
}

#[test]
fn generated_files_are_cleaned_up() {
    let project = Project::new();
    fs::write(project.root.join("wp-config.php"), "<?php").unwrap();
    fs::write(project.root.join("phpunit-wp-config.php"), "<?php").unwrap();
    let cache = MemoryCacheProvider::new();

    let report = start(&project, &MockLifecycle::new(), &cache);
    assert!(!project.root.join("wp-config.php").exists());
    assert!(!project.root.join("phpunit-wp-config.php").exists());
    assert!(report.states.contains(&StartState::CleaningUp));
}

#[test]
fn cleanup_failure_is_a_warning() {
    let project = Project::new();
    fs::create_dir(project.root.join("phpunit-wp-config.php")).unwrap();
    let cache = MemoryCacheProvider::new();

    let report = start(&project, &MockLifecycle::new(), &cache);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("phpunit-wp-config.php")));
    assert_eq!(report.states.last(), Some(&StartState::Done));
}

#[test]
fn legacy_install_removed_when_confirmed() {
    let project = Project::new();
    let legacy = project.root.with_file_name("site-wordpress");
    fs::create_dir_all(&legacy).unwrap();
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new();
    let installer = MockInstaller::new();
    let sleeper = RecordingSleeper::new();
    let prompt = FixedAnswer(true);

    let report = Orchestrator::new(&lifecycle, &installer, &cache, &prompt, &sleeper)
        .with_interrupt(never)
        .start(&project.options())
        .unwrap();
    assert!(!legacy.exists());
    assert!(!report.warnings.iter().any(|w| w.contains("legacy")));
}

#[test]
fn declined_legacy_removal_is_a_warning() {
    let project = Project::new();
    let legacy = project.root.with_file_name("site-wordpress");
    fs::create_dir_all(&legacy).unwrap();
    let cache = MemoryCacheProvider::new();

    let report = start(&project, &MockLifecycle::new(), &cache);
    assert!(legacy.is_dir());
    assert!(report.warnings.iter().any(|w| w.contains("legacy install")));
}

#[test]
fn report_carries_site_url_and_database_port() {
    let project = Project::new();
    project.write_config(
        "[env.development.config]\nWP_SITEURL = \"http://site.test\"\nWP_DEBUG = true\n",
    );
    let cache = MemoryCacheProvider::new();
    let lifecycle = MockLifecycle::new().with_published_port(33061);

    let report = start(&project, &lifecycle, &cache);
    assert_eq!(report.site_url.as_deref(), Some("http://site.test"));
    assert_eq!(report.port, 8888);
    assert_eq!(report.database_port, 33061);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["database_port"], 33061);
    assert_eq!(json["states"][0], "checking_legacy");
}

#[test]
fn compose_file_written_in_work_directory() {
    let project = Project::new();
    let cache = MemoryCacheProvider::new();
    let report = start(&project, &MockLifecycle::new(), &cache);

    let compose = work_dir(&report).join("docker-compose.yml");
    let document: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(compose).unwrap()).unwrap();
    assert_eq!(document["services"]["cli"]["user"].as_str(), Some("33:33"));
    assert!(work_dir(&report).starts_with(&project.home));
}

#[test]
fn relative_mapping_mounts_directory_in_project_root() {
    let project = Project::new();
    fs::create_dir_all(project.root.join("theme")).unwrap();
    project.write_config(
        "[env.development.mappings]\n\"wp-content/themes/site\" = { path = \"./theme\" }\n",
    );
    let cache = MemoryCacheProvider::new();
    let report = start(&project, &MockLifecycle::new(), &cache);

    let compose_dir = work_dir(&report);
    let document: serde_yaml::Value = serde_yaml::from_str(
        &fs::read_to_string(compose_dir.join("docker-compose.yml")).unwrap(),
    )
    .unwrap();
    let mount = document["services"]["wordpress"]["volumes"][1]
        .as_str()
        .unwrap()
        .to_owned();
    let (host, container) = mount.split_once(':').unwrap();
    assert_eq!(container, "/var/www/html/wp-content/themes/site");

    // Compose resolves relative sources against the compose file's directory.
    let resolved = compose_dir.join(host);
    assert_eq!(resolved, project.root.join("theme"));
    assert!(resolved.is_dir());
}
