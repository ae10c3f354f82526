use crate::lifecycle::render_command;
use crate::topology::CLI_SERVICE;
use crate::RuntimeError;
use std::process::{Command, Stdio};
use tracing::{debug, info};
use wpdev_schema::{ConfigValue, EnvironmentSpec, ProjectConfig};
use wpdev_store::WorkLayout;

const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "password";
const ADMIN_EMAIL: &str = "wordpress@example.com";

/// Application-level setup run inside the started environment.
pub trait SiteInstaller {
    /// Fails while the database does not accept connections.
    fn check_connection(&self, config: &ProjectConfig) -> Result<(), RuntimeError>;

    /// Install the site and apply configured constants. Safe to repeat.
    fn configure(&self, env_name: &str, config: &ProjectConfig) -> Result<(), RuntimeError>;
}

/// Runs `wp` commands in a throwaway command-runner container.
#[derive(Debug, Clone, Default)]
pub struct ComposeInstaller {
    debug: bool,
}

impl ComposeInstaller {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    fn run_cli(&self, config: &ProjectConfig, args: &[String]) -> Result<(), RuntimeError> {
        let compose_file = WorkLayout::new(&config.work_directory_path).compose_file();
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("--file")
            .arg(&compose_file)
            .args(["run", "--rm", CLI_SERVICE])
            .args(args)
            .stdin(Stdio::null());

        let rendered = render_command(&cmd);
        debug!("running {rendered}");
        let output = cmd
            .output()
            .map_err(|e| RuntimeError::ExecFailed(format!("{rendered}: {e}")))?;
        if self.debug {
            debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
        }
        if output.status.success() {
            Ok(())
        } else {
            Err(RuntimeError::CommandFailed {
                command: rendered,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

impl SiteInstaller for ComposeInstaller {
    fn check_connection(&self, config: &ProjectConfig) -> Result<(), RuntimeError> {
        self.run_cli(config, &probe_command())
    }

    fn configure(&self, env_name: &str, config: &ProjectConfig) -> Result<(), RuntimeError> {
        let env = config
            .environments
            .get(env_name)
            .ok_or_else(|| RuntimeError::UnknownEnvironment(env_name.to_owned()))?;
        let title = config
            .project_root
            .file_name()
            .map_or_else(|| "wpdev".to_owned(), |n| n.to_string_lossy().into_owned());

        for args in configure_commands(env, &title) {
            self.run_cli(config, &args)?;
        }
        info!("configured environment '{env_name}'");
        Ok(())
    }
}

fn wp(args: &[&str]) -> Vec<String> {
    std::iter::once("wp")
        .chain(args.iter().copied())
        .map(str::to_owned)
        .collect()
}

pub fn probe_command() -> Vec<String> {
    wp(&["db", "check"])
}

/// `wp` invocations that install the site and then set each configured constant.
pub fn configure_commands(env: &EnvironmentSpec, title: &str) -> Vec<Vec<String>> {
    let url = env
        .site_url()
        .map_or_else(|| format!("localhost:{}", env.port), str::to_owned);
    let install = if env.multisite {
        "multisite-install"
    } else {
        "install"
    };

    let mut commands = vec![wp(&[
        "core",
        install,
        &format!("--url={url}"),
        &format!("--title={title}"),
        &format!("--admin_user={ADMIN_USER}"),
        &format!("--admin_password={ADMIN_PASSWORD}"),
        &format!("--admin_email={ADMIN_EMAIL}"),
        "--skip-email",
    ])];

    for (key, value) in &env.config {
        let rendered = value.to_string();
        let mut args = vec!["config", "set", key.as_str(), rendered.as_str(), "--anyway"];
        if !matches!(value, ConfigValue::String(_)) {
            args.push("--raw");
        }
        commands.push(wp(&args));
    }
    commands
}
