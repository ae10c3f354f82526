//! Service graph derived from a resolved project configuration.
//!
//! The graph serializes directly to a compose document. It is rebuilt on
//! every run and never read back.

use crate::mounts::resolve_mounts;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use wpdev_schema::{database_environment, ImageRef, ProjectConfig, DB_NAME, DB_PASSWORD};

pub const DB_SERVICE: &str = "mysql";
pub const APP_SERVICE: &str = "wordpress";
pub const CLI_SERVICE: &str = "cli";
pub const COMPOSER_SERVICE: &str = "composer";

pub const WEB_ROOT: &str = "/var/www/html";
pub const DB_INTERNAL_PORT: u16 = 3306;
pub const APP_INTERNAL_PORT: u16 = 80;

/// Environment variable that overrides the published application port at
/// compose time.
pub const PORT_OVERRIDE_VAR: &str = "WPDEV_PORT";

/// Named volume holding the database files.
pub const DB_VOLUME: &str = "mysql";

const COMPOSE_VERSION: &str = "3.7";
const DB_IMAGE: &str = "mariadb";
const APP_IMAGE: &str = "wordpress";
const COMPOSER_IMAGE: &str = "composer";
const DB_DATA_DIR: &str = "/var/lib/mysql";
const COMPOSER_WORKDIR: &str = "/app";
/// uid:gid of `www-data` in the WordPress images.
const CLI_USER: &str = "33:33";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Topology {
    pub version: String,
    pub services: BTreeMap<String, Service>,
    pub volumes: BTreeMap<String, NamedVolume>,
}

impl Topology {
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Service {
    pub image: ImageRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortBinding>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Service {
    fn new(image: ImageRef) -> Self {
        Self {
            image,
            depends_on: Vec::new(),
            ports: Vec::new(),
            environment: BTreeMap::new(),
            volumes: Vec::new(),
            user: None,
        }
    }

    /// Container port bound by a published or ephemeral port entry.
    pub fn exposes(&self, container_port: u16) -> bool {
        self.ports.iter().any(|p| p.container_port() == container_port)
    }
}

/// Named volume with driver defaults. Serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NamedVolume {}

/// Host side of a published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPort {
    Fixed(u16),
    /// `${VAR:-default}`: the variable wins when set at compose time.
    Overridable { var: String, default: u16 },
}

impl HostPort {
    /// The port in effect when no override is set.
    pub fn default_port(&self) -> u16 {
        match self {
            HostPort::Fixed(port) | HostPort::Overridable { default: port, .. } => *port,
        }
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPort::Fixed(port) => write!(f, "{port}"),
            HostPort::Overridable { var, default } => write!(f, "${{{var}:-{default}}}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortBinding {
    /// Container port published on a host port chosen by the engine.
    Ephemeral(u16),
    Published { host: HostPort, container: u16 },
}

impl PortBinding {
    pub fn container_port(&self) -> u16 {
        match self {
            PortBinding::Ephemeral(port) | PortBinding::Published { container: port, .. } => *port,
        }
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortBinding::Ephemeral(port) => write!(f, "{port}"),
            PortBinding::Published { host, container } => write!(f, "{host}:{container}"),
        }
    }
}

impl Serialize for PortBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn app_image(php_version: Option<&str>) -> ImageRef {
    match php_version {
        Some(v) => ImageRef::new(format!("{APP_IMAGE}:php{v}")),
        None => ImageRef::new(APP_IMAGE),
    }
}

fn cli_image(php_version: Option<&str>) -> ImageRef {
    match php_version {
        Some(v) => ImageRef::new(format!("{APP_IMAGE}:cli-php{v}")),
        None => ImageRef::new(format!("{APP_IMAGE}:cli")),
    }
}

/// Build the service graph for the development environment.
pub fn build_topology(config: &ProjectConfig) -> Topology {
    let env = config.development();
    let php_version = env.php_version.as_deref();
    let mounts = resolve_mounts(&config.project_root, env);

    let mut db = Service::new(ImageRef::new(DB_IMAGE));
    db.ports.push(PortBinding::Ephemeral(DB_INTERNAL_PORT));
    db.environment
        .insert("MYSQL_ROOT_PASSWORD".to_owned(), DB_PASSWORD.to_owned());
    db.environment
        .insert("MYSQL_DATABASE".to_owned(), DB_NAME.to_owned());
    db.volumes.push(format!("{DB_VOLUME}:{DB_DATA_DIR}"));

    let mut app = Service::new(app_image(php_version));
    app.depends_on.push(DB_SERVICE.to_owned());
    app.ports.push(PortBinding::Published {
        host: HostPort::Overridable {
            var: PORT_OVERRIDE_VAR.to_owned(),
            default: env.port,
        },
        container: APP_INTERNAL_PORT,
    });
    app.environment = database_environment();
    app.volumes.clone_from(&mounts);

    let mut cli = Service::new(cli_image(php_version));
    cli.depends_on.push(APP_SERVICE.to_owned());
    cli.environment = database_environment();
    cli.volumes = mounts;
    cli.user = Some(CLI_USER.to_owned());

    let mut composer = Service::new(ImageRef::new(COMPOSER_IMAGE));
    composer.volumes.push(format!(
        "{}:{COMPOSER_WORKDIR}",
        config.config_directory_path.display()
    ));

    Topology {
        version: COMPOSE_VERSION.to_owned(),
        services: BTreeMap::from([
            (DB_SERVICE.to_owned(), db),
            (APP_SERVICE.to_owned(), app),
            (CLI_SERVICE.to_owned(), cli),
            (COMPOSER_SERVICE.to_owned(), composer),
        ]),
        volumes: BTreeMap::from([(DB_VOLUME.to_owned(), NamedVolume::default())]),
    }
}
