use crate::config::{
    parse_project_file, ConfigValue, EnvironmentSection, PathMapping, ProjectFile,
};
use crate::detect::detect_public_directory;
use crate::ConfigError;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "wpdev.toml";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEVELOPMENT: &str = "development";

/// Length of the hex prefix of `blake3(project_root)` used as the work directory name.
const WORK_DIR_HASH_LEN: usize = 32;

/// Inputs to configuration loading. Nothing is inferred from process state.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub project_root: PathBuf,
    /// Tool-owned directory under which per-project work directories live.
    pub tool_home: PathBuf,
    /// Externally supplied development port (e.g. `WPDEV_PORT`).
    pub port_override: Option<u16>,
    pub debug: bool,
}

/// Fully resolved project configuration.
///
/// Serializes to the canonical form hashed by [`config_checksum`](crate::config_checksum).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_root: PathBuf,
    pub config_directory_path: PathBuf,
    pub work_directory_path: PathBuf,
    pub environments: Environments,
    /// Whether a `wpdev.toml` was found in the project root.
    #[serde(skip)]
    pub detected_local_config: bool,
    #[serde(skip)]
    pub debug: bool,
}

impl ProjectConfig {
    pub fn development(&self) -> &EnvironmentSpec {
        &self.environments.development
    }
}

/// Named environments. `development` always exists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Environments {
    pub development: EnvironmentSpec,
    #[serde(flatten)]
    pub others: IndexMap<String, EnvironmentSpec>,
}

impl Environments {
    pub fn get(&self, name: &str) -> Option<&EnvironmentSpec> {
        if name == DEVELOPMENT {
            Some(&self.development)
        } else {
            self.others.get(name)
        }
    }

    pub fn names(&self) -> Vec<&str> {
        std::iter::once(DEVELOPMENT)
            .chain(self.others.keys().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnvironmentSpec {
    pub port: u16,
    pub php_version: Option<String>,
    pub public_directory: PathBuf,
    pub multisite: bool,
    pub mappings: IndexMap<String, PathMapping>,
    pub config: IndexMap<String, ConfigValue>,
}

impl EnvironmentSpec {
    pub fn site_url(&self) -> Option<&str> {
        self.config.get("WP_SITEURL").and_then(ConfigValue::as_str)
    }
}

/// Work directory for a project: `<tool_home>/<hash of project root>`.
///
/// Distinct project roots never share a work directory.
pub fn work_directory_for(tool_home: &Path, project_root: &Path) -> PathBuf {
    let hash = blake3::hash(project_root.to_string_lossy().as_bytes())
        .to_hex()
        .to_string();
    tool_home.join(&hash[..WORK_DIR_HASH_LEN])
}

/// Load `wpdev.toml` from the project root and resolve it.
///
/// A missing file is not an error: defaults are used and
/// `detected_local_config` is `false`. A present but invalid file is an error.
pub fn load_project_config(options: &LoadOptions) -> Result<ProjectConfig, ConfigError> {
    let path = options.project_root.join(CONFIG_FILE_NAME);
    let (file, detected) = if path.is_file() {
        (parse_project_file(&path)?, true)
    } else {
        (ProjectFile::default(), false)
    };
    resolve(file, detected, options)
}

fn resolve(
    mut file: ProjectFile,
    detected_local_config: bool,
    options: &LoadOptions,
) -> Result<ProjectConfig, ConfigError> {
    let root = &options.project_root;

    let development_section = file.env.shift_remove(DEVELOPMENT).unwrap_or_default();
    let mut development = resolve_environment(DEVELOPMENT, development_section, root)?;
    if let Some(port) = options.port_override {
        if port == 0 {
            return Err(ConfigError::InvalidPort(DEVELOPMENT.to_owned()));
        }
        development.port = port;
    }

    let mut others = IndexMap::new();
    for (name, section) in file.env {
        let spec = resolve_environment(&name, section, root)?;
        others.insert(name, spec);
    }

    Ok(ProjectConfig {
        project_root: root.clone(),
        config_directory_path: root.clone(),
        work_directory_path: work_directory_for(&options.tool_home, root),
        environments: Environments {
            development,
            others,
        },
        detected_local_config,
        debug: options.debug,
    })
}

fn resolve_environment(
    name: &str,
    section: EnvironmentSection,
    project_root: &Path,
) -> Result<EnvironmentSpec, ConfigError> {
    let port = section.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(ConfigError::InvalidPort(name.to_owned()));
    }

    for (key, mapping) in &section.mappings {
        if key.trim_matches('/').is_empty() {
            return Err(ConfigError::EmptyMappingKey(name.to_owned()));
        }
        if mapping.path.is_empty() {
            return Err(ConfigError::EmptyMappingPath {
                env: name.to_owned(),
                key: key.clone(),
            });
        }
    }

    let public_directory = match section.public_directory.as_deref() {
        Some(dir) => project_root.join(dir),
        None => detect_public_directory(project_root)
            .map_or_else(|| project_root.to_path_buf(), |dir| project_root.join(dir)),
    };

    Ok(EnvironmentSpec {
        port,
        php_version: section.php_version.filter(|v| !v.trim().is_empty()),
        public_directory,
        multisite: section.multisite.unwrap_or(false),
        mappings: section.mappings,
        config: section.config,
    })
}
