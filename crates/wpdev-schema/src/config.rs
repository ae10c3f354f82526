use crate::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// The `wpdev.toml` project file as written by the user.
///
/// Every field is optional; resolution into a [`ProjectConfig`](crate::ProjectConfig)
/// fills in defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub env: IndexMap<String, EnvironmentSection>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            env: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub php_version: Option<String>,
    #[serde(default)]
    pub public_directory: Option<String>,
    #[serde(default)]
    pub multisite: Option<bool>,
    /// Container-relative directory -> host path. Order is significant.
    #[serde(default)]
    pub mappings: IndexMap<String, PathMapping>,
    /// WordPress constants applied after install (`WP_SITEURL`, `WP_DEBUG`, ...).
    #[serde(default)]
    pub config: IndexMap<String, ConfigValue>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct PathMapping {
    pub path: String,
}

impl PathMapping {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Host paths starting with `/` are mounted outside the web root.
    pub fn is_absolute(&self) -> bool {
        self.path.starts_with('/')
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Integer(i) => write!(f, "{i}"),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

pub fn parse_project_str(input: &str) -> Result<ProjectFile, ConfigError> {
    let file: ProjectFile = toml::from_str(input)?;
    if file.config_version != CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(file.config_version));
    }
    Ok(file)
}

pub fn parse_project_file(path: impl AsRef<Path>) -> Result<ProjectFile, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_project_str(&content)
}
