//! Project configuration parsing, resolution, and change checksums for wpdev.
//!
//! This crate defines the schema layer: the `wpdev.toml` project file
//! (`ProjectFile`), its resolution into a fully populated `ProjectConfig`
//! (`load_project_config`), public-directory detection, the fixed database
//! credentials shared by every service, and the configuration checksum that
//! gates reconfiguration (`config_checksum`).

pub mod checksum;
pub mod config;
pub mod database;
pub mod detect;
pub mod project;
pub mod types;

pub use checksum::config_checksum;
pub use config::{
    parse_project_file, parse_project_str, ConfigValue, EnvironmentSection, PathMapping,
    ProjectFile,
};
pub use database::{database_environment, DB_NAME, DB_PASSWORD, DB_USER};
pub use detect::detect_public_directory;
pub use project::{
    load_project_config, work_directory_for, EnvironmentSpec, Environments, LoadOptions,
    ProjectConfig, CONFIG_FILE_NAME, DEFAULT_PORT, DEVELOPMENT,
};
pub use types::{Checksum, ImageRef};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported config_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("environment '{0}': port must not be 0")]
    InvalidPort(String),
    #[error("environment '{0}': mapping directory must not be empty")]
    EmptyMappingKey(String),
    #[error("environment '{env}': mapping '{key}' has an empty path")]
    EmptyMappingPath { env: String, key: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
