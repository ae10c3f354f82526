use crate::project::ProjectConfig;
use crate::types::Checksum;
use crate::ConfigError;

/// Hash the entire resolved configuration: every environment, mapping,
/// version, port, and tool-owned path. Any edit yields a different checksum.
pub fn config_checksum(config: &ProjectConfig) -> Result<Checksum, ConfigError> {
    let canonical = serde_json::to_string(config)?;
    Ok(Checksum::new(
        blake3::hash(canonical.as_bytes()).to_hex().to_string(),
    ))
}
