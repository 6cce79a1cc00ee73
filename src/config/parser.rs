use std::path::Path;

use crate::config::types::MirrorConfig;
use crate::config::validation::validate;
use crate::ConfigError;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(MirrorConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the
///   configuration
pub fn load_config(path: &Path) -> Result<MirrorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: MirrorConfig = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}
