use crate::config::types::MirrorConfig;
use crate::ConfigError;

/// Validates a configuration
///
/// Checks:
/// - Concurrency must be at least 1
/// - Navigation timeout and network-idle window must be non-zero
/// - The output directory must not be empty
/// - A max-pages ceiling of zero makes no sense (the root itself could
///   never be admitted)
pub fn validate(config: &MirrorConfig) -> Result<(), ConfigError> {
    if config.concurrency == 0 {
        return Err(ConfigError::Validation(
            "concurrency must be at least 1".to_string(),
        ));
    }

    if config.navigation_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.network_idle_ms == 0 {
        return Err(ConfigError::Validation(
            "network-idle-ms must be greater than 0".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir must not be empty".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be greater than 0 when set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&MirrorConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = MirrorConfig {
            concurrency: 0,
            ..MirrorConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = MirrorConfig {
            navigation_timeout_ms: 0,
            ..MirrorConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_dir_rejected() {
        let config = MirrorConfig {
            output_dir: PathBuf::new(),
            ..MirrorConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let config = MirrorConfig {
            max_pages: Some(0),
            ..MirrorConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_positive_max_pages_accepted() {
        let config = MirrorConfig {
            max_pages: Some(50),
            ..MirrorConfig::default()
        };
        assert!(validate(&config).is_ok());
    }
}
