use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"---
# Display currency for calculated rates
currency: "AED"

providers:
  exchange_rate:
    base_url: "https://api.exchangerate-api.com"
    timeout_secs: 10

# Where saved quotes and the last rate table are kept.
# Defaults to the platform data directory.
# data_path: "/path/to/ratequote"

# Reference data can be overridden per list, e.g.
# catalog:
#   regions:
#     - id: "gulf"
#       name: "Gulf"
#       multiplier: 1.2
"#;

/// Creates a default configuration file at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_EXCHANGE_RATE_URL;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_setup_creates_config_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.yaml");

        setup_at_path(&config_path)?;

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path)?;
        assert!(content.contains("providers:"));
        assert!(content.contains("currency:"));
        Ok(())
    }

    #[test]
    fn test_setup_fails_if_config_exists() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "test")?;

        let result = setup_at_path(&config_path);
        assert!(result.unwrap_err().to_string().contains("already exists"));
        // Existing file is left alone
        assert_eq!(fs::read_to_string(&config_path)?, "test");
        Ok(())
    }

    #[test]
    fn test_default_config_is_valid_yaml() -> Result<()> {
        let config: AppConfig =
            serde_yaml::from_str(DEFAULT_CONFIG).context("Failed to parse default config")?;

        assert_eq!(config.currency, "AED");
        assert_eq!(
            config.exchange_rate_provider().base_url,
            DEFAULT_EXCHANGE_RATE_URL
        );
        assert!(config.data_path.is_none());
        config.catalog.build()?;
        Ok(())
    }
}
