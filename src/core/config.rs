use crate::core::catalog::{
    self, Catalog, Currency, DurationOption, Region, Role, SeniorityLevel, WorkloadOption,
};
use crate::core::currency::LEDGER_CURRENCY;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://api.exchangerate-api.com";

fn default_timeout_secs() -> u64 {
    10
}

fn default_currency() -> String {
    LEDGER_CURRENCY.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExchangeRateProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExchangeRateProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    pub exchange_rate: Option<ExchangeRateProviderConfig>,
}

/// Reference data overrides. Omitted lists use the built-in catalog.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "catalog::default_regions")]
    pub regions: Vec<Region>,
    #[serde(default = "catalog::default_roles")]
    pub roles: Vec<Role>,
    #[serde(default = "catalog::default_seniority_levels")]
    pub seniority_levels: Vec<SeniorityLevel>,
    #[serde(default = "catalog::default_currencies")]
    pub currencies: Vec<Currency>,
    #[serde(default = "catalog::default_workload_options")]
    pub workload_options: Vec<WorkloadOption>,
    #[serde(default = "catalog::default_duration_options")]
    pub duration_options: Vec<DurationOption>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            regions: catalog::default_regions(),
            roles: catalog::default_roles(),
            seniority_levels: catalog::default_seniority_levels(),
            currencies: catalog::default_currencies(),
            workload_options: catalog::default_workload_options(),
            duration_options: catalog::default_duration_options(),
        }
    }
}

impl CatalogConfig {
    pub fn build(&self) -> Result<Catalog> {
        Catalog::new(
            self.regions.clone(),
            self.roles.clone(),
            self.seniority_levels.clone(),
            self.currencies.clone(),
            self.workload_options.clone(),
            self.duration_options.clone(),
        )
        .context("Invalid catalog configuration")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Display currency for calculated rates
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            providers: ProvidersConfig::default(),
            data_path: None,
            catalog: CatalogConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "ratequote", "ratequote")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "ratequote", "ratequote")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn exchange_rate_provider(&self) -> ExchangeRateProviderConfig {
        self.providers.exchange_rate.clone().unwrap_or_default()
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::RateCategory;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "USD"
providers:
  exchange_rate:
    base_url: "http://example.com/rates"
    timeout_secs: 3
data_path: "/tmp/ratequote"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "USD");
        let provider = config.exchange_rate_provider();
        assert_eq!(provider.base_url, "http://example.com/rates");
        assert_eq!(provider.timeout(), Duration::from_secs(3));
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/ratequote")
        );
        // Catalog falls back to the built-in reference data
        assert_eq!(config.catalog.regions, catalog::default_regions());
        assert!(config.catalog.build().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.currency, "AED");
        assert!(config.providers.exchange_rate.is_none());
        let provider = config.exchange_rate_provider();
        assert_eq!(provider.base_url, DEFAULT_EXCHANGE_RATE_URL);
        assert_eq!(provider.timeout_secs, 10);
    }

    #[test]
    fn test_catalog_overrides() {
        let yaml_str = r#"
catalog:
  regions:
    - id: "gulf"
      name: "Gulf"
      multiplier: 1.2
  roles:
    - id: "rust-engineer"
      name: "Rust Engineer"
      category: custom
      base_rate: 170
    - id: "swat-rust"
      name: "SWAT Rust"
      category: swat
      base_rate: 220
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let catalog = config.catalog.build().unwrap();
        assert_eq!(catalog.regions.len(), 1);
        assert_eq!(catalog.region("gulf").unwrap().multiplier, 1.2);
        assert_eq!(catalog.roles_by_category(RateCategory::Swat).len(), 1);
        assert_eq!(
            catalog.seniority_levels.len(),
            catalog::default_seniority_levels().len()
        );

        let invalid = r#"
catalog:
  seniority_levels:
    - id: "ghost"
      name: "Ghost"
      multiplier: -1.0
"#;
        let config: AppConfig = serde_yaml::from_str(invalid).expect("Failed to deserialize");
        assert!(config.catalog.build().is_err());
    }
}
