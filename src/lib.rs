pub mod cli;
pub mod core;
pub mod providers;
pub mod service;
pub mod store;

pub use crate::cli::quote::QuoteOptions;
use crate::core::Selection;
use crate::core::config::AppConfig;
use crate::providers::ExchangeRateApiProvider;
use crate::service::RateService;
use crate::store::KeyValueStore;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Catalog,
    Calculate {
        selection: Selection,
        options: QuoteOptions,
    },
    Refresh {
        base: String,
    },
    Quotes,
    Email {
        quote_path: PathBuf,
        recipient: String,
        sender: String,
        message: Option<String>,
    },
}

async fn open_service(config: &AppConfig) -> Result<RateService> {
    let catalog = config.catalog.build()?;
    let data_path = config.default_data_path()?;
    let store = KeyValueStore::open(&data_path)?;

    let provider_config = config.exchange_rate_provider();
    let provider =
        ExchangeRateApiProvider::new(&provider_config.base_url, provider_config.timeout())?;
    RateService::from_store(catalog, &store, true, Box::new(provider)).await
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Rate quote starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Catalog => {
            let service = open_service(&config).await?;
            cli::catalog::run(service.catalog_store());
            Ok(())
        }
        AppCommand::Calculate { selection, options } => {
            let service = open_service(&config).await?;
            cli::quote::run(&service, &selection, &options, &config.currency).await
        }
        AppCommand::Refresh { base } => {
            let service = open_service(&config).await?;
            cli::rates::run(&service, &base).await
        }
        AppCommand::Quotes => {
            let service = open_service(&config).await?;
            cli::quote::run_list(&service).await
        }
        AppCommand::Email {
            quote_path,
            recipient,
            sender,
            message,
        } => cli::email::run(&quote_path, &recipient, &sender, message.as_deref()),
    }
}
