use super::{catalog, ui};
use crate::service::RateService;
use anyhow::Result;
use tracing::debug;

pub async fn run(service: &RateService, base_currency: &str) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching exchange rates for {base_currency}..."));
    let result = service.refresh_rates(base_currency).await;
    spinner.finish_and_clear();

    let rates = result?;
    debug!(count = rates.len(), "Refreshed exchange rates");

    let store = service.catalog_store();
    println!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Exchange Rates", ui::StyleType::Title),
        catalog::currencies_table(store),
        catalog::rates_updated_line(&store.rate_table())
    );
    Ok(())
}
