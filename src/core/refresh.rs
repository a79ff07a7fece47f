//! Refreshing the exchange rate table from a live source.

use crate::core::currency::{ExchangeRateProvider, fallback_rate, fallback_rates};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Currencies kept from a live rate response, in display order.
pub const SUPPORTED_CURRENCIES: [&str; 11] = [
    "AED", "USD", "EUR", "GBP", "INR", "PKR", "CAD", "AUD", "JPY", "CHF", "CNY",
];

/// Fetches rates quoted against `base_currency`.
///
/// Never fails: a fetch error yields the full fallback table, and any
/// supported currency missing from a successful response gets its fallback
/// constant.
#[instrument(name = "UpdateExchangeRates", skip(provider))]
pub async fn update_exchange_rates(
    provider: &dyn ExchangeRateProvider,
    base_currency: &str,
) -> HashMap<String, f64> {
    let live = match provider.fetch_rates(base_currency).await {
        Ok(rates) => rates,
        Err(e) => {
            warn!(error = %e, "Failed to fetch exchange rates, using fallback rates");
            return fallback_rates();
        }
    };

    SUPPORTED_CURRENCIES
        .iter()
        .filter_map(|id| {
            let rate = match live.get(*id) {
                Some(rate) if rate.is_finite() && *rate > 0.0 => *rate,
                _ => {
                    debug!(currency = *id, "Missing live rate, using fallback");
                    fallback_rate(id)?
                }
            };
            Some((id.to_string(), rate))
        })
        .collect()
}
