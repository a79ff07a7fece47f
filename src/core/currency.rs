//! Currency conversion between the ledger currency and display currencies

use crate::core::calculator::round_half_up;
use crate::core::catalog::{Currency, RateTable};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Currency every base rate and calculator result is expressed in.
pub const LEDGER_CURRENCY: &str = "AED";

/// Rates used whenever a live rate is unavailable, as units per 1 AED.
pub const FALLBACK_RATES: [(&str, f64); 11] = [
    ("AED", 1.0),
    ("USD", 0.27),
    ("EUR", 0.25),
    ("GBP", 0.21),
    ("INR", 22.5),
    ("PKR", 76.0),
    ("CAD", 0.37),
    ("AUD", 0.41),
    ("JPY", 40.5),
    ("CHF", 0.24),
    ("CNY", 1.96),
];

pub fn fallback_rates() -> HashMap<String, f64> {
    FALLBACK_RATES
        .iter()
        .map(|(id, rate)| (id.to_string(), *rate))
        .collect()
}

pub fn fallback_rate(currency_id: &str) -> Option<f64> {
    FALLBACK_RATES
        .iter()
        .find(|(id, _)| *id == currency_id)
        .map(|(_, rate)| *rate)
}

/// Source of live exchange rates quoted against `base`.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>>;
}

/// Converts ledger amounts for one display currency against a rate table
/// snapshot. Unresolvable currencies pass amounts through unchanged.
pub struct CurrencyConverter<'a> {
    currencies: &'a BTreeMap<String, Currency>,
    rates: Arc<RateTable>,
    display: String,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(
        currencies: &'a BTreeMap<String, Currency>,
        rates: Arc<RateTable>,
        display_currency: &str,
    ) -> Self {
        Self {
            currencies,
            rates,
            display: display_currency.to_string(),
        }
    }

    pub fn display_currency(&self) -> &str {
        &self.display
    }

    pub fn base_currency(&self) -> &str {
        &self.rates.base_currency
    }

    /// Units of the ledger currency per 1 unit of the base currency.
    ///
    /// When the table is based on AED this is 1; otherwise it is AED's own
    /// entry in the table.
    fn ledger_per_base(&self) -> Option<f64> {
        if self.rates.base_currency == LEDGER_CURRENCY {
            return Some(1.0);
        }
        self.rates
            .rate(&self.rates.base_currency)
            .and(self.rates.rate(LEDGER_CURRENCY))
            .filter(|rate| *rate > 0.0)
    }

    pub fn convert_from_aed(&self, aed_amount: i64) -> i64 {
        if self.display == LEDGER_CURRENCY {
            return aed_amount;
        }
        let Some(display_rate) = self.rates.rate(&self.display) else {
            debug!(
                currency = %self.display,
                "No rate for display currency, passing amount through"
            );
            return aed_amount;
        };
        if self.rates.base_currency == LEDGER_CURRENCY {
            return round_half_up(aed_amount as f64 * display_rate);
        }

        let Some(ledger_per_base) = self.ledger_per_base() else {
            debug!(
                base = %self.rates.base_currency,
                "Cannot anchor AED in rate table, passing amount through"
            );
            return aed_amount;
        };
        let aed_to_base_rate = 1.0 / ledger_per_base;
        let base_amount = aed_amount as f64 * aed_to_base_rate;
        round_half_up(base_amount * display_rate)
    }

    pub fn convert_to_aed(&self, amount: i64, from_currency: &str) -> i64 {
        if from_currency == LEDGER_CURRENCY {
            return amount;
        }
        let Some(from_rate) = self.rates.rate(from_currency).filter(|rate| *rate > 0.0) else {
            return amount;
        };
        if self.rates.base_currency == LEDGER_CURRENCY {
            return round_half_up(amount as f64 / from_rate);
        }
        match self.ledger_per_base() {
            Some(ledger_per_base) => round_half_up(amount as f64 / from_rate * ledger_per_base),
            None => amount,
        }
    }

    /// Rate of the display currency against the current base, or 1 when unknown.
    pub fn exchange_rate(&self) -> f64 {
        self.rates.rate(&self.display).unwrap_or(1.0)
    }

    pub fn currency_symbol(&self) -> String {
        if self.display == LEDGER_CURRENCY {
            return LEDGER_CURRENCY.to_string();
        }
        self.currencies
            .get(&self.display)
            .map_or_else(|| self.display.clone(), |c| c.symbol.clone())
    }
}
