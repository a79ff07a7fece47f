//! Reference data used to price resources: regions, roles, seniority levels,
//! currencies and the exchange rate table they are quoted against.

use crate::core::currency::{self, LEDGER_CURRENCY};
use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Geographic cost adjustment applied to a role's base rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub multiplier: f64,
}

/// Which calculator a role (and the quote produced from it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateCategory {
    Custom,
    Swat,
}

impl Display for RateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateCategory::Custom => "custom",
                RateCategory::Swat => "swat",
            }
        )
    }
}

impl FromStr for RateCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "custom" => Ok(RateCategory::Custom),
            "swat" => Ok(RateCategory::Swat),
            _ => Err(anyhow!("Invalid rate category: {}", s)),
        }
    }
}

/// A billable role. `base_rate` is a monthly amount in the ledger currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub category: RateCategory,
    pub base_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityLevel {
    pub id: String,
    pub name: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

/// An enumerated choice (workload or duration) offered to the SWAT calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub value: String,
}

pub type WorkloadOption = ChoiceOption;
pub type DurationOption = ChoiceOption;

/// Exchange rates expressed as "units of X per 1 unit of `base_currency`".
///
/// The base currency and the rates always travel together; a refresh replaces
/// the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub base_currency: String,
    pub rates: HashMap<String, f64>,
    pub updated_at: DateTime<Utc>,
}

impl RateTable {
    pub fn new(base_currency: &str, rates: HashMap<String, f64>) -> Self {
        Self {
            base_currency: base_currency.to_string(),
            rates,
            updated_at: Utc::now(),
        }
    }

    /// The table a fresh catalog starts with: fallback rates against AED.
    pub fn fallback() -> Self {
        Self {
            base_currency: LEDGER_CURRENCY.to_string(),
            rates: currency::fallback_rates(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn rate(&self, currency_id: &str) -> Option<f64> {
        self.rates.get(currency_id).copied()
    }

    /// Every rate must be finite and positive, and the base must be quoted.
    pub fn validate(&self) -> Result<()> {
        if !self.rates.contains_key(&self.base_currency) {
            bail!("Rate table has no rate for its base currency {}", self.base_currency);
        }
        for (currency, rate) in &self.rates {
            if !is_positive(*rate) {
                bail!("Rate table has an invalid rate {rate} for {currency}");
            }
        }
        Ok(())
    }
}

/// Immutable reference data keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub regions: BTreeMap<String, Region>,
    pub roles: BTreeMap<String, Role>,
    pub seniority_levels: BTreeMap<String, SeniorityLevel>,
    pub currencies: BTreeMap<String, Currency>,
    pub workload_options: Vec<WorkloadOption>,
    pub duration_options: Vec<DurationOption>,
}

fn keyed<T>(items: Vec<T>, id: impl Fn(&T) -> &str) -> BTreeMap<String, T> {
    items
        .into_iter()
        .map(|item| (id(&item).to_string(), item))
        .collect()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl Catalog {
    pub fn new(
        regions: Vec<Region>,
        roles: Vec<Role>,
        seniority_levels: Vec<SeniorityLevel>,
        currencies: Vec<Currency>,
        workload_options: Vec<WorkloadOption>,
        duration_options: Vec<DurationOption>,
    ) -> Result<Self> {
        let catalog = Self {
            regions: keyed(regions, |r| &r.id),
            roles: keyed(roles, |r| &r.id),
            seniority_levels: keyed(seniority_levels, |s| &s.id),
            currencies: keyed(currencies, |c| &c.id),
            workload_options,
            duration_options,
        };
        catalog.validate()?;
        debug!(
            regions = catalog.regions.len(),
            roles = catalog.roles.len(),
            seniority_levels = catalog.seniority_levels.len(),
            currencies = catalog.currencies.len(),
            "Built catalog"
        );
        Ok(catalog)
    }

    /// The built-in reference data.
    pub fn seeded() -> Self {
        Self {
            regions: keyed(default_regions(), |r| &r.id),
            roles: keyed(default_roles(), |r| &r.id),
            seniority_levels: keyed(default_seniority_levels(), |s| &s.id),
            currencies: keyed(default_currencies(), |c| &c.id),
            workload_options: default_workload_options(),
            duration_options: default_duration_options(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for region in self.regions.values() {
            if !is_positive(region.multiplier) {
                bail!("Region '{}' must have a positive multiplier", region.id);
            }
        }
        for role in self.roles.values() {
            if role.base_rate == 0 {
                bail!("Role '{}' must have a positive base rate", role.id);
            }
        }
        for level in self.seniority_levels.values() {
            if !is_positive(level.multiplier) {
                bail!("Seniority level '{}' must have a positive multiplier", level.id);
            }
        }
        if !self.currencies.contains_key(LEDGER_CURRENCY) {
            bail!("Catalog must include the ledger currency {LEDGER_CURRENCY}");
        }
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    /// A role, only if it belongs to `category`.
    pub fn role_in(&self, id: &str, category: RateCategory) -> Option<&Role> {
        self.roles.get(id).filter(|role| role.category == category)
    }

    pub fn seniority(&self, id: &str) -> Option<&SeniorityLevel> {
        self.seniority_levels.get(id)
    }

    pub fn currency(&self, id: &str) -> Option<&Currency> {
        self.currencies.get(id)
    }

    pub fn roles_by_category(&self, category: RateCategory) -> Vec<&Role> {
        self.roles
            .values()
            .filter(|role| role.category == category)
            .collect()
    }
}

/// Shared catalog plus the current rate table.
///
/// Reads take an `Arc` snapshot of the rate table, so a concurrent refresh
/// never exposes a base currency paired with another base's rates.
pub struct CatalogStore {
    catalog: Catalog,
    rates: RwLock<Arc<RateTable>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog, rates: RateTable) -> Self {
        Self {
            catalog,
            rates: RwLock::new(Arc::new(rates)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rate_table(&self) -> Arc<RateTable> {
        let rates = self.rates.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&rates)
    }

    pub fn base_currency(&self) -> String {
        self.rate_table().base_currency.clone()
    }

    /// Swaps in a new rate table; last writer wins.
    pub fn replace_rates(&self, table: RateTable) {
        debug!(base = %table.base_currency, "Replacing rate table");
        let mut rates = self.rates.write().unwrap_or_else(PoisonError::into_inner);
        *rates = Arc::new(table);
    }

    /// Currencies paired with their current rate, if the table has one.
    pub fn currencies(&self) -> Vec<(Currency, Option<f64>)> {
        let table = self.rate_table();
        self.catalog
            .currencies
            .values()
            .map(|c| (c.clone(), table.rate(&c.id)))
            .collect()
    }

    pub fn converter(&self, display_currency: &str) -> currency::CurrencyConverter<'_> {
        currency::CurrencyConverter::new(
            &self.catalog.currencies,
            self.rate_table(),
            display_currency,
        )
    }
}

fn region(id: &str, name: &str, multiplier: f64) -> Region {
    Region {
        id: id.to_string(),
        name: name.to_string(),
        multiplier,
    }
}

fn role(id: &str, name: &str, category: RateCategory, base_rate: u32) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        category,
        base_rate,
    }
}

fn seniority(id: &str, name: &str, multiplier: f64) -> SeniorityLevel {
    SeniorityLevel {
        id: id.to_string(),
        name: name.to_string(),
        multiplier,
    }
}

fn choice(id: &str, label: &str, value: &str) -> ChoiceOption {
    ChoiceOption {
        id: id.to_string(),
        label: label.to_string(),
        value: value.to_string(),
    }
}

pub fn months_label(months: i32) -> String {
    if months == 1 {
        "1 month".to_string()
    } else {
        format!("{months} months")
    }
}

pub fn default_regions() -> Vec<Region> {
    vec![
        region("south-asia", "South Asia", 1.00),
        region("southeast-asia", "Southeast Asia", 1.05),
        region("east-asia", "East Asia", 1.10),
        region("middle-east", "Middle East", 1.15),
        region("eastern-europe", "Eastern Europe", 1.20),
        region("australia", "Australia", 1.30),
        region("western-europe", "Western Europe", 1.35),
        region("north-america", "North America", 1.40),
    ]
}

pub fn default_roles() -> Vec<Role> {
    use RateCategory::{Custom, Swat};
    vec![
        role("frontend-developer", "Frontend Developer", Custom, 120),
        role("backend-developer", "Backend Developer", Custom, 130),
        role("fullstack-developer", "Full-Stack Developer", Custom, 140),
        role("mobile-developer", "Mobile Developer", Custom, 135),
        role("devops-engineer", "DevOps Engineer", Custom, 150),
        role("data-engineer", "Data Engineer", Custom, 160),
        role("qa-engineer", "QA Engineer", Custom, 100),
        role("ui-ux-designer", "UI/UX Designer", Custom, 110),
        role("project-manager", "Project Manager", Custom, 145),
        role("swat-qa-specialist", "SWAT QA Specialist", Swat, 150),
        role("swat-devops-specialist", "SWAT DevOps Specialist", Swat, 180),
        role("swat-fullstack-engineer", "SWAT Full-Stack Engineer", Swat, 200),
        role("swat-solution-architect", "SWAT Solution Architect", Swat, 250),
    ]
}

pub fn default_seniority_levels() -> Vec<SeniorityLevel> {
    vec![
        seniority("junior", "Junior", 0.80),
        seniority("mid", "Mid", 1.00),
        seniority("senior", "Senior", 1.40),
        seniority("lead", "Lead", 1.60),
    ]
}

pub fn default_currencies() -> Vec<Currency> {
    [
        ("AED", "UAE Dirham", "AED"),
        ("USD", "US Dollar", "$"),
        ("EUR", "Euro", "€"),
        ("GBP", "British Pound", "£"),
        ("INR", "Indian Rupee", "₹"),
        ("PKR", "Pakistani Rupee", "₨"),
        ("CAD", "Canadian Dollar", "C$"),
        ("AUD", "Australian Dollar", "A$"),
        ("JPY", "Japanese Yen", "¥"),
        ("CHF", "Swiss Franc", "CHF"),
        ("CNY", "Chinese Yuan", "¥"),
    ]
    .into_iter()
    .map(|(id, name, symbol)| Currency {
        id: id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
    })
    .collect()
}

pub fn default_workload_options() -> Vec<WorkloadOption> {
    vec![
        choice("workload-25", "25% (Part-time)", "25"),
        choice("workload-50", "50% (Half-time)", "50"),
        choice("workload-75", "75%", "75"),
        choice("workload-100", "100% (Full-time)", "100"),
    ]
}

pub fn default_duration_options() -> Vec<DurationOption> {
    (1..=6)
        .map(|months| {
            choice(
                &format!("duration-{months}"),
                &months_label(months),
                &months.to_string(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_catalog_is_valid() {
        let catalog = Catalog::seeded();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.region("middle-east").unwrap().multiplier, 1.15);
        assert_eq!(catalog.role("frontend-developer").unwrap().base_rate, 120);
        assert_eq!(catalog.seniority("senior").unwrap().multiplier, 1.40);
        assert_eq!(catalog.currencies.len(), 11);
    }

    #[test]
    fn test_roles_by_category() {
        let catalog = Catalog::seeded();
        let swat = catalog.roles_by_category(RateCategory::Swat);
        assert!(!swat.is_empty());
        assert!(swat.iter().all(|r| r.category == RateCategory::Swat));

        let custom = catalog.roles_by_category(RateCategory::Custom);
        assert_eq!(custom.len() + swat.len(), catalog.roles.len());
    }

    #[test]
    fn test_catalog_rejects_invalid_entries() {
        let result = Catalog::new(
            vec![region("nowhere", "Nowhere", 0.0)],
            default_roles(),
            default_seniority_levels(),
            default_currencies(),
            vec![],
            vec![],
        );
        assert!(result.unwrap_err().to_string().contains("nowhere"));

        let result = Catalog::new(
            default_regions(),
            vec![role("free", "Free", RateCategory::Custom, 0)],
            default_seniority_levels(),
            default_currencies(),
            vec![],
            vec![],
        );
        assert!(result.is_err());

        let no_aed: Vec<Currency> = default_currencies()
            .into_iter()
            .filter(|c| c.id != "AED")
            .collect();
        let result = Catalog::new(
            default_regions(),
            default_roles(),
            default_seniority_levels(),
            no_aed,
            vec![],
            vec![],
        );
        assert!(result.unwrap_err().to_string().contains("AED"));
    }

    #[test]
    fn test_rate_category_parsing() {
        assert_eq!("SWAT".parse::<RateCategory>().unwrap(), RateCategory::Swat);
        assert_eq!(
            "custom".parse::<RateCategory>().unwrap(),
            RateCategory::Custom
        );
        assert!("team".parse::<RateCategory>().is_err());
        assert_eq!(RateCategory::Swat.to_string(), "swat");
    }

    #[test]
    fn test_store_replaces_rate_table_whole() {
        let store = CatalogStore::new(Catalog::seeded(), RateTable::fallback());
        assert_eq!(store.base_currency(), "AED");
        let before = store.rate_table();

        let rates = HashMap::from([("USD".to_string(), 1.0), ("AED".to_string(), 3.6725)]);
        store.replace_rates(RateTable::new("USD", rates));

        let after = store.rate_table();
        assert_eq!(after.base_currency, "USD");
        assert_eq!(after.rate("AED"), Some(3.6725));
        // Earlier snapshots stay internally consistent
        assert_eq!(before.base_currency, "AED");
        assert_eq!(before.rate("USD"), Some(0.27));
    }

    #[test]
    fn test_rate_table_validation() {
        assert!(RateTable::fallback().validate().is_ok());

        let mut negative = RateTable::fallback();
        negative.rates.insert("USD".to_string(), -0.27);
        assert!(negative.validate().unwrap_err().to_string().contains("USD"));

        let mut zero = RateTable::fallback();
        zero.rates.insert("EUR".to_string(), 0.0);
        assert!(zero.validate().is_err());

        let mut not_a_number = RateTable::fallback();
        not_a_number.rates.insert("GBP".to_string(), f64::NAN);
        assert!(not_a_number.validate().is_err());

        let no_base = RateTable::new("USD", HashMap::from([("AED".to_string(), 3.6725)]));
        assert!(no_base.validate().unwrap_err().to_string().contains("USD"));
    }

    #[test]
    fn test_role_lookup_by_category() {
        let catalog = Catalog::seeded();
        assert!(catalog.role_in("frontend-developer", RateCategory::Custom).is_some());
        assert!(catalog.role_in("frontend-developer", RateCategory::Swat).is_none());
        assert!(catalog.role_in("swat-fullstack-engineer", RateCategory::Swat).is_some());
        assert!(catalog.role_in("swat-fullstack-engineer", RateCategory::Custom).is_none());
    }

    #[test]
    fn test_duration_options_labels() {
        let options = default_duration_options();
        assert_eq!(options.len(), 6);
        assert_eq!(options[0].label, "1 month");
        assert_eq!(options[2].label, "3 months");
        assert_eq!(options[2].value, "3");
    }
}
