//! Catalog reads, rate refresh and quote creation on top of a key-value store.

use crate::core::calculator::{Calculation, Selection};
use crate::core::catalog::{Catalog, CatalogStore, RateTable};
use crate::core::currency::{CurrencyConverter, ExchangeRateProvider};
use crate::core::quote::{NewQuote, Quote};
use crate::core::refresh::update_exchange_rates;
use crate::core::store::{KeyValueCollection, Store, all_json, get_json, put_json};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const CATALOG_COLLECTION: &str = "catalog";
pub const QUOTES_COLLECTION: &str = "quotes";
const RATE_TABLE_KEY: &str = "rate_table";

pub struct RateService {
    catalog: CatalogStore,
    catalog_data: Arc<dyn KeyValueCollection>,
    quotes: Arc<dyn KeyValueCollection>,
    provider: Box<dyn ExchangeRateProvider>,
    /// Held across persist and swap so refreshes land in the same order on
    /// disk and in memory.
    refresh_lock: Mutex<()>,
}

impl RateService {
    /// Builds the service, restoring the last persisted rate table if any.
    pub async fn new(
        catalog: Catalog,
        catalog_data: Arc<dyn KeyValueCollection>,
        quotes: Arc<dyn KeyValueCollection>,
        provider: Box<dyn ExchangeRateProvider>,
    ) -> Result<Self> {
        let rates = match get_json::<RateTable>(catalog_data.as_ref(), RATE_TABLE_KEY).await {
            Ok(Some(table)) => match table.validate() {
                Ok(()) => {
                    debug!(
                        base = %table.base_currency,
                        updated_at = %table.updated_at,
                        "Restored rate table"
                    );
                    table
                }
                Err(e) => {
                    warn!(error = %e, "Stored rate table invalid, using fallback rates");
                    RateTable::fallback()
                }
            },
            Ok(None) => RateTable::fallback(),
            Err(e) => {
                warn!(error = %e, "Stored rate table unreadable, using fallback rates");
                RateTable::fallback()
            }
        };

        Ok(Self {
            catalog: CatalogStore::new(catalog, rates),
            catalog_data,
            quotes,
            provider,
            refresh_lock: Mutex::new(()),
        })
    }

    pub async fn from_store(
        catalog: Catalog,
        store: &dyn Store,
        persist: bool,
        provider: Box<dyn ExchangeRateProvider>,
    ) -> Result<Self> {
        let catalog_data = store
            .get_collection(CATALOG_COLLECTION, persist, true)
            .context("Failed to open catalog collection")?;
        let quotes = store
            .get_collection(QUOTES_COLLECTION, persist, true)
            .context("Failed to open quotes collection")?;
        Self::new(catalog, catalog_data, quotes, provider).await
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.catalog()
    }

    pub fn catalog_store(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn rate_table(&self) -> Arc<RateTable> {
        self.catalog.rate_table()
    }

    pub fn converter(&self, display_currency: &str) -> CurrencyConverter<'_> {
        self.catalog.converter(display_currency)
    }

    pub fn calculate(&self, selection: &Selection) -> Calculation {
        selection.calculate(self.catalog())
    }

    /// Fetches rates for `base_currency`, then persists and installs them as
    /// one record. Fetch failures fall back to built-in rates; store failures
    /// are returned and leave the current table in place.
    pub async fn refresh_rates(&self, base_currency: &str) -> Result<HashMap<String, f64>> {
        let base = base_currency.trim().to_uppercase();
        if self.catalog().currency(&base).is_none() {
            bail!("Unsupported base currency: {base_currency}");
        }

        let _guard = self.refresh_lock.lock().await;
        let rates = update_exchange_rates(self.provider.as_ref(), &base).await;
        let table = RateTable::new(&base, rates.clone());
        put_json(self.catalog_data.as_ref(), RATE_TABLE_KEY, &table)
            .await
            .context("Failed to persist exchange rates")?;
        self.catalog.replace_rates(table);

        info!(base = %base, "Exchange rates updated");
        Ok(rates)
    }

    pub async fn create_quote(&self, new_quote: NewQuote) -> Result<Quote> {
        let quote = Quote::create(new_quote)?;
        put_json(self.quotes.as_ref(), &quote.id, &quote)
            .await
            .context("Failed to persist quote")?;
        info!(id = %quote.id, kind = %quote.kind, "Created quote");
        Ok(quote)
    }

    pub async fn create_quote_from_json(&self, input: &Value) -> Result<Quote> {
        let new_quote = NewQuote::from_json(input)?;
        self.create_quote(new_quote).await
    }

    /// Calculates, converts and assembles a quote without persisting it.
    pub fn draft_quote(&self, selection: &Selection, display_currency: &str) -> Result<NewQuote> {
        let calculation = self.calculate(selection);
        let converter = self.converter(display_currency);
        NewQuote::assemble(self.catalog(), selection, &calculation, &converter)
    }

    /// Saved quotes, newest first.
    pub async fn list_quotes(&self) -> Result<Vec<Quote>> {
        let mut quotes: Vec<Quote> = all_json(self.quotes.as_ref()).await?;
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;
    use crate::store::memory::MemoryCollection;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        rates: Option<HashMap<String, f64>>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn returning(rates: &[(&str, f64)]) -> Self {
            Self {
                rates: Some(rates.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                rates: None,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeRateProvider for Arc<MockProvider> {
        async fn fetch_rates(&self, _base: &str) -> Result<HashMap<String, f64>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.rates.clone().ok_or_else(|| anyhow!("network unreachable"))
        }
    }

    struct ReadOnlyCollection;

    #[async_trait]
    impl KeyValueCollection for ReadOnlyCollection {
        async fn get(&self, _key: &[u8]) -> Option<Vec<u8>> {
            None
        }
        async fn put(&self, _key: &[u8], _value: Vec<u8>) -> Result<()> {
            Err(anyhow!("disk full"))
        }
        async fn remove(&self, _key: &[u8]) -> Result<()> {
            Err(anyhow!("disk full"))
        }
        async fn values(&self) -> Result<Vec<Vec<u8>>> {
            Ok(vec![])
        }
    }

    async fn service_with(provider: Arc<MockProvider>) -> RateService {
        RateService::new(
            Catalog::seeded(),
            Arc::new(MemoryCollection::new()),
            Arc::new(MemoryCollection::new()),
            Box::new(provider),
        )
        .await
        .unwrap()
    }

    const USD_RATES: [(&str, f64); 3] = [("USD", 1.0), ("AED", 3.6725), ("EUR", 0.92)];

    #[tokio::test]
    async fn test_starts_with_fallback_rates() {
        let service = service_with(Arc::new(MockProvider::failing())).await;
        let table = service.rate_table();
        assert_eq!(table.base_currency, "AED");
        assert_eq!(table.rate("USD"), Some(0.27));
    }

    #[tokio::test]
    async fn test_invalid_persisted_rates_are_replaced_by_fallback() {
        let catalog_data: Arc<dyn KeyValueCollection> = Arc::new(MemoryCollection::new());
        let mut corrupted = RateTable::fallback();
        corrupted.rates.insert("USD".to_string(), -0.27);
        put_json(catalog_data.as_ref(), RATE_TABLE_KEY, &corrupted)
            .await
            .unwrap();

        let service = RateService::new(
            Catalog::seeded(),
            catalog_data,
            Arc::new(MemoryCollection::new()),
            Box::new(Arc::new(MockProvider::failing())),
        )
        .await
        .unwrap();

        assert_eq!(*service.rate_table(), RateTable::fallback());
        assert_eq!(service.converter("USD").convert_from_aed(193), 52);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_agree_on_disk_and_in_memory() {
        let catalog_data: Arc<dyn KeyValueCollection> = Arc::new(MemoryCollection::new());
        let service = RateService::new(
            Catalog::seeded(),
            Arc::clone(&catalog_data),
            Arc::new(MemoryCollection::new()),
            Box::new(Arc::new(MockProvider::returning(&USD_RATES))),
        )
        .await
        .unwrap();

        let (first, second) = tokio::join!(
            service.refresh_rates("USD"),
            service.refresh_rates("EUR")
        );
        first.unwrap();
        second.unwrap();

        let stored: RateTable = get_json(catalog_data.as_ref(), RATE_TABLE_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, *service.rate_table());
    }

    #[tokio::test]
    async fn test_refresh_replaces_rates_and_base_together() {
        let provider = Arc::new(MockProvider::returning(&USD_RATES));
        let service = service_with(Arc::clone(&provider)).await;

        let rates = service.refresh_rates("usd").await.unwrap();
        assert_eq!(rates["AED"], 3.6725);
        assert_eq!(rates["GBP"], 0.21);
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);

        let table = service.rate_table();
        assert_eq!(table.base_currency, "USD");
        assert_eq!(table.rates, rates);

        // 193 AED -> 193 / 3.6725 * 0.92 = 48.35
        assert_eq!(service.converter("EUR").convert_from_aed(193), 48);
    }

    #[tokio::test]
    async fn test_refresh_with_failed_fetch_still_installs_fallback() {
        let service = service_with(Arc::new(MockProvider::failing())).await;
        let rates = service.refresh_rates("AED").await.unwrap();
        assert_eq!(rates, crate::core::currency::fallback_rates());
        assert_eq!(service.rate_table().base_currency, "AED");
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_base() {
        let provider = Arc::new(MockProvider::returning(&USD_RATES));
        let service = service_with(Arc::clone(&provider)).await;
        assert!(service.refresh_rates("XYZ").await.is_err());
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_surfaces_store_failure() {
        let service = RateService::new(
            Catalog::seeded(),
            Arc::new(ReadOnlyCollection),
            Arc::new(MemoryCollection::new()),
            Box::new(Arc::new(MockProvider::returning(&USD_RATES))),
        )
        .await
        .unwrap();

        let err = service.refresh_rates("USD").await.unwrap_err();
        assert!(err.to_string().contains("Failed to persist exchange rates"));
        // Current table untouched
        assert_eq!(service.rate_table().base_currency, "AED");
    }

    #[tokio::test]
    async fn test_persisted_rates_are_restored() {
        let catalog_data: Arc<dyn KeyValueCollection> = Arc::new(MemoryCollection::new());
        let first = RateService::new(
            Catalog::seeded(),
            Arc::clone(&catalog_data),
            Arc::new(MemoryCollection::new()),
            Box::new(Arc::new(MockProvider::returning(&USD_RATES))),
        )
        .await
        .unwrap();
        first.refresh_rates("USD").await.unwrap();

        let second = RateService::new(
            Catalog::seeded(),
            catalog_data,
            Arc::new(MemoryCollection::new()),
            Box::new(Arc::new(MockProvider::failing())),
        )
        .await
        .unwrap();
        assert_eq!(second.rate_table().base_currency, "USD");
        assert_eq!(second.rate_table().rate("EUR"), Some(0.92));
    }

    #[tokio::test]
    async fn test_create_and_list_quotes() {
        let store = KeyValueStore::in_memory();
        let service = RateService::from_store(
            Catalog::seeded(),
            &store,
            false,
            Box::new(Arc::new(MockProvider::failing())),
        )
        .await
        .unwrap();

        let first = service
            .create_quote_from_json(&json!({
                "type": "swat",
                "configuration": {"role": "SWAT Full-Stack Engineer"},
                "finalRate": 72,
                "currency": "AED",
            }))
            .await
            .unwrap();
        let selection = Selection::Custom(crate::core::calculator::CustomSelection {
            region: Some("middle-east".to_string()),
            role: Some("frontend-developer".to_string()),
            seniority: Some("senior".to_string()),
        });
        let draft = service.draft_quote(&selection, "AED").unwrap();
        assert_eq!(draft.final_rate, 193.0);
        let second = service.create_quote(draft).await.unwrap();

        let quotes = service.list_quotes().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].id, second.id);
        assert_eq!(quotes[1], first);
    }

    #[tokio::test]
    async fn test_create_quote_rejects_invalid_input() {
        let service = service_with(Arc::new(MockProvider::failing())).await;
        let result = service
            .create_quote_from_json(&json!({"type": "custom", "finalRate": 10, "currency": "AED"}))
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Missing required field: configuration"
        );
        assert!(service.list_quotes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_quote_surfaces_store_failure() {
        let service = RateService::new(
            Catalog::seeded(),
            Arc::new(MemoryCollection::new()),
            Arc::new(ReadOnlyCollection),
            Box::new(Arc::new(MockProvider::failing())),
        )
        .await
        .unwrap();
        let result = service
            .create_quote_from_json(&json!({
                "type": "custom",
                "configuration": {},
                "finalRate": 10,
                "currency": "AED",
            }))
            .await;
        assert!(result.unwrap_err().to_string().contains("Failed to persist quote"));
    }
}
