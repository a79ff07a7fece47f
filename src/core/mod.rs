//! Core business logic for rate quoting

pub mod calculator;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod log;
pub mod quote;
pub mod refresh;
pub mod store;

// Re-export main types for cleaner imports
pub use calculator::{Calculation, CustomRate, CustomSelection, Selection, SwatRate, SwatSelection};
pub use catalog::{Catalog, CatalogStore, Currency, RateCategory, RateTable, Region, Role};
pub use currency::{CurrencyConverter, ExchangeRateProvider, LEDGER_CURRENCY};
pub use quote::{EmailQuoteRequest, NewQuote, Quote};
pub use store::{KeyValueCollection, Store};
