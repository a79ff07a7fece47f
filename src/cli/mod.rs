pub mod catalog;
pub mod email;
pub mod quote;
pub mod rates;
pub mod setup;
pub mod ui;
