use super::ui;
use crate::core::calculator::{Calculation, SWAT_STRUCTURAL_FACTOR};
use crate::core::currency::{CurrencyConverter, LEDGER_CURRENCY};
use crate::core::quote::Quote;
use crate::core::{NewQuote, Selection};
use crate::service::RateService;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::debug;

/// What to do with a calculated rate besides displaying it.
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    /// Display currency; the configured one when absent
    pub currency: Option<String>,
    pub save: bool,
    pub export: Option<PathBuf>,
}

fn breakdown_rows(calculation: &Calculation) -> Vec<(String, String)> {
    let aed = |amount: i64| ui::format_amount(LEDGER_CURRENCY, amount);
    match calculation {
        Calculation::Custom(rate) => vec![
            ("Base rate".to_string(), aed(rate.base_rate)),
            (
                "Regional multiplier".to_string(),
                ui::format_multiplier(rate.regional_multiplier),
            ),
            (
                "Seniority multiplier".to_string(),
                ui::format_multiplier(rate.seniority_multiplier),
            ),
        ],
        Calculation::Swat(rate) => vec![
            ("Base rate".to_string(), aed(rate.base_rate)),
            ("With seniority".to_string(), aed(rate.base_with_seniority)),
            ("After workload".to_string(), aed(rate.after_workload)),
            (
                "Duration discount".to_string(),
                format!("{}%", rate.duration_discount),
            ),
            (
                "SWAT discount".to_string(),
                format!("{:.0}%", (1.0 - SWAT_STRUCTURAL_FACTOR) * 100.0),
            ),
        ],
    }
}

pub fn render(calculation: &Calculation, converter: &CurrencyConverter<'_>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Component"), ui::header_cell("Value")]);

    for (label, value) in breakdown_rows(calculation) {
        table.add_row(vec![Cell::new(label), ui::number_cell(value)]);
    }
    let final_rate = calculation.final_rate();
    table.add_row(vec![
        Cell::new(format!("Monthly rate ({LEDGER_CURRENCY})")),
        ui::number_cell(ui::format_amount(LEDGER_CURRENCY, final_rate)),
    ]);

    let display = converter.display_currency();
    let converted = converter.convert_from_aed(final_rate);
    let total = ui::format_amount(&converter.currency_symbol(), converted);

    let title = match calculation {
        Calculation::Custom(_) => "Custom Resource Rate",
        Calculation::Swat(_) => "SWAT Team Rate",
    };
    let mut output = format!("{}\n\n", ui::style_text(title, ui::StyleType::Title));
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nMonthly Rate ({}): {}",
        ui::style_text(display, ui::StyleType::TotalLabel),
        if calculation.is_resolved() {
            ui::style_text(&total, ui::StyleType::TotalValue)
        } else {
            ui::style_text(&total, ui::StyleType::Error)
        }
    ));
    if display != LEDGER_CURRENCY {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "1 {} = {:.4} {}",
                    converter.base_currency(),
                    converter.exchange_rate(),
                    display
                ),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}

pub fn quote_summary(quote: &Quote) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("ID"), Cell::new(&quote.id)]);
    table.add_row(vec![Cell::new("Type"), Cell::new(quote.kind.to_string())]);
    for (key, value) in &quote.configuration {
        let text = value
            .as_str()
            .map_or_else(|| value.to_string(), str::to_string);
        table.add_row(vec![Cell::new(key), Cell::new(text)]);
    }
    table.add_row(vec![
        Cell::new("Final rate"),
        ui::total_cell(format!("{} {}", quote.final_rate, quote.currency)),
    ]);
    table.add_row(vec![
        Cell::new("Created"),
        Cell::new(quote.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    ]);
    table.to_string()
}

pub async fn run(
    service: &RateService,
    selection: &Selection,
    options: &QuoteOptions,
    default_currency: &str,
) -> Result<()> {
    let display = options
        .currency
        .as_deref()
        .unwrap_or(default_currency)
        .to_uppercase();
    let calculation = service.calculate(selection);
    let display_currency = &display;
    debug!(?calculation, display = %display_currency, "Calculated rate");

    let converter = service.converter(&display);
    println!("{}", render(&calculation, &converter));

    if !options.save && options.export.is_none() {
        return Ok(());
    }

    let draft: NewQuote = service.draft_quote(selection, &display)?;
    let quote = if options.save {
        service.create_quote(draft).await?
    } else {
        Quote::create(draft)?
    };
    println!("\n{}", quote_summary(&quote));

    if let Some(path) = &options.export {
        std::fs::write(path, quote.export_json()?)
            .with_context(|| format!("Failed to export quote to {}", path.display()))?;
        println!("Exported quote to {}", path.display());
    }
    Ok(())
}

pub async fn run_list(service: &RateService) -> Result<()> {
    let quotes = service.list_quotes().await?;
    if quotes.is_empty() {
        println!("{}", ui::style_text("No saved quotes", ui::StyleType::Subtle));
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Created"),
        ui::header_cell("Type"),
        ui::header_cell("Role"),
        ui::header_cell("Rate"),
        ui::header_cell("ID"),
    ]);
    for quote in &quotes {
        let role = quote
            .configuration
            .get("role")
            .and_then(|v| v.as_str())
            .unwrap_or("N/A");
        table.add_row(vec![
            Cell::new(quote.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(quote.kind.to_string()),
            Cell::new(role),
            ui::number_cell(format!("{} {}", quote.final_rate, quote.currency)),
            Cell::new(&quote.id),
        ]);
    }
    println!("{table}");
    Ok(())
}
