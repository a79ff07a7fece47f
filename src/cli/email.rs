use super::ui;
use crate::core::quote::EmailQuoteRequest;
use anyhow::{Context, Result};
use comfy_table::Cell;
use serde_json::{Value, json};
use std::path::Path;
use tracing::info;

/// Builds an email request around an exported quote file's contents.
pub fn build_request(
    quote_json: &str,
    recipient: &str,
    sender: &str,
    message: Option<&str>,
) -> Result<EmailQuoteRequest> {
    let quote_data: Value =
        serde_json::from_str(quote_json).context("Quote file is not valid JSON")?;
    EmailQuoteRequest::from_json(&json!({
        "recipientEmail": recipient,
        "senderName": sender,
        "quoteData": quote_data,
        "message": message,
    }))
}

fn render(request: &EmailQuoteRequest) -> String {
    let quote = &request.quote_data;
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("To"), Cell::new(&request.recipient_email)]);
    table.add_row(vec![Cell::new("From"), Cell::new(&request.sender_name)]);
    table.add_row(vec![Cell::new("Quote"), Cell::new(&quote.id)]);
    table.add_row(vec![
        Cell::new("Rate"),
        ui::total_cell(format!("{} {}", quote.final_rate, quote.currency)),
    ]);
    if let Some(message) = &request.message {
        table.add_row(vec![Cell::new("Message"), Cell::new(message)]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Email Request", ui::StyleType::Title),
        table
    )
}

/// Validates and prints an email request; delivery is handled elsewhere.
pub fn run(quote_path: &Path, recipient: &str, sender: &str, message: Option<&str>) -> Result<()> {
    let quote_json = std::fs::read_to_string(quote_path)
        .with_context(|| format!("Failed to read quote file: {}", quote_path.display()))?;
    let request = build_request(&quote_json, recipient, sender, message)?;
    info!(to = %request.recipient_email, quote = %request.quote_data.id, "Email request ready");
    println!("{}", render(&request));
    Ok(())
}
