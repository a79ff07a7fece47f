//! Quote records handed off to storage, export and email delivery.

use crate::core::calculator::{Calculation, CustomSelection, Selection, SwatSelection};
use crate::core::catalog::{Catalog, RateCategory, months_label};
use crate::core::currency::CurrencyConverter;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Input for creating a quote, validated before it is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuote {
    #[serde(rename = "type")]
    pub kind: RateCategory,
    pub configuration: Map<String, Value>,
    pub final_rate: f64,
    pub currency: String,
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    match object.get(field) {
        Some(Value::Null) | None => bail!("Missing required field: {field}"),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    let value = required(object, field)?
        .as_str()
        .ok_or_else(|| anyhow!("Field {field} must be a string"))?;
    if value.trim().is_empty() {
        bail!("Field {field} must not be empty");
    }
    Ok(value)
}

impl NewQuote {
    /// Parses and validates raw quote input.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("Quote input must be a JSON object"))?;

        let kind: RateCategory = required_str(object, "type")?.parse()?;
        let configuration = required(object, "configuration")?
            .as_object()
            .cloned()
            .ok_or_else(|| anyhow!("Field configuration must be an object"))?;
        let final_rate = required(object, "finalRate")?
            .as_f64()
            .ok_or_else(|| anyhow!("Field finalRate must be a number"))?;
        let currency = required_str(object, "currency")?.to_string();

        let new_quote = Self {
            kind,
            configuration,
            final_rate,
            currency,
        };
        new_quote.validate()?;
        Ok(new_quote)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.final_rate.is_finite() || self.final_rate < 0.0 {
            bail!("Field finalRate must be a non-negative number");
        }
        if self.currency.trim().is_empty() {
            bail!("Field currency must not be empty");
        }
        Ok(())
    }

    /// Packages a calculation and the selections that produced it, with the
    /// rate converted into the converter's display currency.
    pub fn assemble(
        catalog: &Catalog,
        selection: &Selection,
        calculation: &Calculation,
        converter: &CurrencyConverter<'_>,
    ) -> Result<Self> {
        if !calculation.is_resolved() {
            bail!(
                "Cannot create a {} quote before every option is selected",
                calculation.kind()
            );
        }
        let configuration = describe(catalog, selection, calculation);
        let final_rate = converter.convert_from_aed(calculation.final_rate());

        Ok(Self {
            kind: calculation.kind(),
            configuration,
            final_rate: final_rate as f64,
            currency: converter.display_currency().to_string(),
        })
    }
}

fn display_name(id: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Value {
    id.map_or(Value::Null, |id| {
        Value::from(lookup(id).unwrap_or_else(|| id.to_string()))
    })
}

/// Human-readable snapshot of a selection: names, not identifiers.
fn describe(
    catalog: &Catalog,
    selection: &Selection,
    calculation: &Calculation,
) -> Map<String, Value> {
    let role_name = |id: &str| catalog.role(id).map(|r| r.name.clone());
    let seniority_name = |id: &str| catalog.seniority(id).map(|s| s.name.clone());
    let region_name = |id: &str| catalog.region(id).map(|r| r.name.clone());

    let value = match selection {
        Selection::Custom(CustomSelection {
            region,
            role,
            seniority,
        }) => json!({
            "region": display_name(region.as_deref(), region_name),
            "role": display_name(role.as_deref(), role_name),
            "seniority": display_name(seniority.as_deref(), seniority_name),
        }),
        Selection::Swat(SwatSelection {
            role,
            workload_percent,
            duration_months,
            seniority,
        }) => {
            let discount = match calculation {
                Calculation::Swat(rate) => rate.duration_discount,
                Calculation::Custom(_) => 0,
            };
            json!({
                "role": display_name(role.as_deref(), role_name),
                "seniority": display_name(seniority.as_deref(), seniority_name),
                "workload": workload_percent.map(|w| format!("{w}%")),
                "duration": duration_months.map(months_label),
                "durationDiscount": format!("{discount}%"),
            })
        }
    };

    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// A persisted quote. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RateCategory,
    pub configuration: Map<String, Value>,
    pub final_rate: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn create(new_quote: NewQuote) -> Result<Self> {
        new_quote.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind: new_quote.kind,
            configuration: new_quote.configuration,
            final_rate: new_quote.final_rate,
            currency: new_quote.currency,
            created_at: Utc::now(),
        })
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize quote")
    }
}

/// Request to email a quote; delivery itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailQuoteRequest {
    pub recipient_email: String,
    pub sender_name: String,
    pub quote_data: Quote,
    #[serde(default)]
    pub message: Option<String>,
}

impl EmailQuoteRequest {
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("Email request must be a JSON object"))?;

        let recipient_email = required_str(object, "recipientEmail")?;
        if !recipient_email.contains('@') {
            bail!("Field recipientEmail is not a valid email address");
        }
        let sender_name = required_str(object, "senderName")?;
        let quote_data: Quote = serde_json::from_value(required(object, "quoteData")?.clone())
            .context("Field quoteData is not a valid quote")?;
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            recipient_email: recipient_email.trim().to_string(),
            sender_name: sender_name.trim().to_string(),
            quote_data,
            message,
        })
    }
}
