//! Monthly rate calculators for custom resources and SWAT teams.
//!
//! Both calculators are pure functions of the catalog and the user's
//! selections. Any selection that does not resolve against the catalog yields
//! an all-zero result rather than an error, which is how "nothing selected
//! yet" is displayed.

use crate::core::catalog::{Catalog, RateCategory};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed discount applied to every SWAT quote after the duration discount.
pub const SWAT_STRUCTURAL_FACTOR: f64 = 0.8;

/// Rounds to the nearest integer with halves going up.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Percentage discount for an engagement of `months`.
pub fn duration_discount(months: i32) -> u32 {
    match months {
        1 => 0,
        2 => 5,
        3 => 10,
        m if m >= 4 => 15,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRate {
    pub base_rate: i64,
    pub regional_multiplier: f64,
    pub seniority_multiplier: f64,
    pub final_rate: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwatRate {
    pub base_rate: i64,
    pub base_with_seniority: i64,
    pub after_workload: i64,
    pub duration_discount: u32,
    pub final_rate: i64,
}

pub fn calculate_custom_rate(
    catalog: &Catalog,
    region_id: Option<&str>,
    role_id: Option<&str>,
    seniority_id: Option<&str>,
) -> CustomRate {
    let (Some(region), Some(role), Some(seniority)) = (
        region_id.and_then(|id| catalog.region(id)),
        role_id.and_then(|id| catalog.role_in(id, RateCategory::Custom)),
        seniority_id.and_then(|id| catalog.seniority(id)),
    ) else {
        debug!(?region_id, ?role_id, ?seniority_id, "Custom selection unresolved");
        return CustomRate::default();
    };

    let base_rate = i64::from(role.base_rate);
    let final_rate =
        round_half_up(base_rate as f64 * region.multiplier * seniority.multiplier);

    CustomRate {
        base_rate,
        regional_multiplier: region.multiplier,
        seniority_multiplier: seniority.multiplier,
        final_rate,
    }
}

/// Each stage is rounded before feeding the next one; results depend on it.
pub fn calculate_swat_rate(
    catalog: &Catalog,
    role_id: Option<&str>,
    workload_percent: Option<u32>,
    duration_months: Option<i32>,
    seniority_id: Option<&str>,
) -> SwatRate {
    let (Some(role), Some(seniority), Some(workload), Some(duration)) = (
        role_id.and_then(|id| catalog.role_in(id, RateCategory::Swat)),
        seniority_id.and_then(|id| catalog.seniority(id)),
        workload_percent.filter(|w| *w > 0),
        duration_months,
    ) else {
        debug!(
            ?role_id,
            ?seniority_id,
            ?workload_percent,
            ?duration_months,
            "SWAT selection unresolved"
        );
        return SwatRate::default();
    };

    let base_rate = i64::from(role.base_rate);
    let base_with_seniority = round_half_up(base_rate as f64 * seniority.multiplier);
    let after_workload =
        round_half_up(base_with_seniority as f64 * (f64::from(workload) / 100.0));
    let discount = duration_discount(duration);
    let after_duration_discount =
        round_half_up(after_workload as f64 * (1.0 - f64::from(discount) / 100.0));
    let final_rate = round_half_up(after_duration_discount as f64 * SWAT_STRUCTURAL_FACTOR);

    SwatRate {
        base_rate,
        base_with_seniority,
        after_workload,
        duration_discount: discount,
        final_rate,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSelection {
    pub region: Option<String>,
    pub role: Option<String>,
    pub seniority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwatSelection {
    pub role: Option<String>,
    pub workload_percent: Option<u32>,
    pub duration_months: Option<i32>,
    pub seniority: Option<String>,
}

/// User choices for either calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
    Custom(CustomSelection),
    Swat(SwatSelection),
}

impl Selection {
    pub fn calculate(&self, catalog: &Catalog) -> Calculation {
        match self {
            Selection::Custom(s) => Calculation::Custom(calculate_custom_rate(
                catalog,
                s.region.as_deref(),
                s.role.as_deref(),
                s.seniority.as_deref(),
            )),
            Selection::Swat(s) => Calculation::Swat(calculate_swat_rate(
                catalog,
                s.role.as_deref(),
                s.workload_percent,
                s.duration_months,
                s.seniority.as_deref(),
            )),
        }
    }
}

/// Result of either calculator, in the ledger currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Calculation {
    Custom(CustomRate),
    Swat(SwatRate),
}

impl Calculation {
    pub fn kind(&self) -> RateCategory {
        match self {
            Calculation::Custom(_) => RateCategory::Custom,
            Calculation::Swat(_) => RateCategory::Swat,
        }
    }

    pub fn final_rate(&self) -> i64 {
        match self {
            Calculation::Custom(rate) => rate.final_rate,
            Calculation::Swat(rate) => rate.final_rate,
        }
    }

    /// False for the all-zero fallback.
    pub fn is_resolved(&self) -> bool {
        match self {
            Calculation::Custom(rate) => rate.base_rate > 0,
            Calculation::Swat(rate) => rate.base_rate > 0,
        }
    }
}
