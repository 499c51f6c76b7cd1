//! Creative Cloud plan catalog and the derived order fields computed from it.
//!
//! Everything here is pure: the same inputs always give the same plan description, savings and
//! expiry date, so re-running a reconciliation pass on a duplicate event cannot drift.

use std::sync::LazyLock;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Months, Utc};
use regex::Regex;

const FALLBACK_DESCRIPTION: &str = "Adobe Creative Cloud";
const CATALOG_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub label: &'static str,
    pub months: u32,
    sale_cents: i64,
    official_cents: i64,
}

impl Plan {
    /// What we charge for the plan, in USD.
    pub fn sale_price(&self) -> BigDecimal {
        cents(self.sale_cents)
    }

    /// What the vendor charges for the same duration, in USD.
    pub fn official_price(&self) -> BigDecimal {
        cents(self.official_cents)
    }

    pub fn currency(&self) -> &'static str {
        CATALOG_CURRENCY
    }
}

pub static CATALOG: [Plan; 4] = [
    Plan {
        id: "cc-1m",
        label: "Adobe Creative Cloud All Apps - 1 Month",
        months: 1,
        sale_cents: 2999,
        official_cents: 5999,
    },
    Plan {
        id: "cc-3m",
        label: "Adobe Creative Cloud All Apps - 3 Months",
        months: 3,
        sale_cents: 7999,
        official_cents: 17997,
    },
    Plan {
        id: "cc-6m",
        label: "Adobe Creative Cloud All Apps - 6 Months",
        months: 6,
        sale_cents: 14999,
        official_cents: 35994,
    },
    Plan {
        id: "cc-12m",
        label: "Adobe Creative Cloud All Apps - 12 Months",
        months: 12,
        sale_cents: 26999,
        official_cents: 65988,
    },
];

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*-?\s*(months?|mos?|years?|yrs?)\b").expect("duration regex is valid")
});

fn cents(value: i64) -> BigDecimal {
    BigDecimal::from(value) / BigDecimal::from(100)
}

pub fn find_plan(id: &str) -> Option<&'static Plan> {
    let id = id.trim();
    CATALOG.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

pub fn plan_for_months(months: u32) -> Option<&'static Plan> {
    CATALOG.iter().find(|p| p.months == months)
}

/// Reads a subscription length such as "12 Months", "3-month" or "1 year" out of free text.
pub fn parse_duration_months(description: &str) -> Option<u32> {
    let caps = DURATION.captures(description)?;
    let n: u32 = caps[1].parse().ok()?;
    if n == 0 {
        return None;
    }
    let unit = caps[2].to_ascii_lowercase();
    if unit.starts_with('y') {
        n.checked_mul(12)
    } else {
        Some(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPlan {
    pub description: String,
    pub savings: Option<BigDecimal>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Computes the plan description, savings and expiry for an order.
///
/// The plan id hint wins when it names a catalog entry; otherwise the raw gateway description is
/// searched for a duration. Savings are only reported against the USD catalog price, and expiry
/// is `created_at` plus the plan duration.
pub fn derive_plan(
    description: Option<&str>,
    amount: Option<&BigDecimal>,
    currency: Option<&str>,
    created_at: DateTime<Utc>,
    plan_id: Option<&str>,
) -> DerivedPlan {
    let description = description.map(str::trim).filter(|d| !d.is_empty());
    let parsed_months = description.and_then(parse_duration_months);
    let plan = plan_id
        .and_then(find_plan)
        .or_else(|| parsed_months.and_then(plan_for_months));
    let months = plan.map(|p| p.months).or(parsed_months);

    let label = match (plan, description) {
        (Some(p), _) => p.label.to_string(),
        (None, Some(d)) => d.to_string(),
        (None, None) => FALLBACK_DESCRIPTION.to_string(),
    };

    let currency_matches = currency.map(|c| c.eq_ignore_ascii_case(CATALOG_CURRENCY)).unwrap_or(true);
    let savings = match (plan, amount) {
        (Some(p), Some(paid)) if currency_matches => {
            let diff = p.official_price() - paid;
            let diff = if diff < BigDecimal::from(0) { BigDecimal::from(0) } else { diff };
            Some(diff.with_scale_round(2, RoundingMode::HalfEven))
        },
        _ => None,
    };

    let expiry_date = months.and_then(|m| created_at.checked_add_months(Months::new(m)));

    DerivedPlan { description: label, savings, expiry_date }
}
