use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{fmt, str::FromStr};

use crate::eligibility::eligible_runs;
use crate::models::{Course, CourseRun};

const NO_CERTIFICATE_SUFFIX: &str = " (No certificate available)";

/// US-dollar amount, displayed the way the catalog shows prices:
/// `$149`, `$1,200`, `$149.50`.
#[derive(SerializeDisplay, DeserializeFromStr, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money(pub Decimal);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
        let fixed = format!("{:.2}", amount.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        write!(f, "{sign}${}", group_thousands(whole))?;
        if cents != "00" {
            write!(f, ".{cents}")?;
        }
        Ok(())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let digits = rest.trim_start_matches('$').replace(',', "");
        let value = Decimal::from_str(&digits)?;
        Ok(Money(if negative { -value } else { value }))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CertificateOffer {
    pub eligible: bool,
    pub price: Option<Money>,
    pub deadline: Option<DateTime<Utc>>,
}

impl CertificateOffer {
    pub fn unavailable() -> Self {
        Self { eligible: false, price: None, deadline: None }
    }
}

/// Whether a paid certificate can be bought for `run` right now.
///
/// The server's `is_upgradable` flag is necessary but not sufficient: archived
/// runs and runs with nothing to sell are never offered.
pub fn resolve(run: &CourseRun) -> CertificateOffer {
    if !run.is_upgradable {
        return CertificateOffer::unavailable();
    }
    if run.is_archived {
        tracing::debug!(run_id = run.id, "upgradable flag ignored for archived run");
        return CertificateOffer::unavailable();
    }
    match run.first_product() {
        Some(product) => CertificateOffer {
            eligible: true,
            price: Some(Money(product.price)),
            deadline: run.upgrade_deadline,
        },
        None => {
            tracing::debug!(run_id = run.id, "upgradable run has no product");
            CertificateOffer::unavailable()
        }
    }
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Dropdown text for a run: its date span, flagged when no certificate can be bought.
pub fn run_label(run: &CourseRun) -> String {
    let dates = [run.start_date, run.end_date]
        .iter()
        .flatten()
        .map(format_date)
        .collect::<Vec<_>>()
        .join(" - ");
    if resolve(run).eligible {
        dates
    } else if dates.is_empty() {
        NO_CERTIFICATE_SUFFIX.trim_start().to_string()
    } else {
        dates + NO_CERTIFICATE_SUFFIX
    }
}

/// Certificate price, or `"$min - $max"` span, across the course's eligible runs.
pub fn price_range(course: &Course) -> Option<String> {
    let mut prices: Vec<Decimal> = eligible_runs(course)
        .into_iter()
        .filter_map(|r| resolve(r).price)
        .map(|m| m.0)
        .collect();
    prices.sort();
    prices.dedup();
    match (prices.first(), prices.last()) {
        (Some(lo), Some(hi)) if lo == hi => Some(Money(*lo).to_string()),
        (Some(lo), Some(hi)) => Some(format!("{} - {}", Money(*lo), Money(*hi))),
        _ => None,
    }
}
