use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::stock::{parse_date, parse_number};

/// Purchase-ledger row as exported, every cell still text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPurchaseRow {
    pub date: Option<String>,
    pub asin: Option<String>,
    pub quantity_purchased: Option<String>,
    pub cogs: Option<String>,
    pub sale_price: Option<String>,
    pub units_per_bundle: Option<String>,
    pub source_link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub date: NaiveDate,
    pub asin: String,
    pub quantity_purchased: f64,
    /// Per-unit cost of goods.
    pub cogs: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub units_per_bundle: u32,
    pub source_link: Option<String>,
}

impl PurchaseRecord {
    /// `cogs * quantity`, when the cost is known and the product fits in a `Decimal`.
    pub fn investment(&self) -> Option<Decimal> {
        let cogs = self.cogs?;
        let investment = Decimal::try_from(self.quantity_purchased)
            .ok()
            .and_then(|quantity| cogs.checked_mul(quantity));
        if investment.is_none() {
            warn!(
                event_name = "purchases.investment.overflow",
                asin = %self.asin,
                quantity = self.quantity_purchased,
                cogs = %cogs,
                "purchase investment is out of range; treated as unknown"
            );
        }
        investment
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCleaning {
    pub kept: usize,
    pub missing_fields: usize,
    pub outside_window: usize,
}

/// Keep rows with asin, quantity and date inside the trailing window ending at `as_of`.
/// The result is sorted by (asin, date).
pub fn clean_purchase_ledger(
    rows: &[RawPurchaseRow],
    as_of: NaiveDate,
    window_months: u32,
) -> (Vec<PurchaseRecord>, LedgerCleaning) {
    let window_start =
        as_of.checked_sub_months(Months::new(window_months)).unwrap_or(NaiveDate::MIN);
    let mut stats = LedgerCleaning::default();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(record) = parse_row(row) else {
            stats.missing_fields += 1;
            continue;
        };
        if record.date < window_start || record.date > as_of {
            stats.outside_window += 1;
            continue;
        }
        records.push(record);
    }

    records.sort_by(|a, b| a.asin.cmp(&b.asin).then(a.date.cmp(&b.date)));
    stats.kept = records.len();
    debug!(
        event_name = "purchases.ledger.cleaned",
        kept = stats.kept,
        missing_fields = stats.missing_fields,
        outside_window = stats.outside_window,
        "purchase ledger cleaned"
    );
    (records, stats)
}

fn parse_row(row: &RawPurchaseRow) -> Option<PurchaseRecord> {
    let asin = row.asin.as_deref().map(str::trim).filter(|asin| !asin.is_empty())?.to_string();
    let quantity_purchased = row
        .quantity_purchased
        .as_deref()
        .and_then(parse_number)
        .filter(|quantity| *quantity > 0.0)?;
    let date = row.date.as_deref().and_then(parse_date)?;

    Some(PurchaseRecord {
        date,
        asin,
        quantity_purchased,
        cogs: row.cogs.as_deref().and_then(parse_money),
        sale_price: row.sale_price.as_deref().and_then(parse_money),
        units_per_bundle: row
            .units_per_bundle
            .as_deref()
            .and_then(parse_number)
            .filter(|units| *units >= 1.0)
            .map(|units| units as u32)
            .unwrap_or(1),
        source_link: row
            .source_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(str::to_string),
    })
}

/// Money cells arrive as "$1,299.50"; anything non-positive counts as missing.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String =
        raw.trim().chars().filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-')).collect();
    cleaned.parse::<Decimal>().ok().filter(|value| *value > Decimal::ZERO)
}
