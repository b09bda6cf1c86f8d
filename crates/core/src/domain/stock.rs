//! Stock-sheet normalization.
//!
//! Stock exports name their columns inconsistently ("Days of stock left",
//! "Days Left", ...). `StockFieldResolver` maps a loosely named row onto a
//! typed `StockRecord` using ordered alias lists: an exact case-insensitive
//! header match wins over a substring match, and earlier aliases win over
//! later ones.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Days-left value used when the sheet has no usable figure.
pub const DAYS_LEFT_SENTINEL: f64 = 9999.0;

/// A stock-sheet row as exported: header name to cell text.
pub type RawStockRow = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub asin: String,
    pub title: String,
    pub current_stock: f64,
    pub days_left: f64,
    pub running_out: Option<String>,
    pub created_date: Option<NaiveDate>,
}

impl StockRecord {
    /// Placeholder used for ASINs that sell but are missing from the sheet.
    pub fn missing(asin: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            title: String::new(),
            current_stock: 0.0,
            days_left: DAYS_LEFT_SENTINEL,
            running_out: None,
            created_date: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StockField {
    Asin,
    Title,
    CurrentStock,
    DaysLeft,
    RunningOut,
    CreatedDate,
}

#[derive(Clone, Debug)]
pub struct StockFieldResolver {
    aliases: BTreeMap<StockField, Vec<String>>,
}

impl Default for StockFieldResolver {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(StockField::Asin, owned(&["asin", "product asin", "asin1"]));
        aliases.insert(
            StockField::Title,
            owned(&["title", "product title", "product name", "item name", "name"]),
        );
        aliases.insert(
            StockField::CurrentStock,
            owned(&[
                "fba/fbm stock",
                "current stock",
                "stock",
                "available",
                "quantity available",
                "inventory",
            ]),
        );
        aliases.insert(
            StockField::DaysLeft,
            owned(&[
                "days of stock left",
                "days left",
                "days of stock",
                "stock days left",
                "days of supply",
                "days remaining",
            ]),
        );
        aliases.insert(
            StockField::RunningOut,
            owned(&["running out of stock", "running out", "stockout date", "out of stock"]),
        );
        aliases.insert(
            StockField::CreatedDate,
            owned(&[
                "date created",
                "created date",
                "created",
                "date received",
                "received date",
                "first received",
                "date added",
            ]),
        );
        Self { aliases }
    }
}

impl StockFieldResolver {
    /// Replace the alias list for one field; order is preserved.
    pub fn with_aliases(mut self, field: StockField, aliases: &[&str]) -> Self {
        self.aliases.insert(field, owned(aliases));
        self
    }

    /// Find the header that holds `field`, if any.
    pub fn resolve_column<'a>(&self, field: StockField, headers: &[&'a str]) -> Option<&'a str> {
        let aliases = self.aliases.get(&field)?;
        let normalized: Vec<(String, &'a str)> =
            headers.iter().map(|header| (normalize_header(header), *header)).collect();

        for alias in aliases {
            if let Some((_, header)) = normalized.iter().find(|(name, _)| name == alias) {
                return Some(*header);
            }
        }

        // A header claimed by a longer alias of another field is not up for grabs:
        // "days of stock left (fba)" belongs to days-left even though it contains "stock".
        for alias in aliases {
            let found = normalized
                .iter()
                .filter(|(name, _)| !self.claimed_by_other(field, name, alias.len()))
                .find(|(name, _)| name.contains(alias.as_str()));
            if let Some((_, header)) = found {
                return Some(*header);
            }
        }

        None
    }

    fn claimed_by_other(&self, field: StockField, name: &str, alias_len: usize) -> bool {
        self.aliases.iter().filter(|(other, _)| **other != field).any(|(_, aliases)| {
            aliases.iter().any(|alias| {
                alias == name || (alias.len() > alias_len && name.contains(alias.as_str()))
            })
        })
    }

    fn lookup<'r>(&self, field: StockField, row: &'r RawStockRow) -> Option<&'r str> {
        let headers: Vec<&str> = row.keys().map(String::as_str).collect();
        let column = self.resolve_column(field, &headers)?;
        row.get(column).map(|value| value.trim()).filter(|value| !value.is_empty())
    }

    /// Resolve one row. Returns `None` when the row has no ASIN.
    pub fn resolve(&self, row: &RawStockRow) -> Option<StockRecord> {
        let asin = self.lookup(StockField::Asin, row)?.to_string();
        let title = self.lookup(StockField::Title, row).unwrap_or_default().to_string();
        let current_stock = self
            .lookup(StockField::CurrentStock, row)
            .and_then(parse_number)
            .filter(|stock| *stock >= 0.0)
            .unwrap_or(0.0);
        let days_left = self
            .lookup(StockField::DaysLeft, row)
            .and_then(parse_number)
            .unwrap_or(DAYS_LEFT_SENTINEL);
        let running_out = self.lookup(StockField::RunningOut, row).map(str::to_string);
        let created_date = self.lookup(StockField::CreatedDate, row).and_then(parse_date);

        Some(StockRecord { asin, title, current_stock, days_left, running_out, created_date })
    }

    /// Resolve a whole sheet, keyed by ASIN. A later duplicate row replaces an earlier one.
    pub fn resolve_sheet(&self, rows: &[RawStockRow]) -> BTreeMap<String, StockRecord> {
        rows.iter()
            .filter_map(|row| self.resolve(row))
            .map(|record| (record.asin.clone(), record))
            .collect()
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Lenient numeric parse: strips thousands separators, currency marks and
/// trailing unit words ("12 days").
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .take_while(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Accepts ISO dates, ISO datetimes and US-style `MM/DD/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];
    const DATETIME_FORMATS: [&str; 3] =
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

    if let Some(date) =
        DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
    {
        return Some(date);
    }
    if let Some(datetime) =
        DATETIME_FORMATS.iter().find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(datetime.date());
    }
    chrono::DateTime::parse_from_rfc3339(raw).ok().map(|datetime| datetime.date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawStockRow {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[test]
    fn exact_alias_beats_substring_match() {
        let resolver = StockFieldResolver::default();
        let headers = ["Stock Days Left (est)", "Days Left", "ASIN"];

        assert_eq!(resolver.resolve_column(StockField::DaysLeft, &headers), Some("Days Left"));
    }

    #[test]
    fn substring_match_is_used_when_no_exact_header_exists() {
        let resolver = StockFieldResolver::default();
        let headers = ["ASIN", "Days of stock left (FBA)"];

        assert_eq!(
            resolver.resolve_column(StockField::DaysLeft, &headers),
            Some("Days of stock left (FBA)")
        );
    }

    #[test]
    fn stock_column_does_not_steal_days_of_stock_left() {
        let resolver = StockFieldResolver::default();
        let headers = ["Days of stock left", "Stock Level"];

        assert_eq!(
            resolver.resolve_column(StockField::CurrentStock, &headers),
            Some("Stock Level")
        );
    }

    #[test]
    fn stock_substring_skips_longer_days_left_header() {
        let resolver = StockFieldResolver::default();
        let record = resolver
            .resolve(&row(&[
                ("ASIN", "B0TEST0003"),
                ("Days of stock left (FBA)", "12"),
                ("FBA Stock", "500"),
            ]))
            .expect("row has an asin");

        assert_eq!(record.current_stock, 500.0);
        assert_eq!(record.days_left, 12.0);
    }

    #[test]
    fn resolves_messy_row_into_typed_record() {
        let resolver = StockFieldResolver::default();
        let record = resolver
            .resolve(&row(&[
                ("ASIN", "B0TEST0001"),
                ("Product Title", "Bamboo Cutting Board"),
                ("FBA/FBM Stock", "1,204"),
                ("Days of stock left", "17 days"),
                ("Date Created", "03/15/2024"),
            ]))
            .expect("row has an asin");

        assert_eq!(record.title, "Bamboo Cutting Board");
        assert_eq!(record.current_stock, 1204.0);
        assert_eq!(record.days_left, 17.0);
        assert_eq!(record.created_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn missing_or_garbage_fields_fall_back_to_sentinels() {
        let resolver = StockFieldResolver::default();
        let record = resolver
            .resolve(&row(&[("asin", "B0TEST0002"), ("Stock", "n/a"), ("Days Left", "")]))
            .expect("row has an asin");

        assert_eq!(record.current_stock, 0.0);
        assert_eq!(record.days_left, DAYS_LEFT_SENTINEL);
        assert_eq!(record.created_date, None);
    }

    #[test]
    fn negative_stock_is_clamped_to_zero() {
        let resolver = StockFieldResolver::default();
        let record =
            resolver.resolve(&row(&[("ASIN", "B0NEG"), ("Current Stock", "-4")])).expect("asin");
        assert_eq!(record.current_stock, 0.0);
    }

    #[test]
    fn rows_without_asin_are_skipped() {
        let resolver = StockFieldResolver::default();
        let sheet = resolver.resolve_sheet(&[
            row(&[("Title", "orphan"), ("Stock", "3")]),
            row(&[("ASIN", "B0KEEP"), ("Stock", "3")]),
        ]);

        assert_eq!(sheet.len(), 1);
        assert!(sheet.contains_key("B0KEEP"));
    }

    #[test]
    fn custom_aliases_replace_defaults_in_order() {
        let resolver = StockFieldResolver::default()
            .with_aliases(StockField::CurrentStock, &["units on hand", "stock"]);
        let headers = ["Stock", "Units On Hand"];

        assert_eq!(
            resolver.resolve_column(StockField::CurrentStock, &headers),
            Some("Units On Hand")
        );
    }

    #[test]
    fn date_parser_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(parse_date("2024-01-31"), expected);
        assert_eq!(parse_date("01/31/2024"), expected);
        assert_eq!(parse_date("2024-01-31 08:15:00"), expected);
        assert_eq!(parse_date("2024-01-31T08:15:00+00:00"), expected);
        assert_eq!(parse_date("soon"), None);
    }
}
