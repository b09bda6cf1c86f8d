//! CSV loaders for exported marketplace reports.
//!
//! Orders: `purchase-date, asin, quantity, order-status` (Amazon's flat-file
//! names and snake_case variants are both accepted). The stock sheet and the
//! purchase ledger are read as header-to-cell maps; their loosely named columns
//! are matched by alias.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use stockpulse_core::{OrderStatus, RawPurchaseRow, RawStockRow, SalesRecord};

#[derive(Debug, Deserialize)]
struct OrderRow {
    #[serde(alias = "purchase-date", alias = "purchase_date", alias = "date")]
    purchase_date: String,
    #[serde(alias = "ASIN")]
    asin: String,
    #[serde(alias = "quantity-purchased", alias = "quantity_purchased", alias = "qty")]
    quantity: u32,
    #[serde(alias = "order-status", alias = "order_status", alias = "status", default)]
    order_status: String,
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open `{}`", path.display()))
}

pub fn load_orders<R: Read>(source: R) -> Result<Vec<SalesRecord>> {
    let mut csv_reader = reader(source);
    let mut orders = Vec::new();
    for (index, result) in csv_reader.deserialize::<OrderRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("order CSV parse error at line {line}"))?;
        let purchased_at = parse_timestamp(&row.purchase_date).ok_or_else(|| {
            anyhow!("unparseable purchase date `{}` at line {line}", row.purchase_date)
        })?;
        orders.push(SalesRecord {
            purchased_at,
            asin: row.asin,
            quantity: row.quantity,
            status: OrderStatus::parse(&row.order_status),
        });
    }
    Ok(orders)
}

pub fn load_orders_file(path: &Path) -> Result<Vec<SalesRecord>> {
    load_orders(open(path)?)
}

/// Each row as header name to cell text; empty cells are omitted.
fn load_maps<R: Read>(source: R, label: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let mut csv_reader = reader(source);
    let headers = csv_reader
        .headers()
        .with_context(|| format!("{label} CSV has no header row"))?
        .clone();

    let mut rows = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record =
            result.with_context(|| format!("{label} CSV parse error at line {}", index + 2))?;
        let row: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

pub fn load_stock<R: Read>(source: R) -> Result<Vec<RawStockRow>> {
    load_maps(source, "stock")
}

pub fn load_stock_file(path: &Path) -> Result<Vec<RawStockRow>> {
    load_stock(open(path)?)
}

const DATE_ALIASES: &[&str] = &["date", "purchase date", "order date"];
const ASIN_ALIASES: &[&str] = &["asin"];
const QUANTITY_ALIASES: &[&str] = &["quantity purchased", "quantity", "qty", "units"];
const COGS_ALIASES: &[&str] = &["cogs", "cost", "unit cost", "cost per unit"];
const SALE_PRICE_ALIASES: &[&str] = &["sale price", "price", "selling price"];
const BUNDLE_ALIASES: &[&str] = &["units per bundle", "bundle", "pack size"];
const SOURCE_ALIASES: &[&str] = &["source link", "source", "supplier link", "link"];

fn pick(row: &BTreeMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        row.iter()
            .find(|(header, _)| normalize(header) == *alias)
            .map(|(_, value)| value.clone())
    })
}

fn normalize(header: &str) -> String {
    header.replace(['_', '-'], " ").split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn load_purchases<R: Read>(source: R) -> Result<Vec<RawPurchaseRow>> {
    let rows = load_maps(source, "purchase")?;
    Ok(rows
        .iter()
        .map(|row| RawPurchaseRow {
            date: pick(row, DATE_ALIASES),
            asin: pick(row, ASIN_ALIASES),
            quantity_purchased: pick(row, QUANTITY_ALIASES),
            cogs: pick(row, COGS_ALIASES),
            sale_price: pick(row, SALE_PRICE_ALIASES),
            units_per_bundle: pick(row, BUNDLE_ALIASES),
            source_link: pick(row, SOURCE_ALIASES),
        })
        .collect())
}

pub fn load_purchases_file(path: &Path) -> Result<Vec<RawPurchaseRow>> {
    load_purchases(open(path)?)
}

/// RFC 3339 first, then naive timestamps and plain dates read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];
    if let Some(naive) =
        NAIVE_FORMATS.iter().find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS_CSV: &str = "\
purchase-date,asin,quantity,order-status
2024-11-19T14:02:11+00:00,B0AAA,2,Shipped
2024-11-19 08:00:00,B0AAA,1,Pending
2024-11-18,B0BBB,3,unshipped
";

    #[test]
    fn loads_amazon_style_orders() {
        let orders = load_orders(ORDERS_CSV.as_bytes()).unwrap();

        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].quantity, 2);
        assert_eq!(orders[1].status, OrderStatus::Pending);
        assert_eq!(orders[2].status, OrderStatus::Unshipped);
        let expected = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
        assert_eq!(orders[2].purchased_at.date_naive(), expected);
    }

    #[test]
    fn bad_order_date_reports_line() {
        let csv = "purchase-date,asin,quantity,order-status\nyesterday,B0AAA,1,Shipped\n";
        let error = load_orders(csv.as_bytes()).unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn stock_rows_keep_original_headers() {
        let csv = "ASIN,Title,FBA/FBM Stock,Days of stock left\nB0AAA,Mug,12,4\nB0BBB,Cup,,\n";
        let rows = load_stock(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("FBA/FBM Stock").map(String::as_str), Some("12"));
        assert!(!rows[1].contains_key("Days of stock left"));
    }

    #[test]
    fn purchase_columns_match_by_alias() {
        let csv = "Date,ASIN,Quantity_Purchased,COGS,Sale Price,Units Per Bundle,Source Link\n\
                   2024-01-01,X,10,$5.00,$12.00,2,https://supplier.example/x\n";
        let rows = load_purchases(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity_purchased.as_deref(), Some("10"));
        assert_eq!(rows[0].cogs.as_deref(), Some("$5.00"));
        assert_eq!(rows[0].units_per_bundle.as_deref(), Some("2"));
        assert_eq!(rows[0].source_link.as_deref(), Some("https://supplier.example/x"));
    }
}
