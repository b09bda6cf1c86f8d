use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Shipped,
    Unshipped,
    Pending,
    Canceled,
    Other(String),
}

impl OrderStatus {
    /// Only shipped and unshipped orders are real sales.
    pub fn counts_as_sale(&self) -> bool {
        matches!(self, Self::Shipped | Self::Unshipped)
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "shipped" => Self::Shipped,
            "unshipped" => Self::Unshipped,
            "pending" => Self::Pending,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipped => write!(f, "Shipped"),
            Self::Unshipped => write!(f, "Unshipped"),
            Self::Pending => write!(f, "Pending"),
            Self::Canceled => write!(f, "Canceled"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// One order line from the order history report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub purchased_at: DateTime<Utc>,
    pub asin: String,
    pub quantity: u32,
    pub status: OrderStatus,
}

impl SalesRecord {
    /// Calendar date of the order in the seller's timezone.
    pub fn local_date(&self, utc_offset_minutes: i32) -> NaiveDate {
        (self.purchased_at + Duration::minutes(i64::from(utc_offset_minutes))).date_naive()
    }
}

/// Per-day unit totals for one ASIN, counted sales only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyUnits {
    days: BTreeMap<NaiveDate, u64>,
}

impl DailyUnits {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a SalesRecord>,
        utc_offset_minutes: i32,
    ) -> Self {
        let mut days = BTreeMap::new();
        for record in records.into_iter().filter(|record| record.status.counts_as_sale()) {
            *days.entry(record.local_date(utc_offset_minutes)).or_insert(0) +=
                u64::from(record.quantity);
        }
        Self { days }
    }

    /// Units sold within `[start, end]`, both inclusive.
    pub fn units_between(&self, start: NaiveDate, end: NaiveDate) -> u64 {
        if start > end {
            return 0;
        }
        self.days.range(start..=end).map(|(_, units)| *units).sum()
    }

    pub fn units_on(&self, date: NaiveDate) -> u64 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    pub fn first_sale_date(&self) -> Option<NaiveDate> {
        self.days.iter().find(|(_, units)| **units > 0).map(|(date, _)| *date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|units| *units == 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{DailyUnits, OrderStatus, SalesRecord};

    fn order(day: u32, hour: u32, quantity: u32, status: OrderStatus) -> SalesRecord {
        SalesRecord {
            purchased_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            asin: "B00SALES01".to_string(),
            quantity,
            status,
        }
    }

    #[test]
    fn only_shipped_and_unshipped_count() {
        assert!(OrderStatus::parse("Shipped").counts_as_sale());
        assert!(OrderStatus::parse(" unshipped ").counts_as_sale());
        assert!(!OrderStatus::parse("Pending").counts_as_sale());
        assert!(!OrderStatus::parse("Cancelled").counts_as_sale());
        assert_eq!(OrderStatus::parse("Shipping"), OrderStatus::Other("Shipping".to_string()));
    }

    #[test]
    fn daily_units_skip_non_sales_and_respect_offset() {
        let records = vec![
            order(10, 2, 3, OrderStatus::Shipped),
            order(10, 12, 2, OrderStatus::Canceled),
            order(11, 1, 4, OrderStatus::Unshipped),
        ];

        let utc = DailyUnits::from_records(&records, 0);
        assert_eq!(utc.units_on(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()), 3);

        // UTC-5: both remaining orders fall on the previous local day.
        let eastern = DailyUnits::from_records(&records, -300);
        assert_eq!(eastern.units_on(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()), 3);
        assert_eq!(eastern.units_on(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()), 4);
        assert_eq!(eastern.first_sale_date(), NaiveDate::from_ymd_opt(2024, 3, 9));
    }

    #[test]
    fn units_between_is_inclusive_and_handles_empty_ranges() {
        let records =
            vec![order(10, 9, 3, OrderStatus::Shipped), order(12, 9, 5, OrderStatus::Shipped)];
        let daily = DailyUnits::from_records(&records, 0);
        let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();

        assert_eq!(daily.units_between(start, end), 8);
        assert_eq!(daily.units_between(end, start), 0);
    }
}
