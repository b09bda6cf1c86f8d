//! Input records supplied by upstream collaborators, plus the normalization
//! that turns loosely formatted exports into typed values.

pub mod purchase;
pub mod sales;
pub mod stock;

pub use purchase::{clean_purchase_ledger, LedgerCleaning, PurchaseRecord, RawPurchaseRow};
pub use sales::{DailyUnits, OrderStatus, SalesRecord};
pub use stock::{RawStockRow, StockField, StockFieldResolver, StockRecord, DAYS_LEFT_SENTINEL};
