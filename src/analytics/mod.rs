//! Aggregation query construction over the `sales` table.
//!
//! Every query shares the predicate built by [`SalesFilter`]; caller values
//! only ever reach the database as bound parameters, and the one
//! caller-chosen identifier (the table sort column) goes through
//! [`SortColumn`]'s allow-list.

pub mod discount;
pub mod filter;
pub mod granularity;
pub mod queries;
pub mod table;

pub use discount::{DiscountBand, DiscountBucket, DISCOUNT_BANDS};
pub use filter::{FilterParams, SalesFilter};
pub use granularity::Granularity;
pub use queries::*;
pub use table::{SortColumn, TableParams, TablePage, TableQuery};

/// Default and upper bound for top-N queries.
pub const DEFAULT_TOP_LIMIT: u64 = 10;
pub const MAX_TOP_LIMIT: u64 = 100;

/// Interpret an optional `limit` parameter: unparsable or non-positive values
/// fall back to `default`, large ones are capped at `max`.
pub fn parse_limit(raw: Option<&str>, default: u64, max: u64) -> u64 {
    raw.map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map(|value| (value as u64).min(max))
        .unwrap_or(default)
}
