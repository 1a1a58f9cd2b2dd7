use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::Set;
use serde::Serialize;
use serde_json::Value;

use crate::database::entities::sales;
use crate::errors::RowError;

/// One uploaded row keyed by its header cell.
pub type RawRow = serde_json::Map<String, Value>;

/// Regions assigned to rows that do not carry one.
pub const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

const CURRENCY_SYMBOLS: [char; 6] = ['₹', '$', '€', '£', '¥', '\u{a0}'];

/// A fully typed sale, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSale {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub discounted_price: f64,
    pub actual_price: f64,
    pub discount_percentage: f64,
    pub rating: f64,
    pub rating_count: i64,
    pub quantity: i64,
    pub region: String,
    pub sale_date: NaiveDate,
}

impl NormalizedSale {
    pub fn into_active_model(self, created_at: DateTime<Utc>) -> sales::ActiveModel {
        sales::ActiveModel {
            product_id: Set(self.product_id),
            product_name: Set(self.product_name),
            category: Set(self.category),
            discounted_price: Set(self.discounted_price),
            actual_price: Set(self.actual_price),
            discount_percentage: Set(self.discount_percentage),
            rating: Set(self.rating),
            rating_count: Set(self.rating_count),
            quantity: Set(self.quantity),
            region: Set(self.region),
            sale_date: Set(self.sale_date),
            created_at: Set(created_at),
            ..Default::default()
        }
    }
}

/// Turns loosely typed upload rows into [`NormalizedSale`]s.
///
/// Rows without a region or sale date get random ones. The random source
/// and the reference "today" are injected so callers (and tests) control
/// them.
pub struct RowNormalizer<R> {
    rng: R,
    today: NaiveDate,
}

impl RowNormalizer<StdRng> {
    /// Normalizer seeded from OS entropy, anchored at the current UTC date.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy(), Utc::now().date_naive())
    }
}

impl<R: Rng> RowNormalizer<R> {
    pub fn new(rng: R, today: NaiveDate) -> Self {
        Self { rng, today }
    }

    /// Normalize the row at `index` (0-based position among data rows).
    pub fn normalize(&mut self, index: usize, row: &RawRow) -> Result<NormalizedSale, RowError> {
        let product_id = text_field(row, "product_id")?.unwrap_or_else(|| format!("PROD-{}", index));
        let product_name =
            text_field(row, "product_name")?.unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        let category = text_field(row, "category")?
            .map(|raw| primary_category(&raw))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let discounted_price = parse_price(row.get("discounted_price"));
        let actual_price = parse_price(row.get("actual_price"));
        let discount_percentage = parse_discount(row.get("discount_percentage"));
        let rating = parse_rating(row.get("rating"));
        let rating_count = parse_rating_count(row.get("rating_count"));
        let quantity = quantity_from_rating_count(rating_count);

        let region = match text_field(row, "region")? {
            Some(region) => region,
            None => self.random_region(),
        };
        let sale_date = match text_field(row, "sale_date")? {
            Some(raw) => parse_sale_date(&raw).ok_or(RowError::InvalidDate(raw))?,
            None => self.random_date(),
        };

        Ok(NormalizedSale {
            product_id,
            product_name,
            category,
            discounted_price,
            actual_price,
            discount_percentage,
            rating,
            rating_count,
            quantity,
            region,
            sale_date,
        })
    }

    fn random_region(&mut self) -> String {
        REGIONS[self.rng.gen_range(0..REGIONS.len())].to_string()
    }

    /// Uniformly random day in the twelve months up to and including today.
    fn random_date(&mut self) -> NaiveDate {
        let start = self
            .today
            .checked_sub_months(Months::new(12))
            .unwrap_or(self.today);
        let span = (self.today - start).num_days().max(0) as u64;
        let offset = self.rng.gen_range(0..=span);
        start.checked_add_days(Days::new(offset)).unwrap_or(self.today)
    }
}

/// Read a text attribute. Numbers are stringified, blank text counts as absent.
fn text_field(row: &RawRow, field: &str) -> Result<Option<String>, RowError> {
    let text = match row.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => number_text(n),
        Some(other) => {
            return Err(RowError::Malformed {
                field: field.to_string(),
                found: value_kind(other),
            })
        }
    };
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Spreadsheet numbers arrive as floats; `12345.0` is written `12345`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// `"Computers&Accessories|Cables"` -> `"Computers&Accessories"`.
fn primary_category(raw: &str) -> String {
    let head = raw.split('|').next().unwrap_or_default().trim();
    if head.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        head.to_string()
    }
}

/// Parse a price such as `"₹1,099"`; anything unreadable is 0.
pub fn parse_price(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => finite_or_zero(n.as_f64()),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
                .collect();
            finite_or_zero(leading_float(&cleaned))
        }
        _ => 0.0,
    }
}

/// Parse a discount into a 0..=1 fraction.
///
/// `"20%"`, `20` and `0.2` all yield `0.2`: values above 1 are read as whole
/// percentages.
pub fn parse_discount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => leading_float(s.replace('%', "").trim()),
        _ => None,
    };
    let fraction = match parsed {
        Some(v) if v.is_finite() && v > 1.0 => v / 100.0,
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    };
    fraction.clamp(0.0, 1.0)
}

pub fn parse_rating(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => finite_or_zero(n.as_f64()),
        Some(Value::String(s)) => finite_or_zero(leading_float(s.trim())),
        _ => 0.0,
    }
}

/// Parse a review count from its leading digits; negatives clamp to 0.
///
/// Reading stops at the first non-digit, so `"24,269"` is 24.
pub fn parse_rating_count(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => leading_int(s.trim()),
        _ => None,
    };
    parsed.unwrap_or(0).max(0)
}

/// Synthetic units sold: one per hundred reviews, never less than one.
pub fn quantity_from_rating_count(rating_count: i64) -> i64 {
    (rating_count / 100).max(1)
}

fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Longest numeric prefix of `s` (`"12.5abc"` -> 12.5), like a lenient
/// float reader.
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}

fn leading_int(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}
