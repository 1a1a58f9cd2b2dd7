use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::DbBackend;

/// Width of a trend bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// The sale date itself
    Daily,
    /// Monday of the sale's week
    Weekly,
    /// First day of the sale's month
    #[default]
    Monthly,
}

impl Granularity {
    /// Unknown or missing values fall back to monthly buckets.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("daily") => Granularity::Daily,
            Some("weekly") => Granularity::Weekly,
            _ => Granularity::Monthly,
        }
    }

    /// Expression mapping `sale_date` to the start of its bucket.
    ///
    /// Only fixed SQL text is produced here; nothing caller supplied.
    pub fn bucket_expr(self, backend: DbBackend) -> SimpleExpr {
        let sql = match (self, backend) {
            (Granularity::Daily, _) => "sale_date",
            (Granularity::Weekly, DbBackend::Postgres) => "DATE_TRUNC('week', sale_date)::date",
            (Granularity::Monthly, DbBackend::Postgres) => "DATE_TRUNC('month', sale_date)::date",
            (Granularity::Weekly, DbBackend::Sqlite) => {
                "date(sale_date, '-' || ((CAST(strftime('%w', sale_date) AS INTEGER) + 6) % 7) || ' days')"
            }
            (Granularity::Monthly, DbBackend::Sqlite) => "date(sale_date, 'start of month')",
            (Granularity::Weekly, DbBackend::MySql) => "DATE_SUB(sale_date, INTERVAL WEEKDAY(sale_date) DAY)",
            (Granularity::Monthly, DbBackend::MySql) => "DATE_SUB(sale_date, INTERVAL DAYOFMONTH(sale_date) - 1 DAY)",
        };
        Expr::cust(sql)
    }
}
