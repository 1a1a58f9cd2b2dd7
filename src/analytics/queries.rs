//! Select builders for each aggregation, plus the row shapes they decode into.
//!
//! Builders return unexecuted `Select`s so the generated SQL can be inspected
//! with `QueryTrait::build`.

use chrono::NaiveDate;
use sea_orm::sea_query::{Alias, Asterisk, Expr, Func, SimpleExpr};
use sea_orm::{DbBackend, EntityTrait, FromQueryResult, Order, QueryOrder, QuerySelect, Select};
use serde::Serialize;

use super::discount::band_index_expr;
use super::filter::SalesFilter;
use super::granularity::Granularity;
use super::table::TableQuery;
use crate::database::entities::sales;

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromQueryResult)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue: f64,
    pub avg_discount: f64,
    pub avg_rating: f64,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct TrendPoint {
    #[serde(rename = "date")]
    pub period: NaiveDate,
    pub revenue: f64,
    pub sales_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ProductRevenue {
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ReviewedProduct {
    pub product_name: String,
    #[serde(rename = "rating_count")]
    pub review_count: i64,
    #[serde(rename = "rating")]
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct RegionRevenue {
    pub region: String,
    pub total_revenue: f64,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct CategoryStats {
    pub category: String,
    pub total_revenue: f64,
    pub total_quantity: i64,
    pub product_count: i64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct BandCount {
    pub band: i32,
    pub band_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromQueryResult)]
pub struct DateRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Values available to the filter selectors, independent of active filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    #[serde(rename = "dateRange")]
    pub date_range: DateRange,
}

/// `discounted_price * quantity`
fn revenue() -> SimpleExpr {
    Expr::col(sales::Column::DiscountedPrice).mul(Expr::col(sales::Column::Quantity))
}

/// Integer aggregates are widened so every backend decodes them as i64.
fn bigint(expr: impl Into<SimpleExpr>) -> SimpleExpr {
    Func::cast_as(expr, Alias::new("bigint")).into()
}

fn alias(name: &str) -> SimpleExpr {
    Expr::col(Alias::new(name)).into()
}

fn total_revenue() -> SimpleExpr {
    Func::sum(revenue()).into()
}

fn total_quantity() -> SimpleExpr {
    bigint(Func::sum(Expr::col(sales::Column::Quantity)))
}

fn avg_rating() -> SimpleExpr {
    Func::avg(Expr::col(sales::Column::Rating)).into()
}

fn or_zero(expr: impl Into<SimpleExpr>, zero: impl Into<SimpleExpr>) -> SimpleExpr {
    Func::coalesce([expr.into(), zero.into()]).into()
}

pub fn summary_select(filter: &SalesFilter) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column_as(bigint(Func::count(Expr::col(Asterisk))), "total_sales")
        .column_as(or_zero(total_revenue(), Expr::val(0.0)), "total_revenue")
        .column_as(
            or_zero(Func::avg(Expr::col(sales::Column::DiscountPercentage)), Expr::val(0.0)),
            "avg_discount",
        )
        .column_as(or_zero(avg_rating(), Expr::val(0.0)), "avg_rating")
        .column_as(
            bigint(or_zero(Func::sum(Expr::col(sales::Column::Quantity)), Expr::val(0))),
            "total_quantity",
        );
    filter.apply(query)
}

pub fn trends_select(
    filter: &SalesFilter,
    granularity: Granularity,
    backend: DbBackend,
) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column_as(granularity.bucket_expr(backend), "period")
        .column_as(total_revenue(), "revenue")
        .column_as(total_quantity(), "sales_count");
    filter
        .apply(query)
        .group_by(alias("period"))
        .order_by(alias("period"), Order::Asc)
}

pub fn top_products_select(filter: &SalesFilter, limit: u64) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column(sales::Column::ProductName)
        .column_as(total_quantity(), "total_quantity")
        .column_as(total_revenue(), "total_revenue")
        .column_as(avg_rating(), "avg_rating");
    filter
        .apply(query)
        .group_by(sales::Column::ProductName)
        .order_by(alias("total_revenue"), Order::Desc)
        .limit(limit)
}

pub fn top_reviewed_select(filter: &SalesFilter, limit: u64) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column(sales::Column::ProductName)
        .column_as(
            bigint(Func::max(Expr::col(sales::Column::RatingCount))),
            "review_count",
        )
        .column_as(avg_rating(), "avg_rating");
    filter
        .apply(query)
        .group_by(sales::Column::ProductName)
        .order_by(alias("review_count"), Order::Desc)
        .limit(limit)
}

pub fn regions_select(filter: &SalesFilter) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column(sales::Column::Region)
        .column_as(total_revenue(), "total_revenue")
        .column_as(total_quantity(), "total_quantity");
    filter
        .apply(query)
        .group_by(sales::Column::Region)
        .order_by(alias("total_revenue"), Order::Desc)
}

pub fn categories_select(filter: &SalesFilter) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column(sales::Column::Category)
        .column_as(total_revenue(), "total_revenue")
        .column_as(total_quantity(), "total_quantity")
        .column_as(bigint(Expr::cust("COUNT(DISTINCT product_id)")), "product_count")
        .column_as(avg_rating(), "avg_rating");
    filter
        .apply(query)
        .group_by(sales::Column::Category)
        .order_by(alias("total_revenue"), Order::Desc)
}

pub fn discount_distribution_select(filter: &SalesFilter) -> Select<sales::Entity> {
    let query = sales::Entity::find()
        .select_only()
        .column_as(band_index_expr(), "band")
        .column_as(bigint(Func::count(Expr::col(Asterisk))), "band_count");
    filter
        .apply(query)
        .group_by(alias("band"))
        .order_by(alias("band"), Order::Asc)
}

/// Filtered full rows in the requested order; `id` breaks ties so pages
/// do not overlap.
pub fn table_select(filter: &SalesFilter, table: &TableQuery) -> Select<sales::Entity> {
    filter
        .apply(sales::Entity::find())
        .order_by(table.sort.column(), table.order.clone())
        .order_by(sales::Column::Id, table.order.clone())
}

pub fn distinct_categories_select() -> Select<sales::Entity> {
    sales::Entity::find()
        .select_only()
        .column(sales::Column::Category)
        .distinct()
        .order_by_asc(sales::Column::Category)
}

pub fn distinct_regions_select() -> Select<sales::Entity> {
    sales::Entity::find()
        .select_only()
        .column(sales::Column::Region)
        .distinct()
        .order_by_asc(sales::Column::Region)
}

pub fn date_range_select() -> Select<sales::Entity> {
    sales::Entity::find()
        .select_only()
        .column_as(
            SimpleExpr::from(Func::min(Expr::col(sales::Column::SaleDate))),
            "min_date",
        )
        .column_as(
            SimpleExpr::from(Func::max(Expr::col(sales::Column::SaleDate))),
            "max_date",
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::filter::FilterParams;
    use crate::analytics::table::{SortColumn, TableParams};
    use sea_orm::QueryTrait;

    fn electronics() -> SalesFilter {
        SalesFilter::from_params(&FilterParams {
            category: Some("Electronics".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_summary_sql() {
        let sql = summary_select(&SalesFilter::default())
            .build(DbBackend::Sqlite)
            .sql;
        assert!(sql.contains(r#"AS "total_sales""#), "{}", sql);
        assert!(sql.contains(r#"SUM("discounted_price" * "quantity")"#), "{}", sql);
        assert!(sql.contains("COALESCE"), "{}", sql);
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_every_aggregate_shares_the_predicate() {
        let filter = electronics();
        let backend = DbBackend::Postgres;
        let statements = vec![
            summary_select(&filter).build(backend),
            trends_select(&filter, Granularity::Monthly, backend).build(backend),
            top_products_select(&filter, 10).build(backend),
            top_reviewed_select(&filter, 10).build(backend),
            regions_select(&filter).build(backend),
            categories_select(&filter).build(backend),
            discount_distribution_select(&filter).build(backend),
            table_select(&filter, &TableQuery::default()).build(backend),
        ];

        for statement in statements {
            assert!(statement.sql.contains(r#""category" = $"#), "{}", statement.sql);
            assert!(!statement.sql.contains("Electronics"), "{}", statement.sql);
        }
    }

    #[test]
    fn test_trends_group_and_order_by_bucket() {
        let sql = trends_select(&SalesFilter::default(), Granularity::Weekly, DbBackend::Postgres)
            .build(DbBackend::Postgres)
            .sql;
        assert!(sql.contains(r#"DATE_TRUNC('week', sale_date)::date AS "period""#), "{}", sql);
        assert!(sql.contains(r#"GROUP BY "period""#), "{}", sql);
        assert!(sql.contains(r#"ORDER BY "period" ASC"#), "{}", sql);
    }

    #[test]
    fn test_top_products_limit_is_bound() {
        let statement = top_products_select(&SalesFilter::default(), 7).build(DbBackend::Postgres);
        assert!(statement.sql.contains(r#"ORDER BY "total_revenue" DESC"#), "{}", statement.sql);
        assert!(statement.sql.contains("LIMIT $"), "{}", statement.sql);
        let values = statement.values.unwrap().0;
        assert!(values.contains(&sea_orm::Value::BigUnsigned(Some(7))));
    }

    #[test]
    fn test_top_reviewed_orders_by_review_count() {
        let sql = top_reviewed_select(&SalesFilter::default(), 5)
            .build(DbBackend::Sqlite)
            .sql;
        assert!(sql.contains(r#"MAX("rating_count")"#), "{}", sql);
        assert!(sql.contains(r#"ORDER BY "review_count" DESC"#), "{}", sql);
    }

    #[test]
    fn test_categories_report_product_count() {
        let sql = categories_select(&SalesFilter::default())
            .build(DbBackend::Sqlite)
            .sql;
        assert!(sql.contains("COUNT(DISTINCT product_id)"), "{}", sql);
        assert!(sql.contains(r#"GROUP BY "sales"."category""#), "{}", sql);
    }

    #[test]
    fn test_table_sort_uses_allow_listed_column() {
        let table = TableQuery::from_params(&TableParams {
            sort_by: Some("rating".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        });
        assert_eq!(table.sort, SortColumn::Rating);

        let sql = table_select(&SalesFilter::default(), &table)
            .build(DbBackend::Sqlite)
            .sql;
        assert!(
            sql.ends_with(r#"ORDER BY "sales"."rating" ASC, "sales"."id" ASC"#),
            "{}",
            sql
        );
    }

    #[test]
    fn test_filter_options_ignore_predicate() {
        let sql = distinct_categories_select().build(DbBackend::Sqlite).sql;
        assert!(sql.starts_with("SELECT DISTINCT"), "{}", sql);
        assert!(!sql.contains("WHERE"));
    }
}
