use sea_orm::Order;
use serde::{Deserialize, Serialize};

use super::parse_limit;
use crate::database::entities::sales;

pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Columns the record table may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    ProductName,
    Category,
    DiscountedPrice,
    ActualPrice,
    DiscountPercentage,
    Rating,
    RatingCount,
    Quantity,
    Region,
    SaleDate,
}

impl SortColumn {
    /// Look up a caller supplied column name in the allow-list.
    pub fn from_name(name: &str) -> Option<Self> {
        let column = match name {
            "product_name" => SortColumn::ProductName,
            "category" => SortColumn::Category,
            "discounted_price" => SortColumn::DiscountedPrice,
            "actual_price" => SortColumn::ActualPrice,
            "discount_percentage" => SortColumn::DiscountPercentage,
            "rating" => SortColumn::Rating,
            "rating_count" => SortColumn::RatingCount,
            "quantity" => SortColumn::Quantity,
            "region" => SortColumn::Region,
            "sale_date" => SortColumn::SaleDate,
            _ => return None,
        };
        Some(column)
    }

    pub fn column(self) -> sales::Column {
        match self {
            SortColumn::ProductName => sales::Column::ProductName,
            SortColumn::Category => sales::Column::Category,
            SortColumn::DiscountedPrice => sales::Column::DiscountedPrice,
            SortColumn::ActualPrice => sales::Column::ActualPrice,
            SortColumn::DiscountPercentage => sales::Column::DiscountPercentage,
            SortColumn::Rating => sales::Column::Rating,
            SortColumn::RatingCount => sales::Column::RatingCount,
            SortColumn::Quantity => sales::Column::Quantity,
            SortColumn::Region => sales::Column::Region,
            SortColumn::SaleDate => sales::Column::SaleDate,
        }
    }
}

/// Table paging and sorting parameters as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Resolved paging and ordering for one table request.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
    pub sort: SortColumn,
    pub order: Order,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortColumn::SaleDate,
            order: Order::Desc,
        }
    }
}

impl TableQuery {
    /// Never fails: anything unusable falls back to the defaults.
    pub fn from_params(params: &TableParams) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page > 0)
            .map(|page| page as u64)
            .unwrap_or(1);
        let page_size = parse_limit(params.limit.as_deref(), DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let page = page.min(max_page(page_size));

        let (sort, order) = match params.sort_by.as_deref().map(str::trim).and_then(SortColumn::from_name) {
            Some(sort) => (sort, parse_order(params.sort_order.as_deref())),
            None => (SortColumn::SaleDate, Order::Desc),
        };

        Self {
            page,
            page_size,
            sort,
            order,
        }
    }
}

/// Largest page whose row offset still fits a signed 64-bit `OFFSET`.
pub fn max_page(page_size: u64) -> u64 {
    i64::MAX as u64 / page_size.max(1)
}

/// Rows skipped before `page`, or `None` when it cannot be expressed.
pub fn page_offset(page: u64, page_size: u64) -> Option<u64> {
    page.checked_sub(1)?
        .checked_mul(page_size)
        .filter(|offset| *offset <= i64::MAX as u64)
}

fn parse_order(raw: Option<&str>) -> Order {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("asc") => Order::Asc,
        _ => Order::Desc,
    }
}

/// One page of full sale rows.
#[derive(Debug, Clone, Serialize)]
pub struct TablePage {
    pub data: Vec<sales::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: &str, limit: &str, sort_by: &str, sort_order: &str) -> TableParams {
        let opt = |v: &str| (!v.is_empty()).then(|| v.to_string());
        TableParams {
            page: opt(page),
            limit: opt(limit),
            sort_by: opt(sort_by),
            sort_order: opt(sort_order),
        }
    }

    #[test]
    fn test_defaults() {
        let query = TableQuery::from_params(&TableParams::default());
        assert_eq!(query, TableQuery::default());
        assert_eq!(query.page_size, 25);
        assert_eq!(query.sort, SortColumn::SaleDate);
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn test_allow_listed_sort() {
        let query = TableQuery::from_params(&params("2", "50", "rating", "ASC"));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 50);
        assert_eq!(query.sort, SortColumn::Rating);
        assert_eq!(query.order, Order::Asc);
    }

    #[test]
    fn test_unknown_sort_column_falls_back_to_sale_date_desc() {
        for column in ["id; DROP TABLE sales", "created_at", "RATING", "sales.rating"] {
            let query = TableQuery::from_params(&params("", "", column, "asc"));
            assert_eq!(query.sort, SortColumn::SaleDate, "{}", column);
            assert_eq!(query.order, Order::Desc);
        }
    }

    #[test]
    fn test_page_size_is_capped() {
        assert_eq!(TableQuery::from_params(&params("", "1000", "", "")).page_size, 100);
        assert_eq!(TableQuery::from_params(&params("", "0", "", "")).page_size, 25);
        assert_eq!(TableQuery::from_params(&params("-4", "", "", "")).page, 1);
        assert_eq!(TableQuery::from_params(&params("abc", "", "", "")).page, 1);
    }

    #[test]
    fn test_huge_page_is_clamped_to_a_valid_offset() {
        let query = TableQuery::from_params(&params("9223372036854775807", "", "", ""));
        assert_eq!(query.page, max_page(25));
        assert!(page_offset(query.page, query.page_size).is_some());

        let query = TableQuery::from_params(&params("400000000000000000", "100", "", ""));
        assert!(page_offset(query.page, query.page_size).is_some());
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 25), Some(0));
        assert_eq!(page_offset(3, 25), Some(50));
        assert_eq!(page_offset(0, 25), None);
        assert_eq!(page_offset(u64::MAX, 25), None);
        assert_eq!(page_offset(i64::MAX as u64, 2), None);
    }

    #[test]
    fn test_invalid_order_defaults_to_desc() {
        let query = TableQuery::from_params(&params("", "", "region", "sideways"));
        assert_eq!(query.sort, SortColumn::Region);
        assert_eq!(query.order, Order::Desc);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(60, 25), 3);
        assert_eq!(total_pages(50, 25), 2);
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 100), 1);
    }
}
