use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, QueryFilter};
use serde::Deserialize;

use crate::database::entities::sales;
use crate::errors::{AnalyticsError, AnalyticsResult};

/// Filter query parameters exactly as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub min_rating: Option<String>,
    pub search: Option<String>,
}

/// Validated filters; `None` means "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(name: &str, value: Option<&str>) -> AnalyticsResult<Option<NaiveDate>> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AnalyticsError::invalid_parameter(name, raw))
        })
        .transpose()
}

impl SalesFilter {
    pub fn from_params(params: &FilterParams) -> AnalyticsResult<Self> {
        let min_rating = present(&params.min_rating)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| AnalyticsError::invalid_parameter("minRating", raw))
            })
            .transpose()?;

        Ok(Self {
            start_date: parse_date("startDate", present(&params.start_date))?,
            end_date: parse_date("endDate", present(&params.end_date))?,
            category: present(&params.category).map(str::to_string),
            region: present(&params.region).map(str::to_string),
            min_rating,
            search: present(&params.search).map(str::to_string),
        })
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.condition().is_none()
    }

    /// The combined predicate, or `None` when no filter is active.
    pub fn condition(&self) -> Option<Condition> {
        let mut condition = Condition::all();
        let mut active = false;

        if let Some(start) = self.start_date {
            condition = condition.add(sales::Column::SaleDate.gte(start));
            active = true;
        }
        if let Some(end) = self.end_date {
            condition = condition.add(sales::Column::SaleDate.lte(end));
            active = true;
        }
        if let Some(category) = &self.category {
            condition = condition.add(sales::Column::Category.eq(category.clone()));
            active = true;
        }
        if let Some(region) = &self.region {
            condition = condition.add(sales::Column::Region.eq(region.clone()));
            active = true;
        }
        if let Some(min_rating) = self.min_rating {
            condition = condition.add(sales::Column::Rating.gte(min_rating));
            active = true;
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            condition = condition.add(
                Expr::expr(Func::lower(Expr::col(sales::Column::ProductName)))
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
            active = true;
        }

        active.then_some(condition)
    }

    /// Restrict `query` to matching rows.
    pub fn apply<Q: QueryFilter>(&self, query: Q) -> Q {
        match self.condition() {
            Some(condition) => query.filter(condition),
            None => query,
        }
    }
}

/// Make `%`, `_` and `\` in user text match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
