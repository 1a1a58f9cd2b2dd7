use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One imported sale.
///
/// Rows are created by the bulk importer only and are never updated in
/// place. `discount_percentage` is always a 0..=1 fraction and `quantity`
/// is at least 1.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: String,
    #[sea_orm(column_type = "Text")]
    pub product_name: String,
    #[sea_orm(column_type = "Text")]
    pub category: String,
    pub discounted_price: f64,
    pub actual_price: f64,
    pub discount_percentage: f64,
    pub rating: f64,
    pub rating_count: i64,
    pub quantity: i64,
    pub region: String,
    pub sale_date: Date,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
