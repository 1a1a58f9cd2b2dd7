use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sales::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sales::ProductId).string_len(50).not_null())
                    .col(ColumnDef::new(Sales::ProductName).text().not_null())
                    .col(ColumnDef::new(Sales::Category).text().not_null())
                    .col(
                        ColumnDef::new(Sales::DiscountedPrice)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Sales::ActualPrice)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Sales::DiscountPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Sales::Rating).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Sales::RatingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Sales::Quantity)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Sales::Region).string_len(20).not_null())
                    .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                    .col(
                        ColumnDef::new(Sales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sales {
    Table,
    Id,
    ProductId,
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
    CreatedAt,
}
