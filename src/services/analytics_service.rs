use sea_orm::{ConnectionTrait, DatabaseConnection, PaginatorTrait};
use tracing::debug;

use crate::analytics::discount::fill_bands;
use crate::analytics::table::{page_offset, total_pages};
use crate::analytics::*;
use crate::errors::AnalyticsResult;

/// Runs the aggregation queries against the shared pool.
#[derive(Clone)]
pub struct AnalyticsService {
    db: DatabaseConnection,
}

impl AnalyticsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn summary(&self, filter: &SalesFilter) -> AnalyticsResult<SalesSummary> {
        let summary = summary_select(filter)
            .into_model::<SalesSummary>()
            .one(&self.db)
            .await?;
        Ok(summary.unwrap_or_default())
    }

    pub async fn trends(
        &self,
        filter: &SalesFilter,
        granularity: Granularity,
    ) -> AnalyticsResult<Vec<TrendPoint>> {
        let backend = self.db.get_database_backend();
        debug!("Trends query with {:?} buckets on {:?}", granularity, backend);
        Ok(trends_select(filter, granularity, backend)
            .into_model::<TrendPoint>()
            .all(&self.db)
            .await?)
    }

    pub async fn top_products(
        &self,
        filter: &SalesFilter,
        limit: u64,
    ) -> AnalyticsResult<Vec<ProductRevenue>> {
        Ok(top_products_select(filter, limit)
            .into_model::<ProductRevenue>()
            .all(&self.db)
            .await?)
    }

    pub async fn top_reviewed(
        &self,
        filter: &SalesFilter,
        limit: u64,
    ) -> AnalyticsResult<Vec<ReviewedProduct>> {
        Ok(top_reviewed_select(filter, limit)
            .into_model::<ReviewedProduct>()
            .all(&self.db)
            .await?)
    }

    pub async fn regions(&self, filter: &SalesFilter) -> AnalyticsResult<Vec<RegionRevenue>> {
        Ok(regions_select(filter)
            .into_model::<RegionRevenue>()
            .all(&self.db)
            .await?)
    }

    pub async fn categories(&self, filter: &SalesFilter) -> AnalyticsResult<Vec<CategoryStats>> {
        Ok(categories_select(filter)
            .into_model::<CategoryStats>()
            .all(&self.db)
            .await?)
    }

    /// Counts for all ten discount bands, empty bands included.
    pub async fn discount_distribution(
        &self,
        filter: &SalesFilter,
    ) -> AnalyticsResult<Vec<DiscountBucket>> {
        let counts = discount_distribution_select(filter)
            .into_model::<BandCount>()
            .all(&self.db)
            .await?;
        Ok(fill_bands(
            counts.into_iter().map(|row| (row.band, row.band_count)),
        ))
    }

    pub async fn table(
        &self,
        filter: &SalesFilter,
        table: &TableQuery,
    ) -> AnalyticsResult<TablePage> {
        let paginator = table_select(filter, table).paginate(&self.db, table.page_size);
        let total = paginator.num_items().await?;
        let data = match page_offset(table.page, table.page_size) {
            Some(offset) if offset < total => paginator.fetch_page(table.page - 1).await?,
            _ => Vec::new(),
        };

        Ok(TablePage {
            data,
            total,
            page: table.page,
            limit: table.page_size,
            total_pages: total_pages(total, table.page_size),
        })
    }

    pub async fn filter_options(&self) -> AnalyticsResult<FilterOptions> {
        let categories = distinct_categories_select()
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        let regions = distinct_regions_select()
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        let date_range = date_range_select()
            .into_model::<DateRange>()
            .one(&self.db)
            .await?
            .unwrap_or_default();

        Ok(FilterOptions {
            categories,
            regions,
            date_range,
        })
    }
}
