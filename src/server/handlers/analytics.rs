use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::analytics::*;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::services::AnalyticsService;

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub granularity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn service(state: &AppState) -> AnalyticsService {
    AnalyticsService::new(state.db.clone())
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<SalesSummary> {
    let filter = SalesFilter::from_params(&params)?;
    Ok(Json(service(&state).summary(&filter).await?))
}

pub async fn trends(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
    Query(trend): Query<TrendParams>,
) -> ApiResult<Vec<TrendPoint>> {
    let filter = SalesFilter::from_params(&params)?;
    let granularity = Granularity::parse(trend.granularity.as_deref());
    Ok(Json(service(&state).trends(&filter, granularity).await?))
}

pub async fn top_products(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
    Query(limit): Query<LimitParams>,
) -> ApiResult<Vec<ProductRevenue>> {
    let filter = SalesFilter::from_params(&params)?;
    let limit = parse_limit(limit.limit.as_deref(), DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT);
    Ok(Json(service(&state).top_products(&filter, limit).await?))
}

pub async fn top_reviewed(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
    Query(limit): Query<LimitParams>,
) -> ApiResult<Vec<ReviewedProduct>> {
    let filter = SalesFilter::from_params(&params)?;
    let limit = parse_limit(limit.limit.as_deref(), DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT);
    Ok(Json(service(&state).top_reviewed(&filter, limit).await?))
}

pub async fn regions(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<RegionRevenue>> {
    let filter = SalesFilter::from_params(&params)?;
    Ok(Json(service(&state).regions(&filter).await?))
}

pub async fn categories(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<CategoryStats>> {
    let filter = SalesFilter::from_params(&params)?;
    Ok(Json(service(&state).categories(&filter).await?))
}

pub async fn discount_distribution(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<DiscountBucket>> {
    let filter = SalesFilter::from_params(&params)?;
    Ok(Json(service(&state).discount_distribution(&filter).await?))
}

pub async fn table(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
    Query(table): Query<TableParams>,
) -> ApiResult<TablePage> {
    let filter = SalesFilter::from_params(&params)?;
    let table = TableQuery::from_params(&table);
    Ok(Json(service(&state).table(&filter, &table).await?))
}

pub async fn filter_options(State(state): State<AppState>) -> ApiResult<FilterOptions> {
    Ok(Json(service(&state).filter_options().await?))
}
