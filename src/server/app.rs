use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::any::Any;
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::error::ApiError;
use super::handlers::{analytics, health, upload};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub max_upload_bytes: usize,
}

/// Settings for the router beyond the database handle.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub max_upload_bytes: usize,
    /// Pre-built front-end bundle served for unmatched paths
    pub static_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: None,
        }
    }
}

pub async fn create_app(
    db: DatabaseConnection,
    cors_origin: Option<&str>,
    settings: AppSettings,
) -> Result<Router> {
    let state = AppState {
        db,
        max_upload_bytes: settings.max_upload_bytes,
    };

    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
            )
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin),
        None => CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin),
    };

    let router = Router::new().nest("/api", api_routes(settings.max_upload_bytes));
    let router = match settings.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    };

    let app = router
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/trends", get(analytics::trends))
        .route("/analytics/products", get(analytics::top_products))
        .route("/analytics/top-reviewed", get(analytics::top_reviewed))
        .route("/analytics/regions", get(analytics::regions))
        .route("/analytics/categories", get(analytics::categories))
        .route(
            "/analytics/discount-distribution",
            get(analytics::discount_distribution),
        )
        .route("/analytics/table", get(analytics::table))
        .route("/analytics/filters", get(analytics::filter_options))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    ApiError::internal(format!("Internal server error: {}", detail)).into_response()
}
