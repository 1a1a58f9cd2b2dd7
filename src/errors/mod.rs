//! Domain-specific error types for salescope
//!
//! - **ImportError**: whole-request failures while ingesting an uploaded file
//! - **RowError**: a single uploaded row that could not be normalized
//! - **AnalyticsError**: bad query parameters or store failures while aggregating
//!
//! Row errors never abort an import; they are collected into the import
//! summary. The other two are scoped to one request and surface through
//! `server::error::ApiError`.

pub mod analytics;
pub mod import;
pub mod row;

pub use analytics::AnalyticsError;
pub use import::ImportError;
pub use row::RowError;

/// Result type alias for ingestion operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type alias for aggregation queries
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
