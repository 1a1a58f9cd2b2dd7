use thiserror::Error;

/// Errors raised while answering an aggregation query.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A query parameter could not be interpreted
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    /// Database operation failed
    #[error("{0}")]
    Database(#[from] sea_orm::DbErr),
}

impl AnalyticsError {
    pub fn invalid_parameter(name: impl Into<String>, value: impl Into<String>) -> Self {
        AnalyticsError::InvalidParameter {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalyticsError::InvalidParameter { .. })
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AnalyticsError::Database(_) => "INTERNAL_ERROR",
        }
    }
}
