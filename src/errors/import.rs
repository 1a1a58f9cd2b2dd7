use thiserror::Error;

/// Errors that reject an upload as a whole.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Multipart request without a `file` part
    #[error("No file uploaded")]
    MissingFile,

    /// File extension outside the accepted set
    #[error("Only .xlsx, .xls, and .csv files are allowed (got '{0}')")]
    UnsupportedFormat(String),

    /// Upload larger than the configured cap
    #[error("File exceeds the maximum upload size of {limit} bytes")]
    FileTooLarge { limit: usize },

    /// File parsed but produced no data rows
    #[error("File contains no data rows")]
    EmptySource,

    /// Workbook could not be opened or its first sheet read
    #[error("Invalid spreadsheet: {0}")]
    InvalidSpreadsheet(String),

    /// CSV parsing error
    #[error("Invalid CSV: {0}")]
    InvalidCsv(#[from] csv::Error),

    /// Malformed multipart body
    #[error("Invalid upload request: {0}")]
    InvalidRequest(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed outside the per-chunk error handling
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ImportError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImportError::Io(_) | ImportError::Database(_))
    }

    /// Error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportError::MissingFile => "MISSING_FILE",
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::EmptySource => "EMPTY_SOURCE",
            ImportError::InvalidSpreadsheet(_) | ImportError::InvalidCsv(_) => "INVALID_FILE",
            ImportError::InvalidRequest(_) => "INVALID_REQUEST",
            ImportError::Io(_) | ImportError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ImportError::MissingFile.is_client_error());
        assert!(ImportError::EmptySource.is_client_error());
        assert!(ImportError::UnsupportedFormat(".pdf".into()).is_client_error());
        assert!(ImportError::FileTooLarge { limit: 10 }.is_client_error());
    }

    #[test]
    fn test_server_errors() {
        let err = ImportError::Database(sea_orm::DbErr::Custom("boom".into()));
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ImportError::EmptySource.to_string(),
            "File contains no data rows"
        );
        assert_eq!(ImportError::MissingFile.to_string(), "No file uploaded");
    }
}
