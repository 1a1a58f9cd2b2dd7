use thiserror::Error;

/// Why a single uploaded row was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// A field held a value of a shape that cannot be read as text or a number
    #[error("Malformed value in '{field}': expected text or number, found {found}")]
    Malformed { field: String, found: &'static str },

    /// `sale_date` was present but not a recognizable calendar date
    #[error("Invalid sale_date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}
