//! Upload ingestion: spreadsheet reading, row normalization and chunked
//! persistence with per-row error collection.

pub mod loader;
pub mod normalizer;
pub mod reader;

pub use loader::{load_rows, ImportRowError, ImportSummary, SaleSink, BATCH_SIZE, MAX_REPORTED_ERRORS};
pub use normalizer::{NormalizedSale, RawRow, RowNormalizer, REGIONS};
pub use reader::{read_rows, SourceFormat};
