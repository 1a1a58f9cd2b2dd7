use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::Serialize;

use super::normalizer::{RawRow, RowNormalizer};
use crate::database::entities::sales;

/// Rows per INSERT statement.
pub const BATCH_SIZE: usize = 50;

/// Errors echoed back to the caller; the full count is `failed`.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// A rejected row, numbered as the spreadsheet line it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub total: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ImportRowError>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("Import complete: {} rows inserted", self.inserted)
    }
}

/// Destination for normalized chunks.
#[async_trait]
pub trait SaleSink: Send + Sync {
    async fn insert_chunk(&self, chunk: Vec<sales::ActiveModel>) -> Result<(), DbErr>;
}

#[async_trait]
impl SaleSink for DatabaseConnection {
    async fn insert_chunk(&self, chunk: Vec<sales::ActiveModel>) -> Result<(), DbErr> {
        sales::Entity::insert_many(chunk)
            .exec_without_returning(self)
            .await?;
        Ok(())
    }
}

/// Spreadsheet line of the data row at `index` (line 1 is the header).
fn line_number(index: usize) -> usize {
    index + 2
}

/// Normalize and persist `rows` in chunks of [`BATCH_SIZE`].
///
/// A row that fails normalization is reported and left out of its chunk.
/// A chunk whose insert fails is reported row by row and the next chunk is
/// still attempted. Chunks are written one after another.
pub async fn load_rows<S, R>(
    sink: &S,
    normalizer: &mut RowNormalizer<R>,
    rows: &[RawRow],
) -> ImportSummary
where
    S: SaleSink + ?Sized,
    R: Rng,
{
    let mut inserted = 0;
    let mut errors = Vec::new();

    for (chunk_index, chunk) in rows.chunks(BATCH_SIZE).enumerate() {
        let chunk_start = chunk_index * BATCH_SIZE;
        let created_at = Utc::now();
        let mut models = Vec::with_capacity(chunk.len());
        let mut indices = Vec::with_capacity(chunk.len());

        for (offset, row) in chunk.iter().enumerate() {
            let index = chunk_start + offset;
            match normalizer.normalize(index, row) {
                Ok(sale) => {
                    models.push(sale.into_active_model(created_at));
                    indices.push(index);
                }
                Err(err) => {
                    tracing::warn!("Row {} rejected: {}", line_number(index), err);
                    errors.push(ImportRowError {
                        row: line_number(index),
                        error: err.to_string(),
                    });
                }
            }
        }

        if models.is_empty() {
            continue;
        }

        let count = models.len();
        match sink.insert_chunk(models).await {
            Ok(()) => inserted += count,
            Err(err) => {
                tracing::warn!(
                    "Chunk starting at row {} failed to insert: {}",
                    line_number(chunk_start),
                    err
                );
                let message = err.to_string();
                errors.extend(indices.into_iter().map(|index| ImportRowError {
                    row: line_number(index),
                    error: message.clone(),
                }));
            }
        }
    }

    let total = rows.len();
    errors.truncate(MAX_REPORTED_ERRORS);

    ImportSummary {
        inserted,
        total,
        failed: total - inserted,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records chunk sizes and fails the chunks whose position is listed.
    #[derive(Default)]
    struct RecordingSink {
        fail_chunks: Vec<usize>,
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SaleSink for RecordingSink {
        async fn insert_chunk(&self, chunk: Vec<sales::ActiveModel>) -> Result<(), DbErr> {
            let mut calls = self.calls.lock().unwrap();
            let position = calls.len();
            calls.push(chunk.len());
            if self.fail_chunks.contains(&position) {
                Err(DbErr::Custom("value too long for type character varying(20)".into()))
            } else {
                Ok(())
            }
        }
    }

    fn normalizer() -> RowNormalizer<StdRng> {
        RowNormalizer::new(
            StdRng::seed_from_u64(11),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
    }

    fn valid_rows(count: usize) -> Vec<RawRow> {
        (0..count)
            .map(|i| {
                json!({
                    "product_id": format!("P{}", i),
                    "product_name": "Cable",
                    "discounted_price": "₹199",
                    "rating_count": "250",
                    "region": "North",
                    "sale_date": "2024-05-01"
                })
                .as_object()
                .cloned()
                .unwrap()
            })
            .collect()
    }

    fn malformed_row() -> RawRow {
        json!({ "product_name": { "nested": true } })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_rows_are_chunked_by_batch_size() {
        let sink = RecordingSink::default();
        let rows = valid_rows(120);

        let summary = load_rows(&sink, &mut normalizer(), &rows).await;

        assert_eq!(*sink.calls.lock().unwrap(), vec![50, 50, 20]);
        assert_eq!(summary.inserted, 120);
        assert_eq!(summary.total, 120);
        assert_eq!(summary.failed, 0);
        assert!(summary.errors.is_empty());
    }

    #[tokio::test]
    async fn test_one_malformed_row_among_fifty_valid() {
        let sink = RecordingSink::default();
        let mut rows = valid_rows(50);
        rows.insert(10, malformed_row());

        let summary = load_rows(&sink, &mut normalizer(), &rows).await;

        assert_eq!(summary.inserted, 50);
        assert_eq!(summary.total, 51);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 12);
        assert!(summary.errors[0].error.contains("product_name"));
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_later_chunks() {
        let sink = RecordingSink {
            fail_chunks: vec![0],
            ..Default::default()
        };
        let rows = valid_rows(60);

        let summary = load_rows(&sink, &mut normalizer(), &rows).await;

        assert_eq!(*sink.calls.lock().unwrap(), vec![50, 10]);
        assert_eq!(summary.inserted, 10);
        assert_eq!(summary.failed, 50);
        assert_eq!(summary.errors.len(), MAX_REPORTED_ERRORS);
        assert_eq!(summary.errors[0].row, 2);
        assert!(summary.errors[0].error.contains("character varying"));
    }

    #[tokio::test]
    async fn test_chunk_failure_does_not_double_count_rejected_rows() {
        let sink = RecordingSink {
            fail_chunks: vec![0],
            ..Default::default()
        };
        let mut rows = valid_rows(3);
        rows.insert(1, malformed_row());

        let summary = load_rows(&sink, &mut normalizer(), &rows).await;

        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.failed, 4);
        let reported: Vec<usize> = summary.errors.iter().map(|e| e.row).collect();
        assert_eq!(reported, vec![3, 2, 4, 5]);
    }

    #[tokio::test]
    async fn test_chunk_of_only_rejected_rows_skips_insert() {
        let sink = RecordingSink::default();
        let rows = vec![malformed_row(), malformed_row()];

        let summary = load_rows(&sink, &mut normalizer(), &rows).await;

        assert!(sink.calls.lock().unwrap().is_empty());
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.errors.len(), 2);
    }

    #[test]
    fn test_summary_serialization_omits_empty_errors() {
        let summary = ImportSummary {
            inserted: 3,
            total: 3,
            failed: 0,
            errors: Vec::new(),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("errors").is_none());
        assert_eq!(summary.message(), "Import complete: 3 rows inserted");
    }
}
