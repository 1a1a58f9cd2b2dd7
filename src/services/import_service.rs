use rand::Rng;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::errors::{ImportError, ImportResult};
use crate::ingest::{load_rows, read_rows, ImportSummary, RowNormalizer, SaleSink};

/// Turns an uploaded file into stored sales.
pub struct ImportService {
    db: DatabaseConnection,
}

impl ImportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Import with random defaults drawn from OS entropy.
    pub async fn import_file(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportSummary> {
        let mut normalizer = RowNormalizer::from_entropy();
        import_into(&self.db, &mut normalizer, file_name, bytes).await
    }

    pub async fn import_file_with<R: Rng + Send>(
        &self,
        normalizer: &mut RowNormalizer<R>,
        file_name: &str,
        bytes: &[u8],
    ) -> ImportResult<ImportSummary> {
        import_into(&self.db, normalizer, file_name, bytes).await
    }
}

/// Parse `bytes` and load every row into `sink`.
///
/// Rejects the whole upload when the file cannot be read or has no data
/// rows; once loading starts only row and chunk level failures remain.
pub async fn import_into<S, R>(
    sink: &S,
    normalizer: &mut RowNormalizer<R>,
    file_name: &str,
    bytes: &[u8],
) -> ImportResult<ImportSummary>
where
    S: SaleSink + ?Sized,
    R: Rng,
{
    info!("Importing '{}' ({} bytes)", file_name, bytes.len());

    let rows = read_rows(file_name, bytes)?;
    if rows.is_empty() {
        return Err(ImportError::EmptySource);
    }

    let summary = load_rows(sink, normalizer, &rows).await;
    info!(
        "Import of '{}' finished: {} of {} rows inserted",
        file_name, summary.inserted, summary.total
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sea_orm::DbErr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::database::entities::sales;

    #[derive(Default)]
    struct CountingSink {
        rows: AtomicUsize,
    }

    #[async_trait]
    impl SaleSink for CountingSink {
        async fn insert_chunk(&self, chunk: Vec<sales::ActiveModel>) -> Result<(), DbErr> {
            self.rows.fetch_add(chunk.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    fn normalizer() -> RowNormalizer<StdRng> {
        RowNormalizer::new(
            StdRng::seed_from_u64(3),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_csv_upload_is_loaded() {
        let sink = CountingSink::default();
        let csv = "product_id,product_name,discounted_price\nA,Cable,₹10\nB,Charger,₹20\n";

        let summary = import_into(&sink, &mut normalizer(), "sales.csv", csv.as_bytes())
            .await
            .unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(sink.rows.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_header_only_upload_is_rejected() {
        let sink = CountingSink::default();
        let err = import_into(&sink, &mut normalizer(), "sales.csv", b"product_id,rating\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptySource));
        assert_eq!(sink.rows.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_extension_is_rejected_before_parsing() {
        let sink = CountingSink::default();
        let err = import_into(&sink, &mut normalizer(), "sales.json", b"[]")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }
}
