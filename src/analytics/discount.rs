use sea_orm::sea_query::{CaseStatement, Expr, SimpleExpr};
use sea_orm::ColumnTrait;
use serde::Serialize;

use crate::database::entities::sales;

/// One 10%-wide discount band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountBand {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

/// The ten bands, ordered by lower bound. Upper bounds are inclusive.
pub const DISCOUNT_BANDS: [DiscountBand; 10] = [
    DiscountBand { label: "0-10%", min: 0.0, max: 0.1 },
    DiscountBand { label: "10-20%", min: 0.1, max: 0.2 },
    DiscountBand { label: "20-30%", min: 0.2, max: 0.3 },
    DiscountBand { label: "30-40%", min: 0.3, max: 0.4 },
    DiscountBand { label: "40-50%", min: 0.4, max: 0.5 },
    DiscountBand { label: "50-60%", min: 0.5, max: 0.6 },
    DiscountBand { label: "60-70%", min: 0.6, max: 0.7 },
    DiscountBand { label: "70-80%", min: 0.7, max: 0.8 },
    DiscountBand { label: "80-90%", min: 0.8, max: 0.9 },
    DiscountBand { label: "90-100%", min: 0.9, max: 1.0 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountBucket {
    pub bucket: &'static str,
    pub min: f64,
    pub max: f64,
    pub count: i64,
}

/// Index of the band `discount` falls in, mirroring [`band_index_expr`].
#[cfg(test)]
fn band_index(discount: f64) -> usize {
    DISCOUNT_BANDS[..DISCOUNT_BANDS.len() - 1]
        .iter()
        .position(|band| discount <= band.max)
        .unwrap_or(DISCOUNT_BANDS.len() - 1)
}

/// `CASE WHEN discount_percentage <= 0.1 THEN 0 WHEN ... ELSE 9 END`
pub fn band_index_expr() -> SimpleExpr {
    let last = DISCOUNT_BANDS.len() - 1;
    let mut case = CaseStatement::new();
    for (index, band) in DISCOUNT_BANDS[..last].iter().enumerate() {
        case = case.case(
            sales::Column::DiscountPercentage.lte(band.max),
            Expr::val(index as i32),
        );
    }
    case.finally(Expr::val(last as i32)).into()
}

/// Expand grouped `(band index, count)` rows to all ten bands.
pub fn fill_bands<I>(counts: I) -> Vec<DiscountBucket>
where
    I: IntoIterator<Item = (i32, i64)>,
{
    let mut totals = [0_i64; DISCOUNT_BANDS.len()];
    for (index, count) in counts {
        let slot = usize::try_from(index)
            .unwrap_or(0)
            .min(DISCOUNT_BANDS.len() - 1);
        totals[slot] += count;
    }

    DISCOUNT_BANDS
        .iter()
        .zip(totals)
        .map(|(band, count)| DiscountBucket {
            bucket: band.label,
            min: band.min,
            max: band.max,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{PostgresQueryBuilder, Query};

    #[test]
    fn test_boundaries_are_inclusive_upper() {
        assert_eq!(band_index(0.0), 0);
        assert_eq!(band_index(0.1), 0);
        assert_eq!(band_index(0.10001), 1);
        assert_eq!(band_index(0.2), 1);
        assert_eq!(band_index(20.0 / 100.0), 1);
        assert_eq!(band_index(0.3), 2);
        assert_eq!(band_index(0.95), 9);
        assert_eq!(band_index(1.0), 9);
    }

    #[test]
    fn test_bands_partition_the_unit_interval() {
        for pair in DISCOUNT_BANDS.windows(2) {
            assert_eq!(pair[0].max, pair[1].min);
        }
        assert_eq!(DISCOUNT_BANDS[0].min, 0.0);
        assert_eq!(DISCOUNT_BANDS[9].max, 1.0);

        for step in 0..=1000 {
            let discount = step as f64 / 1000.0;
            let hits = DISCOUNT_BANDS
                .iter()
                .enumerate()
                .filter(|(index, band)| {
                    let above_min = *index == 0 || discount > band.min;
                    let below_max = *index == DISCOUNT_BANDS.len() - 1 || discount <= band.max;
                    above_min && below_max
                })
                .count();
            assert_eq!(hits, 1, "discount {} matched {} bands", discount, hits);
        }
    }

    #[test]
    fn test_case_expression_uses_bound_thresholds() {
        let (sql, values) = Query::select()
            .expr(band_index_expr())
            .build(PostgresQueryBuilder);
        assert!(sql.contains("CASE WHEN"), "{}", sql);
        assert!(sql.contains(r#""discount_percentage" <= $1"#), "{}", sql);
        assert!(sql.contains("ELSE $19"), "{}", sql);
        assert_eq!(values.0.len(), 19);
    }

    #[test]
    fn test_fill_bands_includes_empty_bands() {
        let buckets = fill_bands(vec![(1, 4), (9, 2)]);
        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0].count, 0);
        assert_eq!(buckets[1].bucket, "10-20%");
        assert_eq!(buckets[1].count, 4);
        assert_eq!(buckets[9].count, 2);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<i64>(), 6);
    }
}
