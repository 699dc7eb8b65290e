use super::error::CoreError;
use super::types::{Detection, ExpenseRecord, OutlierBounds};

const FENCE_MULTIPLIER: f64 = 1.5;

/// Splits records into those inside the Tukey fence and those outside it.
///
/// Both partitions keep the input order. Amounts must already be imputed;
/// a NaN or infinite amount is rejected rather than skipped.
pub fn detect(records: &[ExpenseRecord]) -> Result<Detection, CoreError> {
    for (index, record) in records.iter().enumerate() {
        if !record.amount.is_finite() {
            return Err(CoreError::MalformedInput {
                index,
                reason: format!("amount is {}", record.amount),
            });
        }
    }

    let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
    let bounds = outlier_bounds(&amounts)?;

    let (normal, flagged): (Vec<ExpenseRecord>, Vec<ExpenseRecord>) = records
        .iter()
        .cloned()
        .partition(|record| bounds.contains(record.amount));

    Ok(Detection {
        bounds,
        normal,
        flagged,
    })
}

/// Q1 - 1.5 IQR and Q3 + 1.5 IQR, quartiles by linear interpolation.
pub fn outlier_bounds(amounts: &[f64]) -> Result<OutlierBounds, CoreError> {
    if amounts.is_empty() {
        return Err(CoreError::InsufficientData);
    }

    let mut sorted = amounts.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile_sorted(&sorted, 25.0);
    let q3 = percentile_sorted(&sorted, 75.0);
    let iqr = q3 - q1;

    Ok(OutlierBounds {
        q1,
        q3,
        iqr,
        lower: q1 - FENCE_MULTIPLIER * iqr,
        upper: q3 + FENCE_MULTIPLIER * iqr,
    })
}

/// Linear interpolation between closest ranks: rank = p/100 * (n - 1).
/// `values` must be sorted ascending and non-empty.
fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn records(amounts: &[f64]) -> Vec<ExpenseRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| ExpenseRecord {
                date: start + chrono::Duration::days(i as i64),
                category: "food".to_string(),
                amount,
            })
            .collect()
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_approx(percentile_sorted(&values, 25.0), 1.75);
        assert_approx(percentile_sorted(&values, 50.0), 2.5);
        assert_approx(percentile_sorted(&values, 75.0), 3.25);
        assert_approx(percentile_sorted(&values, 100.0), 4.0);
    }

    #[test]
    fn detect_rejects_empty_input() {
        let err = detect(&[]).expect_err("empty input has no quantiles");
        assert_eq!(err, CoreError::InsufficientData);
    }

    #[test]
    fn detect_rejects_missing_amount() {
        let input = records(&[10.0, f64::NAN, 12.0]);
        let err = detect(&input).expect_err("NaN amount must fail loudly");
        assert!(matches!(err, CoreError::MalformedInput { index: 1, .. }));
    }

    #[test]
    fn detect_single_record_is_normal_with_collapsed_fence() {
        let input = records(&[42.5]);
        let detection = detect(&input).expect("one record is enough");
        assert_approx(detection.bounds.lower, 42.5);
        assert_approx(detection.bounds.upper, 42.5);
        assert_eq!(detection.normal, input);
        assert!(detection.flagged.is_empty());
    }

    #[test]
    fn detect_spending_ledger_flags_spike() {
        let input = records(&[10.0, 12.0, 12.0, 13.0, 12.0, 11.0, 14.0, 13.0, 100.0]);
        let detection = detect(&input).expect("valid input");

        // sorted: 10 11 12 12 12 13 13 14 100 -> Q1 at rank 2, Q3 at rank 6
        assert_approx(detection.bounds.q1, 12.0);
        assert_approx(detection.bounds.q3, 13.0);
        assert_approx(detection.bounds.lower, 10.5);
        assert_approx(detection.bounds.upper, 14.5);

        let flagged: Vec<f64> = detection.flagged.iter().map(|r| r.amount).collect();
        assert!(flagged.contains(&100.0));
        assert_eq!(flagged, vec![10.0, 100.0]);
        assert_eq!(detection.normal.len(), 7);
    }

    #[test]
    fn detect_zero_iqr_flags_any_deviation() {
        let input = records(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.01]);
        let detection = detect(&input).expect("valid input");
        assert_approx(detection.bounds.iqr, 0.0);
        assert_eq!(detection.normal.len(), 5);
        assert_eq!(detection.flagged.len(), 1);
        assert_approx(detection.flagged[0].amount, 5.01);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_partition_is_exhaustive_disjoint_and_ordered(
            cents in proptest::collection::vec(-1_000_000i64..1_000_000, 1..60)
        ) {
            let amounts: Vec<f64> = cents.iter().map(|&c| c as f64 / 100.0).collect();
            let input = records(&amounts);
            let detection = detect(&input).expect("non-empty finite input");
            let bounds = detection.bounds;

            prop_assert!(bounds.lower <= bounds.q1);
            prop_assert!(bounds.q1 <= bounds.q3);
            prop_assert!(bounds.q3 <= bounds.upper);
            prop_assert_eq!(detection.normal.len() + detection.flagged.len(), input.len());

            for record in &detection.normal {
                prop_assert!(bounds.lower <= record.amount && record.amount <= bounds.upper);
            }
            for record in &detection.flagged {
                prop_assert!(record.amount < bounds.lower || record.amount > bounds.upper);
            }

            // dates are unique per input position, so they identify records
            let positions = |part: &[ExpenseRecord]| -> Vec<usize> {
                part.iter()
                    .map(|r| {
                        input
                            .iter()
                            .position(|i| i.date == r.date)
                            .expect("record from input")
                    })
                    .collect()
            };
            let normal_pos = positions(&detection.normal);
            let flagged_pos = positions(&detection.flagged);
            prop_assert!(normal_pos.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(flagged_pos.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(normal_pos.iter().all(|p| !flagged_pos.contains(p)));
        }
    }
}
