// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use tvd_core::{ExecutionContext, TvdError};
use tvd_eval::{OptimalityReport, verify_optimality};
use tvd_filter::{FilterResult, TvFilter, TvFilterConfig};

/// Splits row-major `n x d` values into `d` column series.
pub fn split_columns(values: &[f64], n: usize, d: usize) -> Result<Vec<Vec<f64>>, TvdError> {
    if n.checked_mul(d) != Some(values.len()) {
        return Err(TvdError::invalid_input(format!(
            "expected {n} rows of {d} columns, got {} values",
            values.len()
        )));
    }

    let mut columns = vec![Vec::with_capacity(n); d];
    for row in values.chunks(d.max(1)) {
        for (column, &value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    Ok(columns)
}

/// Filters every column as an independent series.
pub fn filter_columns(
    columns: &[Vec<f64>],
    config: &TvFilterConfig,
) -> Result<Vec<FilterResult<f64>>, TvdError> {
    let filter = TvFilter::new(config.clone())?;
    let ctx = ExecutionContext::new();
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            filter
                .filter(column, &ctx)
                .map_err(|err| with_column(err, idx))
        })
        .collect()
}

/// Checks each filtered column against its input column.
pub fn check_columns(
    input: &[Vec<f64>],
    filtered: &[Vec<f64>],
    lambda: f64,
    tolerance: f64,
) -> Result<Vec<OptimalityReport>, TvdError> {
    if input.len() != filtered.len() {
        return Err(TvdError::invalid_input(format!(
            "input has {} columns but filtered output has {}",
            input.len(),
            filtered.len()
        )));
    }

    input
        .iter()
        .zip(filtered)
        .map(|(x, y)| verify_optimality(x, y, lambda, tolerance))
        .collect()
}

fn with_column(err: TvdError, idx: usize) -> TvdError {
    let column = idx + 1;
    match err {
        TvdError::InvalidInput(msg) => TvdError::invalid_input(format!("column {column}: {msg}")),
        TvdError::NumericalIssue(msg) => {
            TvdError::numerical_issue(format!("column {column}: {msg}"))
        }
        TvdError::NotSupported(msg) => TvdError::not_supported(format!("column {column}: {msg}")),
    }
}

/// CLI namespace.
pub fn crate_name() -> &'static str {
    let _ = (
        tvd_core::crate_name(),
        tvd_filter::crate_name(),
        tvd_eval::crate_name(),
    );
    "tvd-cli"
}

#[cfg(test)]
mod tests {
    use super::{check_columns, filter_columns, split_columns};
    use tvd_eval::DEFAULT_TOLERANCE;
    use tvd_filter::TvFilterConfig;

    #[test]
    fn split_columns_transposes_row_major_values() {
        let columns = split_columns(&[1.0, 10.0, 2.0, 20.0, 3.0, 30.0], 3, 2)
            .expect("shape should be consistent");
        assert_eq!(columns, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]]);

        let err = split_columns(&[1.0, 2.0, 3.0], 2, 2).expect_err("shape mismatch");
        assert!(err.to_string().contains("expected 2 rows"));
    }

    #[test]
    fn columns_are_filtered_independently() {
        let columns = vec![vec![0.0, 0.0, 10.0, 10.0], vec![1.0, 2.0, 3.0]];
        let results = filter_columns(&columns, &TvFilterConfig::with_lambda(1.0))
            .expect("filter should succeed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].values, vec![0.5, 0.5, 9.5, 9.5]);
        assert_eq!(results[0].diagnostics.n, 4);
        assert_eq!(results[1].diagnostics.n, 3);

        let filtered: Vec<Vec<f64>> = results.into_iter().map(|r| r.values).collect();
        let reports = check_columns(&columns, &filtered, 1.0, DEFAULT_TOLERANCE)
            .expect("check should run");
        assert!(reports.iter().all(|report| report.is_optimal()));
    }

    #[test]
    fn failing_column_is_named_in_error() {
        let columns = vec![vec![1.0], vec![f64::NAN]];
        let err = filter_columns(&columns, &TvFilterConfig::default())
            .expect_err("NaN column should fail");
        assert_eq!(
            err.to_string(),
            "invalid input: column 2: sample 0 is not finite: NaN"
        );
    }

    #[test]
    fn check_rejects_column_count_mismatch() {
        let err = check_columns(&[vec![1.0]], &[], 1.0, DEFAULT_TOLERANCE)
            .expect_err("mismatch should fail");
        assert!(err.to_string().contains("columns"));
    }
}
