// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::solver::{DualEnvelopeSolver, RunStats};
use std::borrow::Cow;
use std::time::Instant;
use tvd_core::{ExecutionContext, FilterDiagnostics, Sample, SampleSink, TvdError, validate_finite};

pub(crate) const ALGORITHM_NAME: &str = "tv1d_dual_envelope";
const DEFAULT_LAMBDA: f64 = 1.0;
const DEFAULT_PROGRESS_EVERY: usize = 4096;

/// Boundary offset applied to the first and last samples.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeOffset {
    /// Offset by `lambda`; solves `0.5 * |x - y|^2 + lambda * TV(y)`.
    #[default]
    FullLambda,
    /// Offset by `lambda / 2`; equivalent to `FullLambda` at half the penalty.
    HalfLambda,
}

impl EdgeOffset {
    pub fn offset(self, lambda: f64) -> f64 {
        match self {
            Self::FullLambda => lambda,
            Self::HalfLambda => lambda / 2.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::FullLambda => "full_lambda",
            Self::HalfLambda => "half_lambda",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, TvdError> {
        match raw.to_ascii_lowercase().as_str() {
            "full" | "full_lambda" => Ok(Self::FullLambda),
            "half" | "half_lambda" => Ok(Self::HalfLambda),
            _ => Err(TvdError::invalid_input(format!(
                "unknown edge offset '{raw}'; expected one of: full, half"
            ))),
        }
    }
}

/// Configuration for [`TvFilter`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TvFilterConfig {
    pub lambda: f64,
    pub edge_offset: EdgeOffset,
    pub progress_every: usize,
}

impl Default for TvFilterConfig {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            edge_offset: EdgeOffset::FullLambda,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl TvFilterConfig {
    pub fn with_lambda(lambda: f64) -> Self {
        Self {
            lambda,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TvdError> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(TvdError::invalid_input(format!(
                "TvFilterConfig.lambda must be finite and >= 0; got {}",
                self.lambda
            )));
        }

        if self.progress_every == 0 {
            return Err(TvdError::invalid_input(
                "TvFilterConfig.progress_every must be >= 1; got 0",
            ));
        }

        Ok(())
    }

    pub(crate) fn new_solver(&self) -> DualEnvelopeSolver {
        DualEnvelopeSolver::new(self.lambda, self.edge_offset.offset(self.lambda))
    }
}

/// Filtered values together with run diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterResult<T> {
    pub values: Vec<T>,
    pub diagnostics: FilterDiagnostics,
}

/// Exact one-dimensional total-variation (fused lasso) denoiser.
///
/// Minimizes `0.5 * sum (x_i - y_i)^2 + lambda * sum |y_{i+1} - y_i|` in a
/// single forward pass, worst-case O(N) time and O(N) auxiliary space.
/// Output is emitted in input order as soon as each run is settled.
#[derive(Clone, Debug, PartialEq)]
pub struct TvFilter {
    config: TvFilterConfig,
}

impl TvFilter {
    pub fn new(config: TvFilterConfig) -> Result<Self, TvdError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TvFilterConfig {
        &self.config
    }

    /// Filters a slice, rejecting non-finite samples before any work is done.
    pub fn filter<T: Sample>(
        &self,
        input: &[T],
        ctx: &ExecutionContext<'_>,
    ) -> Result<FilterResult<T>, TvdError> {
        validate_finite(input)?;

        let mut values = Vec::with_capacity(input.len());
        let diagnostics = self.filter_into(input.iter().copied(), &mut values, ctx)?;

        if values.len() != input.len() {
            return Err(TvdError::numerical_issue(format!(
                "filter emitted {} values for {} samples",
                values.len(),
                input.len()
            )));
        }

        Ok(FilterResult {
            values,
            diagnostics,
        })
    }

    /// Filters any forward sequence, pushing settled values to `sink`.
    ///
    /// Each sample is read exactly once. A non-finite sample aborts the run
    /// with `InvalidInput`; values already pushed to `sink` stay there.
    pub fn filter_into<T, I, S>(
        &self,
        input: I,
        sink: &mut S,
        ctx: &ExecutionContext<'_>,
    ) -> Result<FilterDiagnostics, TvdError>
    where
        T: Sample,
        I: IntoIterator<Item = T>,
        S: SampleSink<T>,
    {
        self.config.validate()?;
        let started_at = Instant::now();

        let mut input = input.into_iter().peekable();
        let expected_len = match input.size_hint() {
            (lower, Some(upper)) if lower == upper && lower > 0 => Some(lower),
            _ => None,
        };

        let mut solver = self.config.new_solver();
        let mut t = 0usize;
        while let Some(sample) = input.next() {
            let is_last = input.peek().is_none();
            solver.accept(sample, is_last, sink)?;
            t += 1;

            if let Some(n) = expected_len {
                if t % self.config.progress_every == 0 {
                    ctx.report_progress(t as f32 / n as f32);
                }
            }
        }
        if t == 0 {
            solver.finish_empty()?;
        }
        ctx.report_progress(1.0);

        let diagnostics = build_diagnostics(&self.config, solver.stats(), started_at, "batch");
        record_telemetry(ctx, &diagnostics);
        Ok(diagnostics)
    }
}

/// Filters `input` with penalty `lambda` and default settings.
pub fn total_variation_filter(input: &[f64], lambda: f64) -> Result<Vec<f64>, TvdError> {
    let filter = TvFilter::new(TvFilterConfig::with_lambda(lambda))?;
    Ok(filter.filter(input, &ExecutionContext::new())?.values)
}

pub(crate) fn build_diagnostics(
    config: &TvFilterConfig,
    stats: RunStats,
    started_at: Instant,
    mode: &str,
) -> FilterDiagnostics {
    let mut notes = vec![format!("mode={mode}")];
    let mut warnings = vec![];

    if config.lambda == 0.0 {
        notes.push("lambda=0: output equals input".to_string());
    }
    if config.edge_offset == EdgeOffset::HalfLambda {
        warnings.push(format!(
            "edge_offset=half_lambda solves the penalty {} problem, not {}",
            config.lambda / 2.0,
            config.lambda
        ));
    }

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    FilterDiagnostics {
        n: stats.samples,
        algorithm: Cow::Borrowed(ALGORITHM_NAME),
        lambda: config.lambda,
        edge_offset: Cow::Borrowed(config.edge_offset.name()),
        runtime_ms: Some(runtime_ms),
        merges: stats.merges,
        finalized_runs: stats.finalized_runs,
        max_envelope_len: stats.max_envelope_len,
        notes,
        warnings,
        #[cfg(feature = "serde")]
        params_json: serde_json::to_value(config).ok(),
        ..FilterDiagnostics::default()
    }
}

pub(crate) fn record_telemetry(ctx: &ExecutionContext<'_>, diagnostics: &FilterDiagnostics) {
    ctx.record_scalar("tvd.filter.samples", diagnostics.n as f64);
    ctx.record_scalar("tvd.filter.merges", diagnostics.merges as f64);
    ctx.record_scalar(
        "tvd.filter.finalized_runs",
        diagnostics.finalized_runs as f64,
    );
    ctx.record_scalar(
        "tvd.filter.max_envelope_len",
        diagnostics.max_envelope_len as f64,
    );
    if let Some(runtime_ms) = diagnostics.runtime_ms {
        ctx.record_scalar("tvd.filter.runtime_ms", runtime_ms as f64);
    }
}
