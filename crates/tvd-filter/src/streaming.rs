// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::filter::{TvFilterConfig, build_diagnostics, record_telemetry};
use crate::solver::{DualEnvelopeSolver, Phase};
use std::time::Instant;
use tvd_core::{ExecutionContext, FilterDiagnostics, Sample, SampleSink, TvdError};

/// Push-style variant of [`crate::TvFilter`] for callers that receive samples
/// one at a time.
///
/// Whether a sample is the last one is only known once the next sample or
/// [`finish`](Self::finish) arrives, so one sample is always held back.
#[derive(Clone, Debug)]
pub struct StreamingTvFilter<T: Sample> {
    config: TvFilterConfig,
    solver: DualEnvelopeSolver,
    pending: Option<T>,
    started_at: Option<Instant>,
}

impl<T: Sample> StreamingTvFilter<T> {
    pub fn new(config: TvFilterConfig) -> Result<Self, TvdError> {
        config.validate()?;
        let solver = config.new_solver();
        Ok(Self {
            config,
            solver,
            pending: None,
            started_at: None,
        })
    }

    pub fn config(&self) -> &TvFilterConfig {
        &self.config
    }

    /// Number of samples accepted since construction or the last reset.
    pub fn len(&self) -> usize {
        self.solver.stats().samples + usize::from(self.pending.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finished(&self) -> bool {
        self.solver.phase() == Phase::Done
    }

    /// Accepts the next sample; any runs it settles are pushed to `sink`.
    pub fn push<S>(&mut self, sample: T, sink: &mut S) -> Result<(), TvdError>
    where
        S: SampleSink<T>,
    {
        if self.is_finished() {
            return Err(TvdError::invalid_input(
                "streaming filter already finished; call reset() before pushing again",
            ));
        }

        let value = sample.to_f64();
        if !value.is_finite() {
            return Err(TvdError::invalid_input(format!(
                "sample {} is not finite: {value}",
                self.len()
            )));
        }

        self.started_at.get_or_insert_with(Instant::now);
        if let Some(previous) = self.pending.replace(sample) {
            self.solver.accept(previous, false, sink)?;
        }
        Ok(())
    }

    /// Marks the end of input, drains every open run into `sink`, and returns
    /// diagnostics for the whole stream.
    pub fn finish<S>(
        &mut self,
        sink: &mut S,
        ctx: &ExecutionContext<'_>,
    ) -> Result<FilterDiagnostics, TvdError>
    where
        S: SampleSink<T>,
    {
        if self.is_finished() {
            return Err(TvdError::invalid_input(
                "streaming filter already finished; call reset() before finishing again",
            ));
        }

        match self.pending.take() {
            Some(last) => self.solver.accept(last, true, sink)?,
            None => self.solver.finish_empty()?,
        }
        ctx.report_progress(1.0);

        let started_at = self.started_at.unwrap_or_else(Instant::now);
        let diagnostics =
            build_diagnostics(&self.config, self.solver.stats(), started_at, "streaming");
        record_telemetry(ctx, &diagnostics);
        Ok(diagnostics)
    }

    /// Discards all state so the filter can process a new stream.
    pub fn reset(&mut self) {
        self.solver = self.config.new_solver();
        self.pending = None;
        self.started_at = None;
    }
}
