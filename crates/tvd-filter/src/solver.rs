// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::envelope::Envelope;
use crate::point::{AccumulatorPoint, TurnTest, turn, turn_reversed};
use tvd_core::{Sample, SampleSink, TvdError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Init,
    Streaming,
    Finalizing,
    Done,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunStats {
    pub samples: usize,
    pub merges: usize,
    pub finalized_runs: usize,
    pub max_envelope_len: usize,
}

/// Single-pass state machine driving the upper and lower envelopes.
///
/// Samples are fed one at a time together with an "is last" flag; finalized
/// runs are pushed to the sink as soon as they are known.
#[derive(Clone, Debug)]
pub(crate) struct DualEnvelopeSolver {
    upper: Envelope,
    lower: Envelope,
    offset: f64,
    identity: bool,
    phase: Phase,
    stats: RunStats,
}

impl DualEnvelopeSolver {
    /// `lambda` is assumed validated; `offset` is the tube half-width applied
    /// at both sequence edges.
    pub fn new(lambda: f64, offset: f64) -> Self {
        Self {
            upper: Envelope::new(),
            lower: Envelope::new(),
            offset,
            identity: lambda == 0.0,
            phase: Phase::Init,
            stats: RunStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn accept<T, S>(&mut self, sample: T, is_last: bool, sink: &mut S) -> Result<(), TvdError>
    where
        T: Sample,
        S: SampleSink<T>,
    {
        let value = ensure_finite(self.stats.samples, sample)?;

        match self.phase {
            Phase::Init if is_last || self.identity => {
                sink.push(sample);
                self.stats.finalized_runs += 1;
                if is_last {
                    self.phase = Phase::Done;
                }
            }
            Phase::Init => {
                self.upper = Envelope::seeded(AccumulatorPoint::sample(value + self.offset));
                self.lower = Envelope::seeded(AccumulatorPoint::sample(value - self.offset));
                self.phase = Phase::Streaming;
                self.track_len();
            }
            Phase::Streaming if is_last => {
                let closing = AccumulatorPoint::sample(value - self.offset);
                update(
                    &mut self.upper,
                    &mut self.lower,
                    closing,
                    turn,
                    &mut self.stats,
                    sink,
                );
                self.phase = Phase::Finalizing;
                self.stats.finalized_runs += self.upper.drain_into(sink);
                self.lower = Envelope::new();
                self.phase = Phase::Done;
            }
            Phase::Streaming => {
                let point = AccumulatorPoint::sample(value);
                update(
                    &mut self.upper,
                    &mut self.lower,
                    point,
                    turn,
                    &mut self.stats,
                    sink,
                );
                update(
                    &mut self.lower,
                    &mut self.upper,
                    point,
                    turn_reversed,
                    &mut self.stats,
                    sink,
                );
            }
            Phase::Finalizing | Phase::Done => {
                return Err(TvdError::invalid_input(format!(
                    "sample {} arrived after the final sample was processed",
                    self.stats.samples
                )));
            }
        }

        self.stats.samples += 1;
        Ok(())
    }

    /// Closes a run that received no samples at all.
    pub fn finish_empty(&mut self) -> Result<(), TvdError> {
        match self.phase {
            Phase::Init if self.stats.samples == 0 => {
                self.phase = Phase::Done;
                Ok(())
            }
            Phase::Done => Ok(()),
            _ => Err(TvdError::invalid_input(
                "input ended without a final sample while envelopes were still open",
            )),
        }
    }

    fn track_len(&mut self) {
        let len = self.upper.len() + self.lower.len();
        self.stats.max_envelope_len = self.stats.max_envelope_len.max(len);
    }
}

/// Extends `chain` with `point` and, if that collapses it to a single point,
/// finalizes whatever prefix of `other` the collapsed point proves settled.
fn update<T, S>(
    chain: &mut Envelope,
    other: &mut Envelope,
    point: AccumulatorPoint,
    test: TurnTest,
    stats: &mut RunStats,
    sink: &mut S,
) where
    T: Sample,
    S: SampleSink<T>,
{
    stats.merges += chain.extend(point, test);
    stats.max_envelope_len = stats.max_envelope_len.max(chain.len() + other.len());

    if other.is_empty() {
        return;
    }
    if let Some(pivot) = chain.sole_point_mut() {
        stats.finalized_runs += other.reduce_against(pivot, test, sink);
    }
}

fn ensure_finite<T: Sample>(index: usize, sample: T) -> Result<f64, TvdError> {
    let value = sample.to_f64();
    if !value.is_finite() {
        return Err(TvdError::invalid_input(format!(
            "sample {index} is not finite: {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{DualEnvelopeSolver, Phase};

    fn run(values: &[f64], lambda: f64) -> (Vec<f64>, DualEnvelopeSolver) {
        let mut solver = DualEnvelopeSolver::new(lambda, lambda);
        let mut out = Vec::new();
        for (idx, &x) in values.iter().enumerate() {
            solver
                .accept(x, idx + 1 == values.len(), &mut out)
                .expect("finite samples should be accepted");
        }
        if values.is_empty() {
            solver.finish_empty().expect("empty input should close");
        }
        (out, solver)
    }

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len(), "length mismatch: {got:?}");
        for (idx, (g, e)) in got.iter().zip(expected).enumerate() {
            assert!((g - e).abs() < 1e-12, "index {idx}: got {g}, expected {e}");
        }
    }

    #[test]
    fn phases_advance_from_init_to_done() {
        let mut solver = DualEnvelopeSolver::new(1.0, 1.0);
        let mut out: Vec<f64> = Vec::new();
        assert_eq!(solver.phase(), Phase::Init);

        solver.accept(0.0, false, &mut out).expect("seed");
        assert_eq!(solver.phase(), Phase::Streaming);
        solver.accept(0.0, false, &mut out).expect("interior");
        assert_eq!(solver.phase(), Phase::Streaming);
        solver.accept(10.0, true, &mut out).expect("last");
        assert_eq!(solver.phase(), Phase::Done);
        assert_eq!(out.len(), 3);
        assert_eq!(solver.stats().samples, 3);
    }

    #[test]
    fn empty_and_single_sample_inputs() {
        let (out, solver) = run(&[], 2.0);
        assert!(out.is_empty());
        assert_eq!(solver.phase(), Phase::Done);

        let (out, solver) = run(&[7.3], 2.0);
        assert_eq!(out, vec![7.3]);
        assert_eq!(solver.phase(), Phase::Done);
    }

    #[test]
    fn two_samples_shrink_toward_each_other_by_lambda() {
        let (out, _) = run(&[0.0, 10.0], 1.0);
        assert_close(&out, &[1.0, 9.0]);

        let (out, _) = run(&[3.0, 1.0], 0.5);
        assert_close(&out, &[2.5, 1.5]);

        let (out, _) = run(&[1.0, 5.0], 3.0);
        assert_close(&out, &[3.0, 3.0]);
    }

    #[test]
    fn step_signal_matches_known_solution() {
        let (out, _) = run(&[0.0, 0.0, 10.0, 10.0], 1.0);
        assert_close(&out, &[0.5, 0.5, 9.5, 9.5]);

        let (out, _) = run(&[1.0, 1.0, 4.0, 4.0, 2.0], 0.5);
        assert_close(&out, &[1.25, 1.25, 3.5, 3.5, 2.5]);
    }

    #[test]
    fn large_lambda_collapses_to_mean() {
        let (out, _) = run(&[1.0, 2.0, 3.0], 10.0);
        assert_close(&out, &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn constant_input_is_a_fixed_point() {
        let (out, solver) = run(&[5.0; 5], 0.75);
        assert_eq!(out, vec![5.0; 5]);
        assert!(solver.stats().merges > 0);
    }

    #[test]
    fn zero_lambda_is_identity() {
        let values = [-2.9679, -2.4780, 2.0, 0.125];
        let (out, solver) = run(&values, 0.0);
        assert_eq!(out, values.to_vec());
        assert_eq!(solver.phase(), Phase::Done);
        assert_eq!(solver.stats().max_envelope_len, 0);
    }

    #[test]
    fn runs_are_finalized_before_the_input_ends() {
        let values = [0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 10.0];
        let mut solver = DualEnvelopeSolver::new(0.5, 0.5);
        let mut out: Vec<f64> = Vec::new();
        for &x in &values {
            solver.accept(x, false, &mut out).expect("interior sample");
        }
        assert_eq!(solver.phase(), Phase::Streaming);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|&y| (y - 0.1).abs() < 1e-12));
    }

    #[test]
    fn non_finite_samples_and_late_samples_are_rejected() {
        let mut solver = DualEnvelopeSolver::new(1.0, 1.0);
        let mut out: Vec<f64> = Vec::new();
        solver.accept(1.0, false, &mut out).expect("seed");
        let err = solver
            .accept(f64::NAN, false, &mut out)
            .expect_err("NaN must be rejected");
        assert!(err.to_string().contains("sample 1 is not finite"));

        solver.accept(2.0, true, &mut out).expect("last");
        let err = solver
            .accept(3.0, true, &mut out)
            .expect_err("samples after the last must be rejected");
        assert!(err.to_string().contains("after the final sample"));
    }

    #[test]
    fn finish_empty_rejects_open_envelopes() {
        let mut solver = DualEnvelopeSolver::new(1.0, 1.0);
        let mut out: Vec<f64> = Vec::new();
        solver.accept(1.0, false, &mut out).expect("seed");
        assert!(solver.finish_empty().is_err());
    }
}
