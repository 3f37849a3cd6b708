// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;
use tvd_core::TvdError;

/// Default absolute-or-relative tolerance for optimality checks.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-5;

/// First optimality condition found to fail.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    LengthMismatch {
        input_len: usize,
        output_len: usize,
    },
    SumMismatch {
        input_sum: f64,
        output_sum: f64,
    },
    /// A flat position whose cumulative sum left the tube.
    TubeExceeded {
        index: usize,
        cumulative_input: f64,
        cumulative_output: f64,
    },
    /// A convex kink that does not sit on the upper tube boundary.
    UpperContactMissed {
        index: usize,
        cumulative_input: f64,
        cumulative_output: f64,
    },
    /// A concave kink that does not sit on the lower tube boundary.
    LowerContactMissed {
        index: usize,
        cumulative_input: f64,
        cumulative_output: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                input_len,
                output_len,
            } => write!(
                f,
                "inconsistent sizes: input has {input_len} samples, output has {output_len}"
            ),
            Self::SumMismatch {
                input_sum,
                output_sum,
            } => write!(f, "mismatching overall sum: input={input_sum}, output={output_sum}"),
            Self::TubeExceeded {
                index,
                cumulative_input,
                cumulative_output,
            } => write!(
                f,
                "violated bounding tube at index {index}: cumulative output {cumulative_output}, cumulative input {cumulative_input}"
            ),
            Self::UpperContactMissed {
                index,
                cumulative_input,
                cumulative_output,
            } => write!(
                f,
                "kink at index {index} is off the upper boundary: cumulative output {cumulative_output}, cumulative input {cumulative_input}"
            ),
            Self::LowerContactMissed {
                index,
                cumulative_input,
                cumulative_output,
            } => write!(
                f,
                "kink at index {index} is off the lower boundary: cumulative output {cumulative_output}, cumulative input {cumulative_input}"
            ),
        }
    }
}

/// Summary of an optimality check.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OptimalityReport {
    pub n: usize,
    pub lambda: f64,
    pub tolerance: f64,
    pub input_sum: f64,
    pub output_sum: f64,
    /// Interior positions where the output is the average of its neighbours.
    pub flat_positions: usize,
    pub upper_contacts: usize,
    pub lower_contacts: usize,
    /// Largest `|C_out[j] - C_in[j]|` over interior positions.
    pub max_tube_excursion: f64,
    pub violation: Option<Violation>,
}

impl OptimalityReport {
    pub fn is_optimal(&self) -> bool {
        self.violation.is_none()
    }
}

/// Absolute-or-relative float comparison used by the optimality checks.
pub fn float_equal(x: f64, y: f64, tolerance: f64) -> bool {
    let diff = (x - y).abs();
    diff < tolerance || diff < tolerance * ((x.abs() + y.abs()) / 2.0)
}

/// Running sums `C[j] = values[0] + ... + values[j]`.
pub fn cumulative_sums(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Checks `output` against the optimality conditions of the 1-D total
/// variation problem with penalty `lambda`.
///
/// Works on cumulative sums: totals must agree, and every interior position
/// must either be flat and inside the `lambda` tube around the input, or be
/// a kink touching the tube boundary on the side it bends away from.
pub fn verify_optimality(
    input: &[f64],
    output: &[f64],
    lambda: f64,
    tolerance: f64,
) -> Result<OptimalityReport, TvdError> {
    validate_lambda(lambda)?;
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(TvdError::invalid_input(format!(
            "tolerance must be finite and > 0; got {tolerance}"
        )));
    }

    let input_cum = cumulative_sums(input);
    let output_cum = cumulative_sums(output);
    let mut report = OptimalityReport {
        n: input.len(),
        lambda,
        tolerance,
        input_sum: input_cum.last().copied().unwrap_or(0.0),
        output_sum: output_cum.last().copied().unwrap_or(0.0),
        flat_positions: 0,
        upper_contacts: 0,
        lower_contacts: 0,
        max_tube_excursion: 0.0,
        violation: None,
    };

    if input.len() != output.len() {
        report.violation = Some(Violation::LengthMismatch {
            input_len: input.len(),
            output_len: output.len(),
        });
        return Ok(report);
    }

    if !float_equal(report.input_sum, report.output_sum, tolerance) {
        report.violation = Some(Violation::SumMismatch {
            input_sum: report.input_sum,
            output_sum: report.output_sum,
        });
        return Ok(report);
    }

    let bound = lambda * (1.0 + tolerance);
    for j in 1..input.len().saturating_sub(1) {
        let c_in = input_cum[j];
        let c_out = output_cum[j];
        let excursion = (c_out - c_in).abs();
        report.max_tube_excursion = report.max_tube_excursion.max(excursion);

        let neighbour_mean = (output_cum[j - 1] + output_cum[j + 1]) / 2.0;
        let violation = if float_equal(c_out, neighbour_mean, tolerance) {
            report.flat_positions += 1;
            (excursion > bound).then_some(Violation::TubeExceeded {
                index: j,
                cumulative_input: c_in,
                cumulative_output: c_out,
            })
        } else if c_out < neighbour_mean {
            report.upper_contacts += 1;
            let touches = float_equal(c_out, c_in + lambda, tolerance);
            (!touches).then_some(Violation::UpperContactMissed {
                index: j,
                cumulative_input: c_in,
                cumulative_output: c_out,
            })
        } else {
            report.lower_contacts += 1;
            let touches = float_equal(c_out, c_in - lambda, tolerance);
            (!touches).then_some(Violation::LowerContactMissed {
                index: j,
                cumulative_input: c_in,
                cumulative_output: c_out,
            })
        };

        if violation.is_some() {
            report.violation = violation;
            break;
        }
    }

    Ok(report)
}

/// Evaluates `0.5 * sum (x_i - y_i)^2 + lambda * sum |y_{i+1} - y_i|`.
pub fn objective(input: &[f64], output: &[f64], lambda: f64) -> Result<f64, TvdError> {
    validate_lambda(lambda)?;
    if input.len() != output.len() {
        return Err(TvdError::invalid_input(format!(
            "objective requires equal lengths; got input={}, output={}",
            input.len(),
            output.len()
        )));
    }

    let fidelity = input
        .iter()
        .zip(output)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        * 0.5;
    let variation = output
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .sum::<f64>();
    Ok(fidelity + lambda * variation)
}

fn validate_lambda(lambda: f64) -> Result<(), TvdError> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(TvdError::invalid_input(format!(
            "lambda must be finite and >= 0; got {lambda}"
        )));
    }
    Ok(())
}

/// Evaluation namespace.
pub fn crate_name() -> &'static str {
    let _ = tvd_core::crate_name();
    "tvd-eval"
}
