// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TvdError;
use std::fmt::Debug;

/// Real-valued element type accepted and produced by the filter.
///
/// Arithmetic is carried out in `f64`; outputs are converted back to the
/// caller's element type on emission.
pub trait Sample: Copy + Debug + PartialEq {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// Append-only consumer of filter output.
pub trait SampleSink<T> {
    fn push(&mut self, value: T);

    /// Appends `count` copies of `value`.
    fn push_run(&mut self, value: T, count: usize)
    where
        T: Copy,
    {
        for _ in 0..count {
            self.push(value);
        }
    }
}

impl<T: Copy> SampleSink<T> for Vec<T> {
    fn push(&mut self, value: T) {
        Vec::push(self, value);
    }

    fn push_run(&mut self, value: T, count: usize) {
        self.extend(std::iter::repeat(value).take(count));
    }
}

/// Returns an error naming the first non-finite sample, if any.
pub fn validate_finite<T: Sample>(values: &[T]) -> Result<(), TvdError> {
    if let Some((idx, value)) = values
        .iter()
        .map(|v| v.to_f64())
        .enumerate()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(TvdError::invalid_input(format!(
            "sample {idx} is not finite: {value}"
        )));
    }
    Ok(())
}
