// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A provisional run of one or more samples that share one output value.
///
/// Seen as a 2-D vector, `weight` is the run length along the sample axis and
/// `value` is the sum of the run along the cumulative-value axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccumulatorPoint {
    pub value: f64,
    pub weight: usize,
}

impl AccumulatorPoint {
    /// Empty aggregate, used as the starting point of running sums.
    pub const ZERO: Self = Self {
        value: 0.0,
        weight: 0,
    };

    /// A run consisting of one sample.
    pub fn sample(value: f64) -> Self {
        Self { value, weight: 1 }
    }

    pub fn merge(self, other: Self) -> Self {
        self + other
    }

    /// Shared output value of every sample in the run.
    pub fn mean(&self) -> f64 {
        self.value / self.weight as f64
    }
}

impl Add for AccumulatorPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
            weight: self.weight + rhs.weight,
        }
    }
}

impl AddAssign for AccumulatorPoint {
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
        self.weight += rhs.weight;
    }
}

impl Sub for AccumulatorPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        debug_assert!(rhs.weight <= self.weight, "run weight underflow");
        Self {
            value: self.value - rhs.value,
            weight: self.weight - rhs.weight,
        }
    }
}

impl SubAssign for AccumulatorPoint {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// Orientation test used by envelope maintenance, passed explicitly so the
/// upper and lower envelopes can share one implementation.
pub type TurnTest = fn(&AccumulatorPoint, &AccumulatorPoint) -> f64;

/// Signed area of the parallelogram spanned by `u` and `v`.
///
/// Equals `u.weight * v.weight * (mean(u) - mean(v))`, so it is positive
/// exactly when `u` is steeper than `v`.
#[inline]
pub fn turn(u: &AccumulatorPoint, v: &AccumulatorPoint) -> f64 {
    u.value * v.weight as f64 - u.weight as f64 * v.value
}

/// [`turn`] with its arguments swapped, for the mirrored envelope.
#[inline]
pub fn turn_reversed(u: &AccumulatorPoint, v: &AccumulatorPoint) -> f64 {
    turn(v, u)
}
