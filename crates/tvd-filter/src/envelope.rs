// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Monotone chains of accumulator points.
//!
//! An envelope is a path in (sample count, cumulative value) space starting at
//! the last finalized position. Consecutive points always pass the envelope's
//! turn test, so the upper envelope is convex and the lower one concave.
//! Points enter at the tail and leave either by merging into a newer point or
//! by being finalized from the head.

use crate::point::{AccumulatorPoint, TurnTest};
use std::collections::VecDeque;
use tvd_core::{Sample, SampleSink};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    points: VecDeque<AccumulatorPoint>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(point: AccumulatorPoint) -> Self {
        let mut points = VecDeque::new();
        points.push_back(point);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccumulatorPoint> {
        self.points.iter()
    }

    /// Total number of samples held by the envelope.
    pub fn weight(&self) -> usize {
        self.points.iter().map(|p| p.weight).sum()
    }

    /// The only point of a collapsed envelope.
    pub fn sole_point_mut(&mut self) -> Option<&mut AccumulatorPoint> {
        if self.points.len() == 1 {
            self.points.front_mut()
        } else {
            None
        }
    }

    /// Appends `point`, first absorbing every tail point it does not turn
    /// strictly away from. Returns the number of absorbed points.
    pub fn extend(&mut self, mut point: AccumulatorPoint, test: TurnTest) -> usize {
        let mut merges = 0;
        while let Some(tail) = self.points.back() {
            if test(&point, tail) > 0.0 {
                break;
            }
            point += *tail;
            self.points.pop_back();
            merges += 1;
        }
        self.points.push_back(point);
        merges
    }

    /// Finalizes the head of this envelope against the opposite envelope's
    /// collapsed point.
    ///
    /// Walks from the head accumulating the consumed prefix `v` and stops at
    /// the first point `f` for which `test(pivot - v, f) >= 0`. Every consumed
    /// point is emitted to `sink` in order and removed; `pivot` is then
    /// re-anchored at the end of the consumed prefix. Returns the number of
    /// finalized points.
    pub fn reduce_against<T, S>(
        &mut self,
        pivot: &mut AccumulatorPoint,
        test: TurnTest,
        sink: &mut S,
    ) -> usize
    where
        T: Sample,
        S: SampleSink<T>,
    {
        let mut consumed = AccumulatorPoint::ZERO;
        let mut boundary = 0;
        for front in &self.points {
            if test(&(*pivot - consumed), front) >= 0.0 {
                break;
            }
            consumed += *front;
            boundary += 1;
        }

        for point in self.points.drain(..boundary) {
            emit(point, sink);
        }
        *pivot -= consumed;
        boundary
    }

    /// Emits every remaining point head to tail and empties the envelope.
    pub fn drain_into<T, S>(&mut self, sink: &mut S) -> usize
    where
        T: Sample,
        S: SampleSink<T>,
    {
        let drained = self.points.len();
        for point in self.points.drain(..) {
            emit(point, sink);
        }
        drained
    }
}

fn emit<T, S>(point: AccumulatorPoint, sink: &mut S)
where
    T: Sample,
    S: SampleSink<T>,
{
    sink.push_run(T::from_f64(point.mean()), point.weight);
}
