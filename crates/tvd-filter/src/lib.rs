// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod envelope;
pub mod filter;
pub mod point;
mod solver;
pub mod streaming;

pub use envelope::Envelope;
pub use filter::{EdgeOffset, FilterResult, TvFilter, TvFilterConfig, total_variation_filter};
pub use point::{AccumulatorPoint, TurnTest, turn, turn_reversed};
pub use streaming::StreamingTvFilter;

/// Filter namespace.
pub fn crate_name() -> &'static str {
    let _ = tvd_core::crate_name();
    "tvd-filter"
}
