// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod sample;

pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, FilterDiagnostics};
pub use error::TvdError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink};
pub use sample::{Sample, SampleSink, validate_finite};

/// Core shared types and traits for tvd-rs.
pub fn crate_name() -> &'static str {
    "tvd-core"
}
