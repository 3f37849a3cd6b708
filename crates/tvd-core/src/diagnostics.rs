// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Diagnostics schema version for filter run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured diagnostics captured from a filter run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FilterDiagnostics {
    pub n: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub algorithm: Cow<'static, str>,
    pub lambda: f64,
    pub edge_offset: Cow<'static, str>,
    pub runtime_ms: Option<u64>,
    /// Accumulator points absorbed into a newer point while extending an envelope.
    pub merges: usize,
    /// Runs emitted to the output, counting the terminal drain.
    pub finalized_runs: usize,
    /// Largest combined length of both envelopes seen during the pass.
    pub max_envelope_len: usize,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
}

impl Default for FilterDiagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            algorithm: Cow::Borrowed(""),
            lambda: 0.0,
            edge_offset: Cow::Borrowed(""),
            runtime_ms: None,
            merges: 0,
            finalized_runs: 0,
            max_envelope_len: 0,
            notes: vec![],
            warnings: vec![],
            #[cfg(feature = "serde")]
            params_json: None,
        }
    }
}
