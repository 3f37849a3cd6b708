// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Benchmark namespace.
pub fn crate_name() -> &'static str {
    let _ = (tvd_core::crate_name(), tvd_filter::crate_name());
    "tvd-bench"
}
