// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error type shared by every crate in the workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TvdError {
    /// A documented precondition was violated by the caller.
    InvalidInput(String),
    /// Arithmetic produced a value the algorithm cannot continue from.
    NumericalIssue(String),
    /// The request is well-formed but outside what is implemented.
    NotSupported(String),
}

impl TvdError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }
}

impl fmt::Display for TvdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NumericalIssue(msg) => write!(f, "numerical issue: {msg}"),
            Self::NotSupported(msg) => write!(f, "not supported: {msg}"),
        }
    }
}

impl std::error::Error for TvdError {}
