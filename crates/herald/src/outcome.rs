// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tick delivery outcomes and the collector's acknowledgement body.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of sending the descriptor once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Success,
    Failure(ReportFailure),
    /// No outcome arrived within the bounded wait.
    Timeout,
}

impl ReportOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(ReportFailure { kind, message: message.into() })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Why a tick did not succeed. None of these stop a cycle early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network or transport-level error.
    Transport,
    /// The collector answered with `success: false`.
    Application,
    /// A response arrived but is not a readable acknowledgement.
    MalformedResponse,
    /// The descriptor could not be built.
    Descriptor,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT",
            Self::Application => "APPLICATION",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::Descriptor => "DESCRIPTOR",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified tick failure with a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ReportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Acknowledgement body returned by the collector.
///
/// This, not the transport status, is the authoritative success signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReportAck {
    /// Interpret raw response bytes as an acknowledgement.
    pub fn outcome_of(body: &[u8]) -> ReportOutcome {
        if body.is_empty() {
            return ReportOutcome::failure(FailureKind::MalformedResponse, "empty response body");
        }
        match serde_json::from_slice::<ReportAck>(body) {
            Ok(ack) if ack.success => ReportOutcome::Success,
            Ok(ack) => ReportOutcome::failure(
                FailureKind::Application,
                ack.message.unwrap_or_else(|| "collector rejected descriptor".to_owned()),
            ),
            Err(e) => ReportOutcome::failure(FailureKind::MalformedResponse, e.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
