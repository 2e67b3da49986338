// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt policies: how often, how soon, and how many times a cycle ticks.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::Cadence;

/// Which phase of the reporting cadence a cycle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    FastBringup,
    SlowRefresh,
    AdHoc,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FastBringup => "fast_bringup",
            Self::SlowRefresh => "slow_refresh",
            Self::AdHoc => "ad_hoc",
        }
    }
}

/// Upper bound on ticks in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxTries {
    Unbounded,
    Limited(NonZeroU32),
}

impl MaxTries {
    /// Whether the `tick`-th tick (1-based) may still send.
    pub fn allows(self, tick: u64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limited(n) => tick <= u64::from(n.get()),
        }
    }
}

/// Schedule for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub max_tries: MaxTries,
    pub period: Duration,
    pub initial_delay: Duration,
}

impl AttemptPolicy {
    /// Retry forever at the send interval, starting now.
    pub fn fast_bringup(cadence: &Cadence) -> Self {
        Self {
            max_tries: MaxTries::Unbounded,
            period: cadence.send_interval,
            initial_delay: Duration::ZERO,
        }
    }

    /// Bounded retries after waiting out the refresh interval.
    pub fn slow_refresh(cadence: &Cadence) -> Self {
        Self {
            max_tries: MaxTries::Limited(cadence.max_try_per_attempt),
            period: cadence.send_interval,
            initial_delay: cadence.refresh_interval,
        }
    }

    /// Bounded retries, starting now.
    pub fn ad_hoc(cadence: &Cadence) -> Self {
        Self {
            max_tries: MaxTries::Limited(cadence.max_try_per_attempt),
            period: cadence.send_interval,
            initial_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
