// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::num::NonZeroU32;
use std::time::Duration;

/// Default gap before each slow-refresh cycle (one day).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;
/// Default spacing between ticks within a cycle.
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 3_000;
/// Default bound on ticks for slow-refresh and ad-hoc cycles.
pub const DEFAULT_MAX_TRY_PER_ATTEMPT: u32 = 3;
/// Default bound on waiting for a collector response.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 3_000;

/// Reporting cadence knobs.
#[derive(Debug, Clone, clap::Args)]
pub struct ReporterConfig {
    /// Spacing between ticks within one cycle, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SEND_INTERVAL_MS, env = "HERALD_SEND_INTERVAL_MS")]
    pub send_interval_ms: u64,

    /// Delay before each slow-refresh cycle, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_MS, env = "HERALD_REFRESH_INTERVAL_MS")]
    pub refresh_interval_ms: u64,

    /// Max ticks per slow-refresh or ad-hoc cycle.
    #[arg(long, default_value_t = DEFAULT_MAX_TRY_PER_ATTEMPT, env = "HERALD_MAX_TRY_PER_ATTEMPT")]
    pub max_try_per_attempt: u32,

    /// How long one tick waits for the collector's response, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RESPONSE_TIMEOUT_MS, env = "HERALD_RESPONSE_TIMEOUT_MS")]
    pub response_timeout_ms: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: DEFAULT_SEND_INTERVAL_MS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            max_try_per_attempt: DEFAULT_MAX_TRY_PER_ATTEMPT,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }
}

impl ReporterConfig {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.cadence().map(|_| ())
    }

    /// Resolve the validated cadence. Every knob must be strictly positive.
    pub fn cadence(&self) -> anyhow::Result<Cadence> {
        if self.send_interval_ms == 0 {
            anyhow::bail!("send interval must be greater than 0");
        }
        if self.refresh_interval_ms == 0 {
            anyhow::bail!("refresh interval must be greater than 0");
        }
        if self.response_timeout_ms == 0 {
            anyhow::bail!("response timeout must be greater than 0");
        }
        let Some(max_try_per_attempt) = NonZeroU32::new(self.max_try_per_attempt) else {
            anyhow::bail!("max tries per attempt must be greater than 0");
        };

        Ok(Cadence {
            send_interval: Duration::from_millis(self.send_interval_ms),
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
            max_try_per_attempt,
            response_timeout: Duration::from_millis(self.response_timeout_ms),
        })
    }
}

/// Validated cadence, the form the scheduler consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub send_interval: Duration,
    pub refresh_interval: Duration,
    pub max_try_per_attempt: NonZeroU32,
    pub response_timeout: Duration,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
