// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One cycle's unit of work: send once per tick, count, decide.

use std::sync::Arc;
use std::time::Duration;

use crate::descriptor::DescriptorFactory;
use crate::outcome::{FailureKind, ReportOutcome};
use crate::policy::{CycleKind, MaxTries};
use crate::transport::TransportClient;

/// Read-only collaborators shared by every cycle.
#[derive(Clone)]
pub struct Collaborators {
    pub factory: Arc<dyn DescriptorFactory>,
    pub transport: Arc<dyn TransportClient>,
}

/// What the cycle should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not delivered; tick again after the period.
    Retry,
    /// Delivered; the cycle is done and its completion must run.
    Succeeded,
    /// `max_tries` used up without success; the cycle ends silently.
    Exhausted,
}

/// Per-cycle sender. The tick counter is private to this instance.
pub struct ReportAttempt {
    collaborators: Collaborators,
    max_tries: MaxTries,
    response_timeout: Duration,
    cycle: u64,
    kind: CycleKind,
    ticks: u64,
}

impl ReportAttempt {
    pub fn new(
        collaborators: Collaborators,
        max_tries: MaxTries,
        response_timeout: Duration,
        cycle: u64,
        kind: CycleKind,
    ) -> Self {
        Self { collaborators, max_tries, response_timeout, cycle, kind, ticks: 0 }
    }

    /// Ticks taken so far, including the one that found the cycle exhausted.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick. Never fails; every error is folded into `Retry`.
    pub async fn tick(&mut self) -> TickOutcome {
        self.ticks = self.ticks.saturating_add(1);
        if !self.max_tries.allows(self.ticks) {
            return TickOutcome::Exhausted;
        }

        match self.send_once().await {
            ReportOutcome::Success => {
                tracing::info!(
                    cycle = self.cycle,
                    kind = self.kind.as_str(),
                    tick = self.ticks,
                    "descriptor delivered"
                );
                TickOutcome::Succeeded
            }
            ReportOutcome::Failure(failure) => {
                tracing::warn!(
                    cycle = self.cycle,
                    kind = self.kind.as_str(),
                    tick = self.ticks,
                    failure = %failure.kind,
                    err = %failure.message,
                    "descriptor delivery failed"
                );
                TickOutcome::Retry
            }
            ReportOutcome::Timeout => {
                tracing::warn!(
                    cycle = self.cycle,
                    kind = self.kind.as_str(),
                    tick = self.ticks,
                    "timed out waiting for collector response"
                );
                TickOutcome::Retry
            }
        }
    }

    /// Build the descriptor, send it, and wait for the classified outcome.
    pub async fn send_once(&self) -> ReportOutcome {
        let descriptor = match self.collaborators.factory.create() {
            Ok(d) => d,
            Err(e) => return ReportOutcome::failure(FailureKind::Descriptor, format!("{e:#}")),
        };
        tracing::debug!(cycle = self.cycle, agent_id = %descriptor.agent_id, "sending descriptor");
        self.collaborators.transport.send(descriptor).wait(self.response_timeout).await
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;
