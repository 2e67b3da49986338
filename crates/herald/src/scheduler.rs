// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cycle scheduling: fast bring-up, chained slow refresh, and ad-hoc pushes.
//!
//! Every cycle is a task on the runtime captured at construction. All cycles
//! share one cancellation token and one task tracker; `stop()` cancels the
//! token under the lifecycle lock, and arming a cycle checks the lifecycle
//! under the same lock, so nothing can be armed after shutdown.
//!
//! A cycle that succeeds runs its [`OnSuccess`] transition. A cycle that runs
//! out of tries ends without one, which for the main chain means the
//! heartbeat stops for good. Ad-hoc refreshes still push but never re-arm it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::attempt::{Collaborators, ReportAttempt, TickOutcome};
use crate::config::Cadence;
use crate::policy::{AttemptPolicy, CycleKind};

/// Reporter lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Stopped,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Transition taken when a cycle delivers successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnSuccess {
    /// Arm the next slow-refresh cycle.
    ArmSlowRefresh,
    Nothing,
}

/// Everything a cycle needs, passed by value at arm time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub kind: CycleKind,
    pub policy: AttemptPolicy,
    pub on_success: OnSuccess,
}

impl Cycle {
    pub fn fast_bringup(cadence: &Cadence) -> Self {
        Self {
            kind: CycleKind::FastBringup,
            policy: AttemptPolicy::fast_bringup(cadence),
            on_success: OnSuccess::ArmSlowRefresh,
        }
    }

    pub fn slow_refresh(cadence: &Cadence) -> Self {
        Self {
            kind: CycleKind::SlowRefresh,
            policy: AttemptPolicy::slow_refresh(cadence),
            on_success: OnSuccess::ArmSlowRefresh,
        }
    }

    pub fn ad_hoc(cadence: &Cadence) -> Self {
        Self {
            kind: CycleKind::AdHoc,
            policy: AttemptPolicy::ad_hoc(cadence),
            on_success: OnSuccess::Nothing,
        }
    }
}

/// Owns the cycle tasks, the lifecycle flag, and the lock guarding both.
pub struct ReportScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    cadence: Cadence,
    collaborators: Collaborators,
    runtime: Handle,
    lifecycle: Mutex<Lifecycle>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    next_cycle: AtomicU64,
}

impl ReportScheduler {
    /// Must be called from within a tokio runtime; cycles run on it.
    pub fn new(cadence: Cadence, collaborators: Collaborators) -> anyhow::Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("report scheduler needs a tokio runtime: {e}"))?;
        Ok(Self {
            inner: Arc::new(Inner {
                cadence,
                collaborators,
                runtime,
                lifecycle: Mutex::new(Lifecycle::Created),
                shutdown: CancellationToken::new(),
                tracker: TaskTracker::new(),
                next_cycle: AtomicU64::new(1),
            }),
        })
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.inner.lifecycle.lock()
    }

    /// Number of cycles currently armed or mid-tick.
    pub fn active_cycles(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Arm the fast bring-up cycle. Returns `false` if already started or stopped.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.inner.lifecycle.lock();
        if *lifecycle != Lifecycle::Created {
            tracing::info!(state = lifecycle.as_str(), "start ignored");
            return false;
        }
        *lifecycle = Lifecycle::Running;
        self.inner.arm(&lifecycle, Cycle::fast_bringup(&self.inner.cadence));
        true
    }

    /// Arm one ad-hoc cycle alongside the main chain. Returns `false` unless running.
    pub fn refresh(&self) -> bool {
        let lifecycle = self.inner.lifecycle.lock();
        if *lifecycle != Lifecycle::Running {
            tracing::info!(state = lifecycle.as_str(), "refresh ignored");
            return false;
        }
        self.inner.arm(&lifecycle, Cycle::ad_hoc(&self.inner.cadence));
        true
    }

    /// Cancel every armed cycle and refuse to arm more. Returns `false` unless running.
    ///
    /// A tick already in flight finishes; no tick starts afterwards.
    pub fn stop(&self) -> bool {
        let mut lifecycle = self.inner.lifecycle.lock();
        if *lifecycle != Lifecycle::Running {
            tracing::info!(state = lifecycle.as_str(), "stop ignored");
            return false;
        }
        self.inner.shut_down(&mut lifecycle);
        true
    }

    /// Wait until stopped and every cycle task has returned.
    ///
    /// Never resolves for a scheduler that is not stopped.
    pub async fn stopped(&self) {
        self.inner.tracker.wait().await;
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        let mut lifecycle = self.inner.lifecycle.lock();
        if *lifecycle == Lifecycle::Running {
            self.inner.shut_down(&mut lifecycle);
        }
    }
}

impl Inner {
    /// Spawn `cycle`. Taking the guard keeps the lifecycle check and the
    /// spawn in one critical section.
    fn arm(self: &Arc<Self>, lifecycle: &MutexGuard<'_, Lifecycle>, cycle: Cycle) {
        debug_assert_eq!(**lifecycle, Lifecycle::Running);
        let id = self.next_cycle.fetch_add(1, Ordering::Relaxed);
        let first_tick = Instant::now() + cycle.policy.initial_delay;
        tracing::debug!(
            cycle = id,
            kind = cycle.kind.as_str(),
            delay_ms = cycle.policy.initial_delay.as_millis() as u64,
            "cycle armed"
        );
        self.tracker.spawn_on(run_cycle(Arc::clone(self), id, cycle, first_tick), &self.runtime);
    }

    fn shut_down(&self, lifecycle: &mut MutexGuard<'_, Lifecycle>) {
        **lifecycle = Lifecycle::Stopped;
        self.shutdown.cancel();
        self.tracker.close();
    }

    fn complete(self: &Arc<Self>, id: u64, on_success: OnSuccess) {
        match on_success {
            OnSuccess::Nothing => {}
            OnSuccess::ArmSlowRefresh => {
                let lifecycle = self.lifecycle.lock();
                if *lifecycle != Lifecycle::Running {
                    tracing::debug!(cycle = id, "not arming slow refresh after stop");
                    return;
                }
                self.arm(&lifecycle, Cycle::slow_refresh(&self.cadence));
            }
        }
    }
}

async fn run_cycle(inner: Arc<Inner>, id: u64, cycle: Cycle, first_tick: Instant) {
    let mut attempt = ReportAttempt::new(
        inner.collaborators.clone(),
        cycle.policy.max_tries,
        inner.cadence.response_timeout,
        id,
        cycle.kind,
    );
    let mut timer = tokio::time::interval_at(first_tick, cycle.policy.period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => {
                tracing::debug!(cycle = id, kind = cycle.kind.as_str(), "cycle cancelled");
                return;
            }
            _ = timer.tick() => {}
        }

        match attempt.tick().await {
            TickOutcome::Retry => {}
            TickOutcome::Succeeded => {
                inner.complete(id, cycle.on_success);
                return;
            }
            TickOutcome::Exhausted => {
                tracing::warn!(
                    cycle = id,
                    kind = cycle.kind.as_str(),
                    tries = attempt.ticks() - 1,
                    "cycle exhausted without delivering"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
