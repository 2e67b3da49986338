// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::{Collaborators, ReportAttempt, TickOutcome};
use crate::outcome::{FailureKind, ReportOutcome};
use crate::policy::{CycleKind, MaxTries};
use crate::test_support::{collaborators, FailingFactory, Reply, ScriptedTransport};

const WAIT: Duration = Duration::from_millis(500);

fn limited(n: u32) -> MaxTries {
    NonZeroU32::new(n).map(MaxTries::Limited).unwrap_or(MaxTries::Unbounded)
}

fn attempt(transport: &Arc<ScriptedTransport>, max_tries: MaxTries) -> ReportAttempt {
    ReportAttempt::new(collaborators(Arc::clone(transport)), max_tries, WAIT, 1, CycleKind::AdHoc)
}

#[tokio::test]
async fn success_on_first_tick() {
    let transport = ScriptedTransport::always(Reply::Ack);
    let mut attempt = attempt(&transport, limited(3));

    assert_eq!(attempt.tick().await, TickOutcome::Succeeded);
    assert_eq!(transport.send_count(), 1);
}

#[tokio::test]
async fn never_succeeding_sends_exactly_max_tries() {
    let transport = ScriptedTransport::always(Reply::Nack);
    let mut attempt = attempt(&transport, limited(3));

    for _ in 0..3 {
        assert_eq!(attempt.tick().await, TickOutcome::Retry);
    }
    assert_eq!(attempt.tick().await, TickOutcome::Exhausted);
    assert_eq!(attempt.tick().await, TickOutcome::Exhausted);
    assert_eq!(transport.send_count(), 3);
}

#[tokio::test]
async fn succeeds_on_kth_tick() {
    let transport = ScriptedTransport::new([Reply::Error, Reply::Garbage], Reply::Ack);
    let mut attempt = attempt(&transport, limited(5));

    assert_eq!(attempt.tick().await, TickOutcome::Retry);
    assert_eq!(attempt.tick().await, TickOutcome::Retry);
    assert_eq!(attempt.tick().await, TickOutcome::Succeeded);
    assert_eq!(attempt.ticks(), 3);
    assert_eq!(transport.send_count(), 3);
}

#[tokio::test]
async fn unbounded_keeps_retrying() {
    let transport = ScriptedTransport::always(Reply::Error);
    let mut attempt = attempt(&transport, MaxTries::Unbounded);

    for _ in 0..50 {
        assert_eq!(attempt.tick().await, TickOutcome::Retry);
    }
    assert_eq!(transport.send_count(), 50);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_retry_not_error() {
    let transport = ScriptedTransport::new([Reply::Hang], Reply::Ack);
    let mut attempt = attempt(&transport, limited(2));

    let started = tokio::time::Instant::now();
    assert_eq!(attempt.tick().await, TickOutcome::Retry);
    assert!(started.elapsed() >= WAIT);
    assert_eq!(attempt.tick().await, TickOutcome::Succeeded);
}

#[tokio::test]
async fn send_once_classifies_failures() {
    let cases = [
        (Reply::Nack, FailureKind::Application),
        (Reply::Error, FailureKind::Transport),
        (Reply::Garbage, FailureKind::MalformedResponse),
    ];
    for (reply, expected) in cases {
        let transport = ScriptedTransport::always(reply);
        let attempt = attempt(&transport, limited(1));

        match attempt.send_once().await {
            ReportOutcome::Failure(f) => assert_eq!(f.kind, expected),
            other => unreachable!("expected {expected} failure for {reply:?}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn factory_error_is_descriptor_failure_without_send() {
    let transport = ScriptedTransport::always(Reply::Ack);
    let collaborators = Collaborators {
        factory: Arc::new(FailingFactory),
        transport: Arc::clone(&transport) as _,
    };
    let mut attempt = ReportAttempt::new(collaborators, limited(2), WAIT, 1, CycleKind::AdHoc);

    match attempt.send_once().await {
        ReportOutcome::Failure(f) => {
            assert_eq!(f.kind, FailureKind::Descriptor);
            assert!(f.message.contains("hostname lookup failed"));
        }
        other => unreachable!("expected descriptor failure, got {other:?}"),
    }
    assert_eq!(attempt.tick().await, TickOutcome::Retry);
    assert_eq!(transport.send_count(), 0);
}

#[tokio::test]
async fn counters_are_per_attempt() {
    let transport = ScriptedTransport::always(Reply::Nack);
    let mut first = attempt(&transport, limited(2));
    let mut second = attempt(&transport, limited(2));

    assert_eq!(first.tick().await, TickOutcome::Retry);
    assert_eq!(first.tick().await, TickOutcome::Retry);
    assert_eq!(first.tick().await, TickOutcome::Exhausted);

    assert_eq!(second.ticks(), 0);
    assert_eq!(second.tick().await, TickOutcome::Retry);
    assert_eq!(transport.send_count(), 3);
}
