// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reporting cadence end to end through the public `Reporter` API.
//!
//! Runs on paused tokio time, so sleeps advance the clock deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use herald::config::ReporterConfig;
use herald::descriptor::StaticDescriptorFactory;
use herald::scheduler::Lifecycle;
use herald::test_support::{test_descriptor, Reply, ScriptedTransport};
use herald::Reporter;

const SEND: Duration = Duration::from_millis(100);
const REFRESH: Duration = Duration::from_secs(60);

fn config() -> ReporterConfig {
    ReporterConfig {
        send_interval_ms: SEND.as_millis() as u64,
        refresh_interval_ms: REFRESH.as_millis() as u64,
        max_try_per_attempt: 3,
        response_timeout_ms: 1_000,
    }
}

fn reporter(transport: &Arc<ScriptedTransport>) -> anyhow::Result<Reporter> {
    Reporter::new(
        &config(),
        Arc::new(StaticDescriptorFactory::new(test_descriptor())),
        Arc::clone(transport) as _,
    )
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Assert each offset is at or just after the expected one.
fn assert_offsets(actual: &[Duration], expected: &[Duration]) {
    assert_eq!(actual.len(), expected.len(), "offsets: {actual:?}, expected {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!(*a >= *e && *a < *e + ms(5), "offset {a:?} not near {e:?} in {actual:?}");
    }
}

// -- Bring-up -----------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn bringup_retries_until_success_then_arms_slow_refresh() -> anyhow::Result<()> {
    let transport = ScriptedTransport::new([Reply::Nack, Reply::Nack], Reply::Ack);
    let reporter = reporter(&transport)?;
    let origin = Instant::now();

    reporter.start();
    sleep(ms(250)).await;
    assert_offsets(&transport.send_offsets(origin), &[ms(0), ms(100), ms(200)]);

    // Nothing more until the refresh interval elapses after the success.
    sleep(REFRESH - ms(100)).await;
    assert_eq!(transport.send_count(), 3);

    sleep(ms(100)).await;
    assert_offsets(&transport.send_offsets(origin), &[ms(0), ms(100), ms(200), REFRESH + ms(200)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn bringup_is_unbounded() -> anyhow::Result<()> {
    let transport = ScriptedTransport::always(Reply::Error);
    let reporter = reporter(&transport)?;

    reporter.start();
    sleep(ms(5_050)).await;
    assert_eq!(transport.send_count(), 51);
    Ok(())
}

// -- Slow refresh -------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn slow_refresh_chains_while_each_cycle_succeeds() -> anyhow::Result<()> {
    let transport = ScriptedTransport::new([Reply::Ack, Reply::Nack, Reply::Nack], Reply::Ack);
    let reporter = reporter(&transport)?;
    let origin = Instant::now();

    reporter.start();
    sleep(REFRESH * 2 + ms(500)).await;

    // Bring-up at 0; first refresh cycle fails twice, succeeds on its third
    // tick; the next cycle starts a full refresh interval after that.
    assert_offsets(
        &transport.send_offsets(origin),
        &[ms(0), REFRESH, REFRESH + ms(100), REFRESH + ms(200), REFRESH * 2 + ms(200)],
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_exhaustion_silently_stops_heartbeat() -> anyhow::Result<()> {
    let transport = ScriptedTransport::new([Reply::Ack], Reply::Nack);
    let reporter = reporter(&transport)?;

    reporter.start();
    sleep(REFRESH + ms(1_000)).await;
    assert_eq!(transport.send_count(), 4);

    sleep(REFRESH * 5).await;
    assert_eq!(transport.send_count(), 4);
    assert_eq!(reporter.state(), Lifecycle::Running);

    // Only an explicit refresh pushes again.
    assert!(reporter.refresh());
    sleep(ms(10)).await;
    assert_eq!(transport.send_count(), 5);
    Ok(())
}

// -- Ad-hoc refresh -----------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_count_independently() -> anyhow::Result<()> {
    let transport = ScriptedTransport::new([Reply::Ack], Reply::Nack);
    let reporter = reporter(&transport)?;
    let origin = Instant::now();

    reporter.start();
    sleep(ms(10)).await;
    assert!(reporter.refresh());
    assert!(reporter.refresh());
    sleep(ms(1_000)).await;

    let offsets = transport.send_offsets(origin);
    assert_eq!(offsets.len(), 7);
    assert_offsets(
        &offsets[1..],
        &[ms(10), ms(10), ms(110), ms(110), ms(210), ms(210)],
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn refresh_leaves_main_chain_schedule_alone() -> anyhow::Result<()> {
    let transport = ScriptedTransport::always(Reply::Ack);
    let reporter = reporter(&transport)?;
    let origin = Instant::now();

    reporter.start();
    sleep(ms(10_000)).await;
    assert!(reporter.refresh());
    sleep(REFRESH * 2).await;

    assert_offsets(
        &transport.send_offsets(origin),
        &[ms(0), ms(10_000), REFRESH, REFRESH * 2],
    );
    Ok(())
}

// -- Stop ---------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stop_prevents_further_ticks() -> anyhow::Result<()> {
    let transport = ScriptedTransport::always(Reply::Nack);
    let reporter = reporter(&transport)?;

    reporter.start();
    reporter.refresh();
    sleep(ms(150)).await;
    let sent = transport.send_count();
    assert_eq!(sent, 4);

    assert!(reporter.stop());
    reporter.stopped().await;
    sleep(REFRESH * 3).await;
    assert_eq!(transport.send_count(), sent);
    assert_eq!(reporter.state(), Lifecycle::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_mid_tick_lets_tick_time_out_then_halts() -> anyhow::Result<()> {
    let transport = ScriptedTransport::always(Reply::Hang);
    let reporter = reporter(&transport)?;
    let origin = Instant::now();

    reporter.start();
    sleep(ms(10)).await;
    assert_eq!(transport.send_count(), 1);

    reporter.stop();
    reporter.stopped().await;
    assert!(origin.elapsed() >= ms(1_000), "in-flight tick should wait out its timeout");

    sleep(ms(5_000)).await;
    assert_eq!(transport.send_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn success_after_stop_does_not_arm_successor() -> anyhow::Result<()> {
    let transport = ScriptedTransport::new([Reply::Hang], Reply::Ack);
    let reporter = reporter(&transport)?;

    reporter.start();
    sleep(ms(10)).await;
    reporter.stop();

    transport.release_held(Reply::Ack);
    reporter.stopped().await;
    sleep(REFRESH * 2).await;
    assert_eq!(transport.send_count(), 1);
    Ok(())
}

// -- Idempotence --------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn double_start_and_double_stop_match_single_calls() -> anyhow::Result<()> {
    let transport = ScriptedTransport::always(Reply::Ack);
    let reporter = reporter(&transport)?;

    assert!(reporter.start());
    assert!(!reporter.start());
    sleep(ms(250)).await;
    assert_eq!(transport.send_count(), 1);

    assert!(reporter.stop());
    assert!(!reporter.stop());
    assert!(!reporter.start());
    assert!(!reporter.refresh());
    reporter.stopped().await;

    sleep(REFRESH * 2).await;
    assert_eq!(transport.send_count(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_config_fails_construction() {
    let transport = ScriptedTransport::always(Reply::Ack);
    let config = ReporterConfig { send_interval_ms: 0, ..config() };
    let result = Reporter::new(
        &config,
        Arc::new(StaticDescriptorFactory::new(test_descriptor())),
        transport as _,
    );
    match result {
        Ok(_) => unreachable!("zero send interval accepted"),
        Err(e) => assert!(e.to_string().contains("send interval"), "got: {e}"),
    }
}
