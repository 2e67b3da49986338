// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery seam between the reporter and the collector.
//!
//! A [`TransportClient`] accepts a descriptor and hands back a
//! [`ResponseHandle`]. The transport settles the matching
//! [`ResponseCompleter`] whenever the collector answers; the reporter waits
//! on the handle with a bounded timeout.

pub mod http;

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::descriptor::Descriptor;
use crate::outcome::{FailureKind, ReportAck, ReportOutcome};

/// Sends descriptors to a collector.
pub trait TransportClient: Send + Sync {
    /// Start delivering `descriptor`. Must not block.
    fn send(&self, descriptor: Descriptor) -> ResponseHandle;
}

/// Raw collector response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub body: Bytes,
}

impl Response {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Decode the body into an outcome. A response alone is not success.
    pub fn outcome(&self) -> ReportOutcome {
        ReportAck::outcome_of(&self.body)
    }
}

type Settled = anyhow::Result<Response>;

/// Completion side of a pending send, held by the transport.
#[derive(Debug)]
pub struct ResponseCompleter {
    tx: oneshot::Sender<Settled>,
}

impl ResponseCompleter {
    pub fn succeed(self, response: Response) {
        // Receiver gone means the tick already timed out.
        let _ = self.tx.send(Ok(response));
    }

    pub fn fail(self, cause: anyhow::Error) {
        let _ = self.tx.send(Err(cause));
    }
}

/// Waiting side of a pending send, held by the reporter.
#[derive(Debug)]
pub struct ResponseHandle {
    rx: oneshot::Receiver<Settled>,
}

impl ResponseHandle {
    /// Create a linked completer/handle pair.
    pub fn channel() -> (ResponseCompleter, ResponseHandle) {
        let (tx, rx) = oneshot::channel();
        (ResponseCompleter { tx }, ResponseHandle { rx })
    }

    /// A handle that is already settled with `result`.
    pub fn settled(result: anyhow::Result<Response>) -> Self {
        let (completer, handle) = Self::channel();
        match result {
            Ok(response) => completer.succeed(response),
            Err(cause) => completer.fail(cause),
        }
        handle
    }

    /// Wait up to `timeout` for the transport to settle, then classify.
    pub async fn wait(self, timeout: Duration) -> ReportOutcome {
        match tokio::time::timeout(timeout, self.rx).await {
            Err(_) => ReportOutcome::Timeout,
            Ok(Err(_)) => ReportOutcome::failure(
                FailureKind::Transport,
                "transport dropped the request without completing it",
            ),
            Ok(Ok(Err(cause))) => ReportOutcome::failure(FailureKind::Transport, format!("{cause:#}")),
            Ok(Ok(Ok(response))) => response.outcome(),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
