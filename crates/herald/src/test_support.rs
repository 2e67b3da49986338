// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: scripted transport, fixtures, and assertion helpers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::attempt::Collaborators;
use crate::descriptor::{Descriptor, DescriptorFactory, StaticDescriptorFactory};
use crate::transport::{Response, ResponseCompleter, ResponseHandle, TransportClient};

/// How the scripted collector answers one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `{"success": true}`
    Ack,
    /// `{"success": false}`
    Nack,
    /// Transport-level error.
    Error,
    /// A body that is not an acknowledgement.
    Garbage,
    /// Never answers until [`ScriptedTransport::release_held`].
    Hang,
}

/// In-memory transport that answers from a script and records every send.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    sends: Mutex<Vec<(Instant, Descriptor)>>,
    held: Mutex<Vec<ResponseCompleter>>,
}

impl ScriptedTransport {
    /// Answer with `script` in order, then `fallback` forever.
    pub fn new(script: impl IntoIterator<Item = Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            sends: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new([], reply)
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }

    /// Instants at which each send happened, oldest first.
    pub fn send_times(&self) -> Vec<Instant> {
        self.sends.lock().iter().map(|(at, _)| *at).collect()
    }

    /// Offsets of each send from `origin`.
    pub fn send_offsets(&self, origin: Instant) -> Vec<Duration> {
        self.send_times().into_iter().map(|at| at.saturating_duration_since(origin)).collect()
    }

    pub fn last_descriptor(&self) -> Option<Descriptor> {
        self.sends.lock().last().map(|(_, d)| d.clone())
    }

    /// Settle every hanging request with `reply`.
    pub fn release_held(&self, reply: Reply) {
        let held: Vec<_> = self.held.lock().drain(..).collect();
        for completer in held {
            self.settle(completer, reply);
        }
    }

    fn settle(&self, completer: ResponseCompleter, reply: Reply) {
        match reply {
            Reply::Ack => completer.succeed(ack_response(true)),
            Reply::Nack => completer.succeed(ack_response(false)),
            Reply::Error => completer.fail(anyhow::anyhow!("connection refused")),
            Reply::Garbage => completer.succeed(Response::new("<html>502</html>")),
            Reply::Hang => self.held.lock().push(completer),
        }
    }
}

impl TransportClient for ScriptedTransport {
    fn send(&self, descriptor: Descriptor) -> ResponseHandle {
        self.sends.lock().push((Instant::now(), descriptor));
        let reply = self.script.lock().pop_front().unwrap_or(self.fallback);
        let (completer, handle) = ResponseHandle::channel();
        self.settle(completer, reply);
        handle
    }
}

/// Factory whose every call fails.
pub struct FailingFactory;

impl DescriptorFactory for FailingFactory {
    fn create(&self) -> anyhow::Result<Descriptor> {
        anyhow::bail!("hostname lookup failed")
    }
}

/// Serialized acknowledgement body.
pub fn ack_response(success: bool) -> Response {
    Response::new(format!(r#"{{"success":{success}}}"#))
}

/// A fixed descriptor for tests.
pub fn test_descriptor() -> Descriptor {
    Descriptor {
        agent_id: "test-agent".to_owned(),
        application_name: "test-app".to_owned(),
        hostname: "localhost".to_owned(),
        ip: "127.0.0.1".to_owned(),
        pid: 4242,
        agent_version: env!("CARGO_PKG_VERSION").to_owned(),
        start_time_ms: 1_700_000_000_000,
        ports: vec![],
        container: false,
    }
}

/// Collaborators wired to `transport` and a static descriptor.
pub fn collaborators(transport: Arc<ScriptedTransport>) -> Collaborators {
    Collaborators {
        factory: Arc::new(StaticDescriptorFactory::new(test_descriptor())),
        transport,
    }
}

/// Assert that `$expr` is `Err` and its display string contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
