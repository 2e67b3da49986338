// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-over-HTTP transport to a collector.

use std::sync::Once;
use std::time::Duration;

use reqwest::Client;

use crate::descriptor::Descriptor;
use crate::transport::{Response, ResponseCompleter, ResponseHandle, TransportClient};

/// Collector path that accepts descriptors.
pub const AGENT_INFO_PATH: &str = "/api/v1/agent-info";

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Collector endpoint settings.
#[derive(Debug, Clone, clap::Args)]
pub struct CollectorConfig {
    /// Base URL of the collector, e.g. `http://collector:9991`.
    #[arg(long, env = "HERALD_COLLECTOR_URL")]
    pub collector_url: String,

    /// Bearer token for the collector. If unset, no auth header is sent.
    #[arg(long, env = "HERALD_COLLECTOR_TOKEN")]
    pub collector_token: Option<String>,

    /// HTTP request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "HERALD_HTTP_TIMEOUT_MS")]
    pub http_timeout_ms: u64,
}

impl CollectorConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Posts descriptors to `<collector>/api/v1/agent-info`.
///
/// Each send runs on its own task; the request outlives a reporter tick that
/// gave up waiting, and its late result is discarded.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    auth_token: Option<String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &CollectorConfig) -> anyhow::Result<Self> {
        ensure_crypto();
        let base = config.collector_url.trim_end_matches('/');
        if base.is_empty() {
            anyhow::bail!("collector url must not be empty");
        }
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            url: format!("{base}{AGENT_INFO_PATH}"),
            auth_token: config.collector_token.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn post(&self, descriptor: &Descriptor) -> anyhow::Result<Response> {
        let req = self.client.post(&self.url).json(descriptor);
        let resp = self.apply_auth(req).send().await?.error_for_status()?;
        let body = resp.bytes().await?;
        Ok(Response::new(body))
    }

    async fn deliver(self, descriptor: Descriptor, completer: ResponseCompleter) {
        match self.post(&descriptor).await {
            Ok(response) => completer.succeed(response),
            Err(e) => completer.fail(e),
        }
    }
}

impl TransportClient for HttpTransport {
    fn send(&self, descriptor: Descriptor) -> ResponseHandle {
        let (completer, handle) = ResponseHandle::channel();
        tokio::spawn(self.clone().deliver(descriptor, completer));
        handle
    }
}
