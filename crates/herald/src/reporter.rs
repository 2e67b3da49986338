// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public lifecycle object for descriptor reporting.

use std::sync::Arc;

use crate::attempt::Collaborators;
use crate::config::ReporterConfig;
use crate::descriptor::DescriptorFactory;
use crate::scheduler::{Lifecycle, ReportScheduler};
use crate::transport::TransportClient;

/// Reports the agent descriptor until delivered, then heartbeats it.
///
/// Single use: `Created → Running → Stopped`. Out-of-order calls are
/// logged no-ops and return `false`.
pub struct Reporter {
    scheduler: ReportScheduler,
}

impl Reporter {
    /// Validate `config` and bind to the current tokio runtime.
    pub fn new(
        config: &ReporterConfig,
        factory: Arc<dyn DescriptorFactory>,
        transport: Arc<dyn TransportClient>,
    ) -> anyhow::Result<Self> {
        let cadence = config.cadence()?;
        let scheduler = ReportScheduler::new(cadence, Collaborators { factory, transport })?;
        Ok(Self { scheduler })
    }

    pub fn start(&self) -> bool {
        self.scheduler.start()
    }

    pub fn stop(&self) -> bool {
        let stopped = self.scheduler.stop();
        if stopped {
            tracing::info!("reporter stopped");
        }
        stopped
    }

    /// Push the descriptor out of band, e.g. after a configuration change.
    pub fn refresh(&self) -> bool {
        self.scheduler.refresh()
    }

    pub fn state(&self) -> Lifecycle {
        self.scheduler.lifecycle()
    }

    /// Wait for every cycle to wind down after [`Reporter::stop`].
    pub async fn stopped(&self) {
        self.scheduler.stopped().await;
    }
}
