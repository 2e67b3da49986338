// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity descriptor and the factories that build it.

use std::net::{IpAddr, Ipv4Addr};

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use serde::{Deserialize, Serialize};

use crate::epoch_ms;

/// Identity and capability record sent to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub agent_id: String,
    pub application_name: String,
    pub hostname: String,
    pub ip: String,
    pub pid: u32,
    pub agent_version: String,
    pub start_time_ms: u64,
    /// Ports the host application listens on, if known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub container: bool,
}

/// Produces the descriptor to report. Called once per tick.
pub trait DescriptorFactory: Send + Sync {
    fn create(&self) -> anyhow::Result<Descriptor>;
}

/// Always reports the same descriptor.
#[derive(Debug)]
pub struct StaticDescriptorFactory {
    descriptor: Descriptor,
}

impl StaticDescriptorFactory {
    pub fn new(descriptor: Descriptor) -> Self {
        Self { descriptor }
    }
}

impl DescriptorFactory for StaticDescriptorFactory {
    fn create(&self) -> anyhow::Result<Descriptor> {
        Ok(self.descriptor.clone())
    }
}

/// Static agent identity supplied by the operator.
#[derive(Debug, Clone, clap::Args)]
pub struct IdentityConfig {
    /// Agent identifier. A random one is generated if unset.
    #[arg(long, env = "HERALD_AGENT_ID")]
    pub agent_id: Option<String>,

    /// Name of the application this agent belongs to.
    #[arg(long, env = "HERALD_APPLICATION_NAME")]
    pub application_name: String,

    /// Override the reported IP address instead of probing interfaces.
    #[arg(long, env = "HERALD_AGENT_IP")]
    pub agent_ip: Option<IpAddr>,

    /// Ports the application listens on (repeatable).
    #[arg(long = "port", env = "HERALD_PORTS", value_delimiter = ',')]
    pub ports: Vec<u16>,

    /// Report the agent as running inside a container.
    #[arg(long, env = "HERALD_CONTAINER")]
    pub container: bool,
}

/// Builds the descriptor from fixed identity plus live host data.
///
/// Hostname and IP are re-read on every call so a refresh after a network
/// change reports current values.
#[derive(Debug)]
pub struct ProcessDescriptorFactory {
    agent_id: String,
    application_name: String,
    agent_ip: Option<IpAddr>,
    ports: Vec<u16>,
    container: bool,
    start_time_ms: u64,
}

impl ProcessDescriptorFactory {
    pub fn new(identity: IdentityConfig) -> anyhow::Result<Self> {
        if identity.application_name.trim().is_empty() {
            anyhow::bail!("application name must not be empty");
        }
        let agent_id = match identity.agent_id {
            Some(id) if id.trim().is_empty() => anyhow::bail!("agent id must not be empty"),
            Some(id) => id,
            None => format!("herald-{}", uuid::Uuid::new_v4()),
        };
        Ok(Self {
            agent_id,
            application_name: identity.application_name,
            agent_ip: identity.agent_ip,
            ports: identity.ports,
            container: identity.container,
            start_time_ms: epoch_ms(),
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

impl DescriptorFactory for ProcessDescriptorFactory {
    fn create(&self) -> anyhow::Result<Descriptor> {
        let hostname = nix::unistd::gethostname()?.to_string_lossy().into_owned();
        let ip = match self.agent_ip {
            Some(ip) => ip,
            None => IpAddr::V4(first_external_ipv4()?),
        };
        Ok(Descriptor {
            agent_id: self.agent_id.clone(),
            application_name: self.application_name.clone(),
            hostname,
            ip: ip.to_string(),
            pid: std::process::id(),
            agent_version: env!("CARGO_PKG_VERSION").to_owned(),
            start_time_ms: self.start_time_ms,
            ports: self.ports.clone(),
            container: self.container,
        })
    }
}

/// First IPv4 address on an up, non-loopback interface, else loopback.
fn first_external_ipv4() -> anyhow::Result<Ipv4Addr> {
    for ifaddr in getifaddrs()? {
        if ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK)
            || !ifaddr.flags.contains(InterfaceFlags::IFF_UP)
        {
            continue;
        }
        if let Some(addr) = ifaddr.address.as_ref().and_then(|a| a.as_sockaddr_in()) {
            return Ok(addr.ip());
        }
    }
    Ok(Ipv4Addr::LOCALHOST)
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
