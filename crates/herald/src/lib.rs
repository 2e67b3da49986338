// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Herald: reports an agent's identity descriptor to a collector and keeps
//! it fresh with a low-frequency heartbeat.

pub mod attempt;
pub mod config;
pub mod descriptor;
pub mod outcome;
pub mod policy;
pub mod reporter;
pub mod scheduler;
pub mod test_support;
pub mod transport;

pub use reporter::Reporter;

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
