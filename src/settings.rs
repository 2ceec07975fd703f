// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::time::Duration;

/// Tunables for a provisioning run. `Settings::new()` picks up the
/// environment overrides; tests construct their own values directly.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Wait budget for the agent readiness barrier.
    pub ready_wait: Duration,

    /// Timeout for broadcasting cluster configuration.
    pub config_push_timeout: Duration,
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            ready_wait: Duration::from_secs(crate::default_ready_wait_secs()),
            config_push_timeout: Duration::from_secs(crate::default_config_push_timeout_secs()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
