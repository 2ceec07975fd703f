// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod agents;
pub mod cluster;
pub mod config;
pub mod disks;
pub mod error;
pub mod failure;
pub mod hosts;
pub mod node;
pub mod provision;
pub mod push;
pub mod settings;
pub mod store;
pub mod test_env;
pub mod topology;
pub mod transport;
pub mod trust;

/// Gets the wait budget, in seconds, for the agent readiness barrier.
///
/// Trust establishment blocks for at most this long waiting for accepted
/// agents to report in as responsive.
pub fn default_ready_wait_secs() -> u64 {
    match std::env::var("CORRAL_READY_WAIT") {
        Ok(secs) => secs
            .parse::<u64>()
            .expect("CORRAL_READY_WAIT must be a number of seconds"),
        Err(_) => 3,
    }
}

/// Gets the timeout, in seconds, for broadcasting cluster configuration to
/// the trusted agents.
pub fn default_config_push_timeout_secs() -> u64 {
    match std::env::var("CORRAL_CONFIG_PUSH_TIMEOUT") {
        Ok(secs) => secs
            .parse::<u64>()
            .expect("CORRAL_CONFIG_PUSH_TIMEOUT must be a number of seconds"),
        Err(_) => 15,
    }
}

pub fn default_config_path() -> String {
    match std::env::var("CORRAL_CONFIG") {
        Ok(conf) => conf,
        Err(_) => "/etc/corral/corral.conf".to_string(),
    }
}
