// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Broadcasting cluster configuration to the trusted agents.

use log::{debug, warn};

use crate::agents::AgentMap;
use crate::cluster::ClusterDescriptor;
use crate::failure::{FailureReason, FailureSet};
use crate::node::NodeDescriptor;
use crate::settings::Settings;
use crate::transport::Transport;

/// Push the cluster descriptor to every currently-trusted agent.
///
/// This runs strictly against the surviving mapping from trust
/// establishment; a node that failed earlier is never offered
/// configuration. Each rejecting agent identity is resolved back through
/// the agent map to its owning node, which is then recorded as failed.
/// Trusted state for a rejecting node is not rolled back here.
pub async fn push_config(
    transport: &dyn Transport,
    cluster: &ClusterDescriptor,
    nodes: &[NodeDescriptor],
    agents: &AgentMap,
    failures: &mut FailureSet,
    settings: &Settings,
) {
    let ids = agents.agent_ids();
    if ids.is_empty() {
        return;
    }

    debug!("pushing config for {cluster} to {} agents", ids.len());

    let rejected = match transport
        .push_cluster_config(&ids, cluster, settings.config_push_timeout)
        .await
    {
        Ok(rejected) => rejected,
        Err(e) => {
            // The broadcast itself failed; nothing applied anywhere.
            warn!("config push failed for every agent: {e}");
            ids.into_iter().collect()
        }
    };

    if rejected.is_empty() {
        return;
    }
    debug!("config push rejected by agents: {rejected:?}");

    for agent in rejected.iter() {
        let Some(addr) = agents.addr_for(agent) else {
            warn!("config push reported unknown agent '{agent}'");
            continue;
        };
        if let Some(node) = nodes.iter().find(|n| n.management_addr == addr) {
            warn!("node {node} rejected cluster configuration");
            failures.record(node, FailureReason::ConfigRejected);
        }
    }
}
