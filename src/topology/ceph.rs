// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Ceph topology: monitor quorum bootstrap, incremental monitor addition,
//! and per-device OSD creation.

use std::collections::HashMap;

use log::{debug, error, warn};

use crate::agents::AgentMap;
use crate::cluster::ClusterDescriptor;
use crate::failure::{FailureReason, FailureSet};
use crate::node::NodeDescriptor;
use crate::store::HostRecord;
use crate::transport::{MonNetwork, Transport};

/// Form the initial monitor quorum across every surviving node whose role
/// is not OSD-only.
///
/// This stage is indivisible: it either fully succeeds or the caller must
/// treat the whole cluster as unformed. A transport error is caught, logged,
/// and reported as overall failure; no partial-monitor accounting is
/// attempted.
pub async fn bootstrap(
    transport: &dyn Transport,
    cluster: &ClusterDescriptor,
    nodes: &[NodeDescriptor],
    agents: &AgentMap,
    failures: &FailureSet,
) -> bool {
    let mut members = HashMap::new();
    for node in failures.surviving(nodes) {
        if !node.is_mon_candidate() {
            continue;
        }
        if let Some(agent) = agents.agent_for(&node.management_addr) {
            members.insert(
                agent.clone(),
                MonNetwork {
                    public_addr: node.public_addr.clone(),
                    cluster_addr: node.cluster_addr.clone(),
                },
            );
        }
    }

    if members.is_empty() {
        return true;
    }

    debug!("bootstrapping {cluster} with monitors {:?}", members.keys());

    match transport
        .bootstrap_ceph_cluster(&cluster.name, cluster.id, &members)
        .await
    {
        Ok(formed) => formed,
        Err(e) => {
            error!("ceph cluster bootstrap failed for {cluster}: {e}");
            false
        }
    }
}

/// Add each surviving node to an existing quorum as a monitor, one request
/// per node. One node's failure never stops the remaining nodes.
pub async fn add_monitors(
    transport: &dyn Transport,
    cluster: &ClusterDescriptor,
    nodes: &[NodeDescriptor],
    agents: &AgentMap,
    failures: &mut FailureSet,
) {
    for node in failures.surviving(nodes) {
        // A batched reply may have named this node while an earlier node in
        // the list was being processed.
        if failures.contains(&node.management_addr) {
            continue;
        }
        let Some(agent) = agents.agent_for(&node.management_addr).cloned() else {
            continue;
        };
        let member = HashMap::from([(agent, node.public_addr.clone())]);

        match transport.add_ceph_monitors(&cluster.name, &member).await {
            Ok(failed) => {
                for agent in failed.iter() {
                    let Some(addr) = agents.addr_for(agent) else {
                        continue;
                    };
                    if let Some(node) = nodes.iter().find(|n| n.management_addr == addr) {
                        warn!("monitor addition failed for {node}");
                        failures.record(
                            node,
                            FailureReason::TopologyOperationFailed(
                                "monitor addition failed".to_string(),
                            ),
                        );
                    }
                }
            }
            Err(e) => {
                warn!("monitor addition failed for {node}: {e}");
                failures.record(node, FailureReason::TopologyOperationFailed(e.to_string()));
            }
        }
    }
}

/// Create one OSD bound to `device` on `host`.
///
/// Always per-node-per-device, never batched: device assignment is node
/// specific and a failure must be attributable to an exact (node, device)
/// pair. Both failure channels -- the transport reporting the agent as
/// failed, and a transport exception -- converge to returning the host as
/// the single failed entry.
pub async fn add_osd(
    transport: &dyn Transport,
    cluster_name: &str,
    host: &HostRecord,
    device: &str,
    agents: &AgentMap,
) -> Vec<HostRecord> {
    let Some(agent) = agents.agent_for(&host.management_addr).cloned() else {
        warn!("no trusted agent for host {}", host.node_name);
        return vec![host.clone()];
    };

    let request = HashMap::from([(agent.clone(), device.to_string())]);

    match transport.add_ceph_osd(cluster_name, &request).await {
        Ok(failed) => {
            if failed.contains(&agent) {
                warn!(
                    "osd creation failed for device '{device}' on host {}",
                    host.node_name
                );
                vec![host.clone()]
            } else {
                Vec::new()
            }
        }
        Err(e) => {
            warn!(
                "osd creation failed for device '{device}' on host {}: {e}",
                host.node_name
            );
            vec![host.clone()]
        }
    }
}
