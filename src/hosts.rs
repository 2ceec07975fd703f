// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Turning trusted nodes into persisted Host records.

use log::{debug, error};

use crate::agents::AgentMap;
use crate::cluster::ClusterDescriptor;
use crate::failure::{FailureReason, FailureSet};
use crate::node::NodeDescriptor;
use crate::store::{HostRecord, Store};
use crate::transport::Transport;

/// Persist a Host record for every node that survived trust establishment.
///
/// The record's stable identifier is the machine id reported by the node's
/// now-trusted agent. `HostRecord` has no fields for the transport-only SSH
/// credentials, so nothing secret can reach the store. A validation failure
/// is a hard error for that node: logged, and the node moves to `failures`.
///
/// Whether or not persistence succeeded, any DiscoveredNode entry matching
/// the node's name is deleted afterwards -- a provisioning attempt has been
/// made, so the discovery state is superseded regardless of outcome. This
/// applies to every node in the original list, including ones that failed
/// in earlier stages.
pub async fn materialize_hosts(
    transport: &dyn Transport,
    store: &dyn Store,
    cluster: &ClusterDescriptor,
    nodes: &[NodeDescriptor],
    agents: &AgentMap,
    failures: &mut FailureSet,
) -> Vec<HostRecord> {
    let mut persisted = Vec::new();

    for node in nodes.iter() {
        if !failures.contains(&node.management_addr) {
            match persist_one(transport, store, cluster, node, agents).await {
                Ok(host) => persisted.push(host),
                Err(reason) => {
                    error!("host persistence failed for {node}: {reason}");
                    failures.record(node, reason);
                }
            }
        }

        // Clear any matching discovery entry. Errors here are not failures
        // of the node; the entry may simply never have existed.
        if let Err(e) = store.delete_discovered_node(&node.node_name).await {
            debug!("no discovered-node entry cleared for {node}: {e}");
        }
    }

    persisted
}

async fn persist_one(
    transport: &dyn Transport,
    store: &dyn Store,
    cluster: &ClusterDescriptor,
    node: &NodeDescriptor,
    agents: &AgentMap,
) -> Result<HostRecord, FailureReason> {
    let agent = agents
        .agent_for(&node.management_addr)
        .ok_or_else(|| FailureReason::TransportUnreachable("no trusted agent".to_string()))?;

    let node_id = transport.fetch_node_identifier(agent).await?;

    let host = HostRecord::new(node, node_id, cluster.id);
    store
        .create_host(&host)
        .await
        .map_err(|e| FailureReason::PersistenceInvalid(e.to_string()))?;

    debug!("persisted host {} ({})", host.node_name, host.node_id);
    Ok(host)
}
