// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Node trust establishment: turn a list of candidate nodes into a mapping
//! of node address to trusted, responsive agent identity.

use futures::future;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::agents::AgentMap;
use crate::failure::{FailureReason, FailureSet};
use crate::node::NodeDescriptor;
use crate::settings::Settings;
use crate::transport::{AgentId, Transport};

/// Establish transport-level trust with every node in `nodes` that has not
/// already failed.
///
/// Three steps, each isolating per-node failures into `failures` so that one
/// bad node never aborts the batch:
///
/// 1. Provision an agent on each node (or adopt a pre-discovered node's own
///    name as its agent identity).
/// 2. Accept the agent keys of the nodes that provisioned cleanly.
/// 3. Block, within the configured wait budget, until the accepted agents
///    report in as responsive. Trust without liveness is not sufficient, so
///    an unresponsive agent fails its node even if the earlier steps
///    succeeded.
///
/// The returned map holds only the nodes that survived every step. Nothing
/// is persisted here; this stage is about transport-level trust, not
/// database state.
pub async fn establish_trust(
    transport: &dyn Transport,
    nodes: &[NodeDescriptor],
    failures: &mut FailureSet,
    settings: &Settings,
    cancel: &CancellationToken,
) -> AgentMap {
    let mut agents = AgentMap::new();

    if cancel.is_cancelled() {
        fail_remaining(nodes, failures);
        return agents;
    }

    // Provision agents concurrently; merge outcomes in node-list order so
    // the failure record is deterministic regardless of completion order.
    let pending = failures.surviving(nodes);
    let results = future::join_all(
        pending
            .iter()
            .map(|node| async move { (*node, provision_one(transport, node).await) }),
    )
    .await;

    for (node, result) in results {
        match result {
            Ok(agent) => {
                debug!("provisioned agent '{agent}' for node {node}");
                agents.insert(&node.management_addr, agent);
            }
            Err(reason) => {
                warn!("agent provisioning failed for {node}: {reason}");
                failures.record(node, reason);
            }
        }
    }

    if cancel.is_cancelled() {
        // Agents may already be provisioned on the remote side; surface
        // those nodes as failed rather than losing track of them.
        fail_remaining(nodes, failures);
        return AgentMap::new();
    }

    // Accept the keys of the agents that provisioned cleanly.
    let trusted = failures.surviving(nodes);
    let results = future::join_all(trusted.iter().map(|node| {
        let agent = agents.agent_for(&node.management_addr).cloned();
        async move {
            let reply = match &agent {
                Some(agent) => transport.accept_agent(agent).await,
                // Unreachable in practice; every surviving node was just
                // inserted above.
                None => Ok(()),
            };
            (*node, reply)
        }
    }))
    .await;

    for (node, result) in results {
        if let Err(e) = result {
            warn!("key acceptance failed for {node}: {e}");
            failures.record(node, e.into());
            agents.remove(&node.management_addr);
        }
    }

    if cancel.is_cancelled() {
        fail_remaining(nodes, failures);
        return AgentMap::new();
    }

    // Readiness barrier: wait (bounded) for the accepted agents to respond.
    let ids = agents.agent_ids();
    if ids.is_empty() {
        return agents;
    }
    let ready = transport.wait_until_ready(&ids, settings.ready_wait).await;
    debug!("agents ready: {ready:?}");

    for node in failures.surviving(nodes) {
        let responsive = agents
            .agent_for(&node.management_addr)
            .map(|agent| ready.contains(agent))
            .unwrap_or(false);
        if !responsive {
            warn!("agent for {node} did not become responsive within the wait budget");
            failures.record(node, FailureReason::ReadinessTimeout);
            agents.remove(&node.management_addr);
        }
    }

    agents
}

/// Provision a single node's agent, or adopt its name as agent identity for
/// the credential-less (pre-discovered) path.
async fn provision_one(
    transport: &dyn Transport,
    node: &NodeDescriptor,
) -> Result<AgentId, FailureReason> {
    match &node.ssh {
        Some(ssh) => {
            let fingerprint = transport
                .resolve_host_key_fingerprint(&node.management_addr)
                .await?;
            let agent = transport
                .provision_agent(&node.management_addr, &fingerprint, &ssh.username, &ssh.password)
                .await?;
            Ok(agent)
        }
        None => {
            debug!("pre-discovered node {node}: using its name as agent identity");
            Ok(node.node_name.clone())
        }
    }
}

/// Mark every node that has not failed yet as cancelled.
fn fail_remaining(nodes: &[NodeDescriptor], failures: &mut FailureSet) {
    for node in failures.surviving(nodes) {
        failures.record(node, FailureReason::Cancelled);
    }
}
