// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! The top-level provisioning workflow.
//!
//! Each stage isolates its own per-node failures into the run's FailureSet;
//! the orchestrator's job is to thread the accumulated set through the
//! pipeline, skip failed nodes in later stages, and decide at the end
//! whether the attempt succeeded, succeeded degraded, or failed outright.

use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::agents::AgentMap;
use crate::cluster::{ClusterDescriptor, ClusterStatus, ClusterType};
use crate::config::Config;
use crate::disks::discover_disks;
use crate::error::ProvisionError;
use crate::failure::{FailureReason, FailureSet};
use crate::hosts::materialize_hosts;
use crate::node::{NodeDescriptor, NodeStatus};
use crate::push::push_config;
use crate::settings::Settings;
use crate::store::{HostRecord, Store};
use crate::topology::{ceph, gluster};
use crate::transport::Transport;
use crate::trust::establish_trust;

/// What a completed provisioning run produced.
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub cluster: ClusterDescriptor,

    /// The hosts that survived every stage, already marked active.
    pub hosts: Vec<HostRecord>,

    /// Every originally-requested node that dropped out, with its reason.
    /// Non-empty here means the cluster came up degraded.
    pub failed: FailureSet,

    /// Whether the batched disk inventory succeeded. A false value does not
    /// fail the cluster; it means no storage-device records exist yet.
    pub disks_discovered: bool,
}

/// Provision a cluster from scratch.
///
/// Persists the cluster record, establishes trust with every node, persists
/// the surviving hosts, pushes cluster configuration, builds the
/// cluster-type-specific topology, and discovers disks. Any subset of nodes
/// may fail along the way; the attempt only fails as a whole when no host
/// survives, when the Ceph monitor quorum cannot form, or when the run is
/// cancelled.
pub async fn create_cluster(
    transport: &dyn Transport,
    store: &dyn Store,
    config: &Config,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<ProvisionOutcome, ProvisionError> {
    let (mut cluster, nodes) = config.to_descriptors()?;
    info!("provisioning {cluster} with {} nodes", nodes.len());

    store.create_cluster(&cluster).await.map_err(|e| {
        error!("cluster record creation failed: {e}");
        ProvisionError::PersistenceInvalid(e.to_string())
    })?;

    let mut failures = FailureSet::new();

    let agents = establish_trust(transport, &nodes, &mut failures, settings, cancel).await;
    check_cancelled(cancel, &nodes, &mut failures)?;

    let hosts = materialize_hosts(transport, store, &cluster, &nodes, &agents, &mut failures).await;
    check_cancelled(cancel, &nodes, &mut failures)?;

    push_config(transport, &cluster, &nodes, &agents, &mut failures, settings).await;
    check_cancelled(cancel, &nodes, &mut failures)?;

    match cluster.kind {
        ClusterType::Gluster => {
            gluster::build(transport, &nodes, &mut failures).await;
        }
        ClusterType::Ceph => {
            if !ceph::bootstrap(transport, &cluster, &nodes, &agents, &failures).await {
                // The quorum either forms or the cluster does not exist;
                // there is no degraded outcome for bootstrap.
                return Err(ProvisionError::ClusterCreationFailed {
                    failed: failures,
                    reason: "monitor quorum formation failed".to_string(),
                });
            }
        }
    }
    check_cancelled(cancel, &nodes, &mut failures)?;

    let surviving_hosts: Vec<HostRecord> = hosts
        .into_iter()
        .filter(|h| !failures.contains(&h.management_addr))
        .collect();

    let disks_discovered = discover_disks(transport, store, &surviving_hosts, &agents).await;
    if !disks_discovered {
        warn!("disk discovery failed; no storage-device records were created");
    }

    if surviving_hosts.is_empty() {
        return Err(ProvisionError::ClusterCreationFailed {
            failed: failures,
            reason: "no hosts could be provisioned".to_string(),
        });
    }

    let mut active_hosts = Vec::new();
    for mut host in surviving_hosts {
        store
            .update_host_status(&host.node_id, NodeStatus::Active)
            .await
            .map_err(|e| ProvisionError::PersistenceInvalid(e.to_string()))?;
        host.status = NodeStatus::Active;
        active_hosts.push(host);
    }

    store
        .update_cluster_status(cluster.id, ClusterStatus::ActiveAndAvailable)
        .await
        .map_err(|e| ProvisionError::PersistenceInvalid(e.to_string()))?;
    cluster.status = ClusterStatus::ActiveAndAvailable;

    if failures.is_empty() {
        info!("{cluster} provisioned with {} hosts", active_hosts.len());
    } else {
        warn!(
            "{cluster} provisioned degraded: {} of {} nodes failed ({failures})",
            failures.len(),
            nodes.len(),
        );
    }

    Ok(ProvisionOutcome {
        cluster,
        hosts: active_hosts,
        failed: failures,
        disks_discovered,
    })
}

/// Add one node to an existing cluster.
///
/// Runs the same trust / persist / config stages as cluster creation for
/// the single node, then joins it to the topology: a Gluster node is
/// peer-probed with the retry-across-members policy, and a monitor-capable
/// Ceph node is added to the quorum.
pub async fn add_host(
    transport: &dyn Transport,
    store: &dyn Store,
    cluster: &ClusterDescriptor,
    pool_members: &[String],
    node: NodeDescriptor,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<HostRecord, ProvisionError> {
    let nodes = vec![node];
    let mut failures = FailureSet::new();

    let agents = establish_trust(transport, &nodes, &mut failures, settings, cancel).await;
    if !failures.is_empty() {
        return Err(addition_failed(failures, "trust establishment failed"));
    }

    let hosts = materialize_hosts(transport, store, cluster, &nodes, &agents, &mut failures).await;
    if !failures.is_empty() {
        return Err(addition_failed(failures, "host persistence failed"));
    }

    push_config(transport, cluster, &nodes, &agents, &mut failures, settings).await;
    if !failures.is_empty() {
        return Err(addition_failed(failures, "configuration rejected"));
    }

    let node = &nodes[0];
    match cluster.kind {
        ClusterType::Gluster => {
            if !gluster::add_node(transport, pool_members, &node.management_addr).await {
                failures.record(
                    node,
                    FailureReason::TopologyOperationFailed(
                        "peer probe failed from every pool member".to_string(),
                    ),
                );
                return Err(addition_failed(failures, "peer probe failed"));
            }
        }
        ClusterType::Ceph => {
            if node.is_mon_candidate() {
                ceph::add_monitors(transport, cluster, &nodes, &agents, &mut failures).await;
                if !failures.is_empty() {
                    return Err(addition_failed(failures, "monitor addition failed"));
                }
            }
        }
    }

    let mut host = hosts
        .into_iter()
        .next()
        .expect("a surviving node has a persisted host record");
    store
        .update_host_status(&host.node_id, NodeStatus::Active)
        .await
        .map_err(|e| ProvisionError::PersistenceInvalid(e.to_string()))?;
    host.status = NodeStatus::Active;

    info!("host {} added to {cluster}", host.node_name);
    Ok(host)
}

/// Discover the disks of already-provisioned hosts. Thin wrapper kept on
/// the orchestrator so callers drive every stage through one module.
pub async fn discover_host_disks(
    transport: &dyn Transport,
    store: &dyn Store,
    hosts: &[HostRecord],
    agents: &AgentMap,
) -> bool {
    discover_disks(transport, store, hosts, agents).await
}

fn addition_failed(failed: FailureSet, reason: &str) -> ProvisionError {
    ProvisionError::HostAdditionFailed {
        failed,
        reason: reason.to_string(),
    }
}

fn check_cancelled(
    cancel: &CancellationToken,
    nodes: &[NodeDescriptor],
    failures: &mut FailureSet,
) -> Result<(), ProvisionError> {
    if !cancel.is_cancelled() {
        return Ok(());
    }
    // Nodes already trusted or persisted must be surfaced as failed, not
    // silently lost, so the caller can clean up transport-side state.
    for node in failures.surviving(nodes) {
        failures.record(node, FailureReason::Cancelled);
    }
    Err(ProvisionError::ClusterCreationFailed {
        failed: failures.clone(),
        reason: "provisioning run cancelled".to_string(),
    })
}
