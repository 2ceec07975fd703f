// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Gluster topology: peer-probing nodes into a trusted storage pool.

use log::{error, warn};
use rand::seq::SliceRandom;

use crate::failure::{FailureReason, FailureSet};
use crate::node::NodeDescriptor;
use crate::transport::Transport;

/// Build a pool from scratch: the first surviving node is the peering root,
/// and every other surviving node is probed from it.
///
/// A failed probe fails that node -- a pool cannot include an unreachable
/// peer, so this is logged at error severity -- but the remaining nodes are
/// still probed. Unlike [`add_node`], there is no fallback to an alternate
/// probe source here: the pool is being formed, and the root is the only
/// member a probe could come from.
pub async fn build(
    transport: &dyn Transport,
    nodes: &[NodeDescriptor],
    failures: &mut FailureSet,
) {
    let surviving = failures.surviving(nodes);
    let Some((root, rest)) = surviving.split_first() else {
        return;
    };

    for node in rest {
        let probed = transport
            .peer_probe(&root.management_addr, &node.management_addr)
            .await;
        match probed {
            Ok(true) => {}
            Ok(false) => {
                error!("peer probe from {root} to {node} failed");
                failures.record(
                    node,
                    FailureReason::TopologyOperationFailed("peer probe failed".to_string()),
                );
            }
            Err(e) => {
                error!("peer probe from {root} to {node} failed: {e}");
                failures.record(node, FailureReason::TopologyOperationFailed(e.to_string()));
            }
        }
    }
}

/// The retry policy for introducing a node to an existing pool: probe
/// sources are tried in random order until one succeeds or all are
/// exhausted.
///
/// Probe success depends on network reachability from the prober's vantage
/// point, not the target's, so retrying from a different source recovers
/// from asymmetric partitions.
#[derive(Debug)]
pub struct ProbeSourcePolicy {
    sources: Vec<String>,
}

impl ProbeSourcePolicy {
    pub fn shuffled(members: &[String]) -> Self {
        let mut sources = members.to_vec();
        sources.shuffle(&mut rand::thread_rng());
        ProbeSourcePolicy { sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.as_str())
    }
}

/// Add a single node to an existing pool, retrying the probe across the
/// pool members per [`ProbeSourcePolicy`]. An empty pool trivially
/// succeeds: the node forms a pool of one.
pub async fn add_node(
    transport: &dyn Transport,
    pool_members: &[String],
    new_addr: &str,
) -> bool {
    let policy = ProbeSourcePolicy::shuffled(pool_members);

    for source in policy.sources() {
        match transport.peer_probe(source, new_addr).await {
            Ok(true) => return true,
            Ok(false) => {
                warn!("peer probe from {source} to {new_addr} failed; trying another member");
            }
            Err(e) => {
                warn!("peer probe from {source} to {new_addr} failed: {e}; trying another member");
            }
        }
    }

    pool_members.is_empty()
}
