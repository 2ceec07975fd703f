// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::node::NodeDescriptor;
use crate::transport::TransportError;

/// Why a node dropped out of the provisioning run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FailureReason {
    /// The node or its agent could not be contacted.
    #[error("transport unreachable: {0}")]
    TransportUnreachable(String),

    /// SSH or trust-acceptance failure.
    #[error("credentials rejected: {0}")]
    CredentialRejected(String),

    /// The agent never became responsive within the wait budget.
    #[error("agent not responsive within the wait budget")]
    ReadinessTimeout,

    /// A trusted node rejected the cluster configuration. Already-trusted
    /// state is not rolled back here; that is left to the caller.
    #[error("cluster configuration rejected")]
    ConfigRejected,

    /// Peer-probe, monitor-add, or OSD-add failure for this node.
    #[error("topology operation failed: {0}")]
    TopologyOperationFailed(String),

    /// The node's record failed validation before writing.
    #[error("record failed validation: {0}")]
    PersistenceInvalid(String),

    /// The run was cancelled before this node finished provisioning.
    #[error("provisioning run cancelled")]
    Cancelled,
}

impl From<TransportError> for FailureReason {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::CredentialRejected { .. } => {
                FailureReason::CredentialRejected(e.to_string())
            }
            _ => FailureReason::TransportUnreachable(e.to_string()),
        }
    }
}

/// One entry in the accumulated failure record.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedNode {
    pub node: NodeDescriptor,
    pub reason: FailureReason,
}

/// The ordered record of nodes that did not complete provisioning.
///
/// The set is owned by the orchestrator and appended to by every stage it
/// is passed into. A node present here is excluded from all later stages.
/// First failure wins: recording a second failure for the same management
/// address is dropped, so a node appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureSet {
    entries: Vec<FailedNode>,
}

impl FailureSet {
    pub fn new() -> Self {
        FailureSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, management_addr: &str) -> bool {
        self.entries
            .iter()
            .any(|f| f.node.management_addr == management_addr)
    }

    /// Record a failure for `node`. A node already in the set keeps its
    /// original reason.
    pub fn record(&mut self, node: &NodeDescriptor, reason: FailureReason) {
        if self.contains(&node.management_addr) {
            debug!("node {node} already recorded as failed; keeping first reason");
            return;
        }
        self.entries.push(FailedNode {
            node: node.clone(),
            reason,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailedNode> {
        self.entries.iter()
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.entries.iter().map(|f| f.node.node_name.as_str()).collect()
    }

    /// The nodes from `nodes` that have not failed, in their original order.
    pub fn surviving<'a>(&self, nodes: &'a [NodeDescriptor]) -> Vec<&'a NodeDescriptor> {
        nodes
            .iter()
            .filter(|n| !self.contains(&n.management_addr))
            .collect()
    }
}

impl fmt::Display for FailureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "(none)");
        }
        for (i, failed) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failed.node.node_name, failed.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeRole, NodeStatus};

    fn node(addr: &str, name: &str) -> NodeDescriptor {
        NodeDescriptor {
            management_addr: addr.to_string(),
            node_name: name.to_string(),
            ssh: None,
            public_addr: addr.to_string(),
            cluster_addr: addr.to_string(),
            role: NodeRole::Gluster,
            status: NodeStatus::Inactive,
        }
    }

    #[test]
    fn first_failure_wins() {
        let mut failures = FailureSet::new();
        let a = node("10.0.0.1", "a");
        failures.record(&a, FailureReason::ReadinessTimeout);
        failures.record(&a, FailureReason::ConfigRejected);
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures.iter().next().unwrap().reason,
            FailureReason::ReadinessTimeout
        );
    }

    #[test]
    fn surviving_preserves_order() {
        let nodes = vec![node("1", "a"), node("2", "b"), node("3", "c")];
        let mut failures = FailureSet::new();
        failures.record(&nodes[1], FailureReason::ReadinessTimeout);
        let surviving = failures.surviving(&nodes);
        assert_eq!(
            surviving.iter().map(|n| n.node_name.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[test]
    fn display_lists_names_and_reasons() {
        let mut failures = FailureSet::new();
        failures.record(&node("1", "a"), FailureReason::ConfigRejected);
        assert_eq!(
            failures.to_string(),
            "a: cluster configuration rejected"
        );
        assert_eq!(FailureSet::new().to_string(), "(none)");
    }
}
