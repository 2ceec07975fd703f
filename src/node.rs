// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

/// A candidate host for one provisioning run.
///
/// A NodeDescriptor only lives for the duration of the run; a node that
/// survives every provisioning stage is persisted as a `store::HostRecord`,
/// and the descriptor (credentials included) is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    /// Network identifier used to reach the node for management traffic.
    /// Unique within a run.
    pub management_addr: String,

    pub node_name: String,

    /// Present when the node must be provisioned over SSH. Absent for a
    /// pre-discovered node, whose agent is already resident.
    pub ssh: Option<SshCredentials>,

    pub public_addr: String,
    pub cluster_addr: String,

    pub role: NodeRole,
    pub status: NodeStatus,
}

impl NodeDescriptor {
    /// Whether this node participates in the Ceph monitor quorum.
    pub fn is_mon_candidate(&self) -> bool {
        matches!(self.role, NodeRole::Monitor | NodeRole::Mixed)
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.node_name, self.management_addr)
    }
}

/// SSH credentials used once, during trust establishment. These fields are
/// never persisted; `store::HostRecord` has no place to put them.
#[derive(Debug, Clone, PartialEq)]
pub struct SshCredentials {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub key_fingerprint: Option<String>,
}

impl SshCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        SshCredentials {
            username: username.to_string(),
            password: password.to_string(),
            port: 22,
            key_fingerprint: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Monitor,
    Osd,
    Mixed,
    Gluster,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                NodeRole::Monitor => "monitor",
                NodeRole::Osd => "osd",
                NodeRole::Mixed => "mixed",
                NodeRole::Gluster => "gluster",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Inactive,
    Active,
}
