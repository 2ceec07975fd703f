// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! The remote-execution transport, consumed as a capability.
//!
//! The provisioning core never talks to nodes directly; it drives a resident
//! agent on each node through this trait. Key exchange, command dispatch,
//! and fact gathering are the transport's business, not specified here.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::cluster::ClusterDescriptor;

/// The transport's identity for a node's agent. Only meaningful for the
/// duration of a provisioning run.
pub type AgentId = String;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The node or its agent could not be contacted.
    #[error("could not reach {addr}: {reason}")]
    Unreachable { addr: String, reason: String },

    /// The node refused the credentials offered during provisioning.
    #[error("credentials rejected by {addr}: {reason}")]
    CredentialRejected { addr: String, reason: String },

    /// A remote operation was dispatched but did not complete.
    #[error("remote operation '{op}' failed: {reason}")]
    Operation { op: &'static str, reason: String },
}

/// Public and cluster-network addresses for a Ceph monitor candidate, keyed
/// by agent id in the bootstrap request.
#[derive(Debug, Clone, PartialEq)]
pub struct MonNetwork {
    pub public_addr: String,
    pub cluster_addr: String,
}

/// One block device reported by a node's agent.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFacts {
    pub name: String,
    pub uuid: String,
    pub kind: String,
    pub path: String,
    pub fs_type: String,
    pub mount_point: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the SSH host key fingerprint for a node, prior to provisioning
    /// its agent.
    async fn resolve_host_key_fingerprint(&self, addr: &str) -> Result<String, TransportError>;

    /// Install and configure an agent on the node over SSH, returning the
    /// transport's identity for it.
    async fn provision_agent(
        &self,
        addr: &str,
        fingerprint: &str,
        username: &str,
        password: &str,
    ) -> Result<AgentId, TransportError>;

    /// Accept the agent's key into the trust domain so the controller may
    /// issue it commands.
    async fn accept_agent(&self, agent: &AgentId) -> Result<(), TransportError>;

    /// Block until the given agents report in as responsive, or the wait
    /// budget expires. Returns the subset that became ready in time.
    async fn wait_until_ready(&self, agents: &[AgentId], budget: Duration) -> HashSet<AgentId>;

    /// The stable machine identifier reported by a trusted agent.
    async fn fetch_node_identifier(&self, agent: &AgentId) -> Result<String, TransportError>;

    /// Broadcast the cluster descriptor to the given agents. Returns the
    /// agents that rejected or failed to apply it.
    async fn push_cluster_config(
        &self,
        agents: &[AgentId],
        cluster: &ClusterDescriptor,
        timeout: Duration,
    ) -> Result<HashSet<AgentId>, TransportError>;

    /// Introduce `target_addr` to the trusted storage pool from
    /// `source_addr`'s vantage point. Success depends on reachability from
    /// the source, not the target.
    async fn peer_probe(
        &self,
        source_addr: &str,
        target_addr: &str,
    ) -> Result<bool, TransportError>;

    /// Form the initial Ceph monitor quorum across `members`. Returns
    /// whether the quorum formed; transport-level trouble is an error.
    async fn bootstrap_ceph_cluster(
        &self,
        cluster_name: &str,
        cluster_id: Uuid,
        members: &HashMap<AgentId, MonNetwork>,
    ) -> Result<bool, TransportError>;

    /// Add monitors to an existing quorum. Returns the agents that failed.
    async fn add_ceph_monitors(
        &self,
        cluster_name: &str,
        members: &HashMap<AgentId, String>,
    ) -> Result<HashSet<AgentId>, TransportError>;

    /// Create OSDs bound to the given device per agent. Returns the agents
    /// that failed.
    async fn add_ceph_osd(
        &self,
        cluster_name: &str,
        devices: &HashMap<AgentId, String>,
    ) -> Result<HashSet<AgentId>, TransportError>;

    /// Gather block-device inventory for all given agents in one query.
    async fn fetch_disk_inventory(
        &self,
        agents: &[AgentId],
    ) -> Result<HashMap<AgentId, Vec<DeviceFacts>>, TransportError>;
}
