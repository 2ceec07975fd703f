// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! The persistence adapter, consumed as a capability.
//!
//! Record storage lives behind this trait; the provisioning core only
//! decides what gets written and when.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::cluster::{ClusterDescriptor, ClusterStatus};
use crate::node::{NodeDescriptor, NodeRole, NodeStatus};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The record failed model validation before writing.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// A successfully provisioned node, ready to persist.
///
/// Built from a NodeDescriptor once its agent is trusted and responsive.
/// There are deliberately no fields for SSH credentials here; stripping them
/// before persistence is enforced by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRecord {
    /// Stable machine identifier reported by the node's trusted agent.
    pub node_id: String,
    pub node_name: String,
    pub management_addr: String,
    pub public_addr: String,
    pub cluster_addr: String,
    pub cluster_id: Uuid,
    pub role: NodeRole,
    pub status: NodeStatus,
}

impl HostRecord {
    pub fn new(node: &NodeDescriptor, node_id: String, cluster_id: Uuid) -> Self {
        HostRecord {
            node_id,
            node_name: node.node_name.clone(),
            management_addr: node.management_addr.clone(),
            public_addr: node.public_addr.clone(),
            cluster_addr: node.cluster_addr.clone(),
            cluster_id,
            role: node.role,
            status: NodeStatus::Inactive,
        }
    }
}

/// One block device discovered on a provisioned host.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageDeviceRecord {
    pub device_name: String,
    pub device_uuid: String,
    pub device_type: String,
    pub device_path: String,
    pub filesystem_type: String,
    pub mount_point: String,
    /// The owning host's stable node id.
    pub node_id: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_cluster(&self, cluster: &ClusterDescriptor) -> Result<(), StoreError>;

    async fn update_cluster_status(
        &self,
        cluster_id: Uuid,
        status: ClusterStatus,
    ) -> Result<(), StoreError>;

    async fn create_host(&self, host: &HostRecord) -> Result<(), StoreError>;

    async fn update_host_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> Result<(), StoreError>;

    async fn create_storage_device(&self, device: &StorageDeviceRecord) -> Result<(), StoreError>;

    /// Remove a previously-discovered node entry by name. Discovery state is
    /// transient and superseded once a provisioning attempt has been made.
    async fn delete_discovered_node(&self, node_name: &str) -> Result<(), StoreError>;
}
