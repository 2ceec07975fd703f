// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fmt;

use uuid::Uuid;

/// Identity and policy for the cluster being provisioned.
///
/// The id is minted once, when the descriptor is created, and is stable for
/// the lifetime of the provisioning attempt. Every node-facing operation
/// that references the cluster (config push, topology build) happens after
/// the id is assigned, so all nodes agree on the cluster's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterDescriptor {
    pub id: Uuid,
    pub name: String,
    pub kind: ClusterType,
    pub storage: StorageType,
    pub status: ClusterStatus,
}

impl ClusterDescriptor {
    pub fn new(name: &str, kind: ClusterType, storage: StorageType) -> Self {
        ClusterDescriptor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            storage,
            status: ClusterStatus::Inactive,
        }
    }
}

impl fmt::Display for ClusterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cluster '{}' ({})", self.kind, self.name, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterType {
    Gluster,
    Ceph,
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ClusterType::Gluster => "gluster",
                ClusterType::Ceph => "ceph",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Block,
    File,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterStatus {
    Inactive,
    ActiveNotAvailable,
    ActiveAndAvailable,
}
