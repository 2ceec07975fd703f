// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterDescriptor, ClusterType, StorageType};
use crate::error::ProvisionError;
use crate::node::{NodeDescriptor, NodeRole, NodeStatus, SshCredentials};

/// Config, along with its children ClusterConfig and NodeConfig, is the
/// model for a provisioning request used in the corral configuration file.
/// The config file is deserialized into a Config object.
///
/// The model used in the config file is intentionally different from the
/// model used to drive the provisioning run in memory. Since they are
/// decoupled, the run model can be changed without needing to change the
/// configuration file format.
#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ClusterConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub storage_type: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NodeConfig {
    pub management_addr: String,
    pub node_name: String,
    #[serde(default)]
    pub public_addr: Option<String>,
    #[serde(default)]
    pub cluster_addr: Option<String>,
    pub role: String,

    pub ssh_username: Option<String>,
    pub ssh_password: Option<String>,
    pub ssh_port: Option<u16>,
    pub ssh_key_fingerprint: Option<String>,
}

impl Config {
    pub fn from_path(path: &str) -> Result<Self, ProvisionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProvisionError::InvalidConfig(format!("could not read '{path}': {e}")))?;
        toml::from_str(&text)
            .map_err(|e| ProvisionError::InvalidConfig(format!("could not parse '{path}': {e}")))
    }

    /// Convert the declarative config into the run model: a cluster
    /// descriptor with a freshly minted id, plus the ordered node list.
    pub fn to_descriptors(
        &self,
    ) -> Result<(ClusterDescriptor, Vec<NodeDescriptor>), ProvisionError> {
        let kind = match self.cluster.kind.as_str() {
            "gluster" => ClusterType::Gluster,
            "ceph" => ClusterType::Ceph,
            other => {
                return Err(ProvisionError::InvalidConfig(format!(
                    "unknown cluster type '{other}'"
                )))
            }
        };
        let storage = match self.cluster.storage_type.as_str() {
            "block" => StorageType::Block,
            "file" => StorageType::File,
            "object" => StorageType::Object,
            other => {
                return Err(ProvisionError::InvalidConfig(format!(
                    "unknown storage type '{other}'"
                )))
            }
        };

        if self.nodes.is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "node list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for node in self.nodes.iter() {
            if !seen.insert(node.management_addr.clone()) {
                return Err(ProvisionError::InvalidConfig(format!(
                    "duplicate management address '{}'",
                    node.management_addr
                )));
            }
            nodes.push(node.to_descriptor(kind)?);
        }

        if kind == ClusterType::Ceph && !nodes.iter().any(|n| n.is_mon_candidate()) {
            return Err(ProvisionError::InvalidConfig(
                "a ceph cluster needs at least one monitor-capable node".to_string(),
            ));
        }

        Ok((
            ClusterDescriptor::new(&self.cluster.name, kind, storage),
            nodes,
        ))
    }
}

impl NodeConfig {
    fn to_descriptor(&self, cluster_kind: ClusterType) -> Result<NodeDescriptor, ProvisionError> {
        let role = match self.role.as_str() {
            "monitor" => NodeRole::Monitor,
            "osd" => NodeRole::Osd,
            "mixed" => NodeRole::Mixed,
            "gluster" => NodeRole::Gluster,
            other => {
                return Err(ProvisionError::InvalidConfig(format!(
                    "unknown node role '{other}' for node '{}'",
                    self.node_name
                )))
            }
        };

        if cluster_kind == ClusterType::Gluster && role != NodeRole::Gluster {
            return Err(ProvisionError::InvalidConfig(format!(
                "node '{}' has role '{role}' in a gluster cluster",
                self.node_name
            )));
        }

        // SSH credentials come as a pair; a username without a password (or
        // the reverse) is a config mistake, not a pre-discovered node.
        let ssh = match (&self.ssh_username, &self.ssh_password) {
            (Some(username), Some(password)) => Some(SshCredentials {
                username: username.clone(),
                password: password.clone(),
                port: self.ssh_port.unwrap_or(22),
                key_fingerprint: self.ssh_key_fingerprint.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(ProvisionError::InvalidConfig(format!(
                    "node '{}' has incomplete ssh credentials",
                    self.node_name
                )))
            }
        };

        Ok(NodeDescriptor {
            management_addr: self.management_addr.clone(),
            node_name: self.node_name.clone(),
            ssh,
            public_addr: self
                .public_addr
                .clone()
                .unwrap_or_else(|| self.management_addr.clone()),
            cluster_addr: self
                .cluster_addr
                .clone()
                .unwrap_or_else(|| self.management_addr.clone()),
            role,
            status: NodeStatus::Inactive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gluster_config(nodes: Vec<NodeConfig>) -> Config {
        Config {
            cluster: ClusterConfig {
                name: "vault".to_string(),
                kind: "gluster".to_string(),
                storage_type: "file".to_string(),
            },
            nodes,
        }
    }

    fn node(addr: &str, name: &str) -> NodeConfig {
        NodeConfig {
            management_addr: addr.to_string(),
            node_name: name.to_string(),
            public_addr: None,
            cluster_addr: None,
            role: "gluster".to_string(),
            ssh_username: Some("root".to_string()),
            ssh_password: Some("secret".to_string()),
            ssh_port: None,
            ssh_key_fingerprint: None,
        }
    }

    #[test]
    fn descriptor_conversion() {
        let config = gluster_config(vec![node("10.0.0.1", "gl00"), node("10.0.0.2", "gl01")]);
        let (cluster, nodes) = config.to_descriptors().unwrap();
        assert_eq!(cluster.kind, ClusterType::Gluster);
        assert_eq!(cluster.status, crate::cluster::ClusterStatus::Inactive);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].public_addr, "10.0.0.1");
        assert_eq!(nodes[0].ssh.as_ref().unwrap().port, 22);
    }

    #[test]
    fn duplicate_management_addr_rejected() {
        let config = gluster_config(vec![node("10.0.0.1", "gl00"), node("10.0.0.1", "gl01")]);
        assert!(matches!(
            config.to_descriptors(),
            Err(ProvisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn incomplete_ssh_credentials_rejected() {
        let mut half = node("10.0.0.1", "gl00");
        half.ssh_password = None;
        let config = gluster_config(vec![half]);
        assert!(matches!(
            config.to_descriptors(),
            Err(ProvisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn ceph_requires_monitor_candidate() {
        let mut osd_only = node("10.0.0.1", "osd00");
        osd_only.role = "osd".to_string();
        let config = Config {
            cluster: ClusterConfig {
                name: "reef".to_string(),
                kind: "ceph".to_string(),
                storage_type: "block".to_string(),
            },
            nodes: vec![osd_only],
        };
        assert!(matches!(
            config.to_descriptors(),
            Err(ProvisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fresh_cluster_ids_per_attempt() {
        let config = gluster_config(vec![node("10.0.0.1", "gl00")]);
        let (first, _) = config.to_descriptors().unwrap();
        let (second, _) = config.to_descriptors().unwrap();
        assert_ne!(first.id, second.id);
    }
}
