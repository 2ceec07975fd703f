// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Test doubles for the external collaborators.
//!
//! The provisioning core only ever sees the `Transport` and `Store` traits,
//! so tests drive it with an in-memory transport whose per-node behavior is
//! scripted up front, and an in-memory store whose contents the test can
//! inspect afterwards. All scripting and inspection should go through the
//! methods here rather than be coded in the tests themselves.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::cluster::{ClusterDescriptor, ClusterStatus};
use crate::config::{ClusterConfig, Config, NodeConfig};
use crate::node::NodeStatus;
use crate::store::{HostRecord, StorageDeviceRecord, Store, StoreError};
use crate::transport::{AgentId, DeviceFacts, MonNetwork, Transport, TransportError};

/// The agent identity the scripted transport mints for an SSH-provisioned
/// node at `addr`. Pre-discovered nodes use their name instead, which the
/// trust establisher arranges on its own.
pub fn agent_for_addr(addr: &str) -> AgentId {
    format!("agent-{addr}")
}

/// Per-node behavior overrides for the scripted transport. Everything an
/// empty script touches succeeds.
#[derive(Debug, Default)]
pub struct TransportScript {
    /// Management addresses whose host key cannot be fetched.
    pub unreachable: HashSet<String>,

    /// Management addresses that refuse the offered SSH credentials.
    pub bad_credentials: HashSet<String>,

    /// Agent ids whose key acceptance fails.
    pub accept_failures: HashSet<String>,

    /// Agent ids that never report in at the readiness barrier.
    pub unresponsive: HashSet<String>,

    /// Agent ids that reject the cluster configuration.
    pub config_rejecting: HashSet<String>,

    /// (source, target) address pairs for which a peer probe fails.
    pub blocked_probes: HashSet<(String, String)>,

    /// When set, ceph bootstrap raises a transport error with this text.
    pub bootstrap_error: Option<String>,

    /// When bootstrap completes without error, whether the quorum formed.
    pub bootstrap_formed: bool,

    /// Agent ids reported as failed by monitor addition.
    pub monitor_failures: HashSet<String>,

    /// Agent ids reported as failed by OSD creation.
    pub osd_failures: HashSet<String>,

    /// When set, OSD creation raises a transport error with this text.
    pub osd_error: Option<String>,

    /// Device facts returned per agent id. Agents without an entry report
    /// an empty device list.
    pub inventory: HashMap<String, Vec<DeviceFacts>>,

    /// Agent ids omitted from the batched inventory response entirely,
    /// making the response malformed from the caller's point of view.
    pub omit_from_inventory: HashSet<String>,

    /// When set, the batched inventory query raises a transport error.
    pub inventory_error: Option<String>,
}

/// An in-memory `Transport` whose behavior is scripted per node, recording
/// every remote operation it is asked to perform.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<TransportScript>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport {
            script: Mutex::new(TransportScript {
                bootstrap_formed: true,
                ..TransportScript::default()
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mutable access to the behavior script.
    pub fn script(&self) -> MutexGuard<'_, TransportScript> {
        self.script.lock().unwrap()
    }

    /// Every remote operation performed so far, in dispatch order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn resolve_host_key_fingerprint(&self, addr: &str) -> Result<String, TransportError> {
        self.record(format!("fingerprint {addr}"));
        if self.script().unreachable.contains(addr) {
            return Err(TransportError::Unreachable {
                addr: addr.to_string(),
                reason: "no route to host".to_string(),
            });
        }
        Ok(format!("SHA256:{addr}"))
    }

    async fn provision_agent(
        &self,
        addr: &str,
        _fingerprint: &str,
        _username: &str,
        _password: &str,
    ) -> Result<AgentId, TransportError> {
        self.record(format!("provision {addr}"));
        if self.script().bad_credentials.contains(addr) {
            return Err(TransportError::CredentialRejected {
                addr: addr.to_string(),
                reason: "authentication failed".to_string(),
            });
        }
        Ok(agent_for_addr(addr))
    }

    async fn accept_agent(&self, agent: &AgentId) -> Result<(), TransportError> {
        self.record(format!("accept {agent}"));
        if self.script().accept_failures.contains(agent) {
            return Err(TransportError::CredentialRejected {
                addr: agent.clone(),
                reason: "key acceptance refused".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_until_ready(&self, agents: &[AgentId], _budget: Duration) -> HashSet<AgentId> {
        self.record(format!("wait_ready {}", agents.len()));
        let script = self.script();
        agents
            .iter()
            .filter(|a| !script.unresponsive.contains(*a))
            .cloned()
            .collect()
    }

    async fn fetch_node_identifier(&self, agent: &AgentId) -> Result<String, TransportError> {
        self.record(format!("machine_id {agent}"));
        Ok(format!("id-{agent}"))
    }

    async fn push_cluster_config(
        &self,
        agents: &[AgentId],
        _cluster: &ClusterDescriptor,
        _timeout: Duration,
    ) -> Result<HashSet<AgentId>, TransportError> {
        self.record(format!("push_config {}", agents.len()));
        let script = self.script();
        Ok(agents
            .iter()
            .filter(|a| script.config_rejecting.contains(*a))
            .cloned()
            .collect())
    }

    async fn peer_probe(
        &self,
        source_addr: &str,
        target_addr: &str,
    ) -> Result<bool, TransportError> {
        self.record(format!("probe {source_addr}->{target_addr}"));
        let blocked = self
            .script()
            .blocked_probes
            .contains(&(source_addr.to_string(), target_addr.to_string()));
        Ok(!blocked)
    }

    async fn bootstrap_ceph_cluster(
        &self,
        cluster_name: &str,
        _cluster_id: Uuid,
        members: &HashMap<AgentId, MonNetwork>,
    ) -> Result<bool, TransportError> {
        self.record(format!("bootstrap {cluster_name} mons={}", members.len()));
        let script = self.script();
        if let Some(reason) = &script.bootstrap_error {
            return Err(TransportError::Operation {
                op: "bootstrap_ceph_cluster",
                reason: reason.clone(),
            });
        }
        Ok(script.bootstrap_formed)
    }

    async fn add_ceph_monitors(
        &self,
        cluster_name: &str,
        members: &HashMap<AgentId, String>,
    ) -> Result<HashSet<AgentId>, TransportError> {
        self.record(format!("add_mons {cluster_name} n={}", members.len()));
        let script = self.script();
        Ok(members
            .keys()
            .filter(|a| script.monitor_failures.contains(*a))
            .cloned()
            .collect())
    }

    async fn add_ceph_osd(
        &self,
        cluster_name: &str,
        devices: &HashMap<AgentId, String>,
    ) -> Result<HashSet<AgentId>, TransportError> {
        self.record(format!("add_osd {cluster_name} n={}", devices.len()));
        let script = self.script();
        if let Some(reason) = &script.osd_error {
            return Err(TransportError::Operation {
                op: "add_ceph_osd",
                reason: reason.clone(),
            });
        }
        Ok(devices
            .keys()
            .filter(|a| script.osd_failures.contains(*a))
            .cloned()
            .collect())
    }

    async fn fetch_disk_inventory(
        &self,
        agents: &[AgentId],
    ) -> Result<HashMap<AgentId, Vec<DeviceFacts>>, TransportError> {
        self.record(format!("inventory {}", agents.len()));
        let script = self.script();
        if let Some(reason) = &script.inventory_error {
            return Err(TransportError::Operation {
                op: "fetch_disk_inventory",
                reason: reason.clone(),
            });
        }
        Ok(agents
            .iter()
            .filter(|a| !script.omit_from_inventory.contains(*a))
            .map(|a| (a.clone(), script.inventory.get(a).cloned().unwrap_or_default()))
            .collect())
    }
}

/// The records an in-memory store has accumulated.
#[derive(Debug, Default)]
pub struct StoreState {
    pub clusters: Vec<ClusterDescriptor>,
    pub hosts: Vec<HostRecord>,
    pub devices: Vec<StorageDeviceRecord>,

    /// Names of not-yet-claimed discovered nodes.
    pub discovered: HashSet<String>,

    /// Node names whose host record fails validation on write.
    pub invalid_hosts: HashSet<String>,

    /// When set, every storage-device write fails validation.
    pub device_writes_fail: bool,
}

/// An in-memory `Store` for tests.
#[derive(Debug, Default)]
pub struct MemStore {
    state: Mutex<StoreState>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }

    pub fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_cluster(&self, cluster: &ClusterDescriptor) -> Result<(), StoreError> {
        self.state().clusters.push(cluster.clone());
        Ok(())
    }

    async fn update_cluster_status(
        &self,
        cluster_id: Uuid,
        status: ClusterStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let cluster = state
            .clusters
            .iter_mut()
            .find(|c| c.id == cluster_id)
            .ok_or_else(|| StoreError::NotFound(format!("cluster {cluster_id}")))?;
        cluster.status = status;
        Ok(())
    }

    async fn create_host(&self, host: &HostRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.invalid_hosts.contains(&host.node_name) {
            return Err(StoreError::Validation(format!(
                "host '{}' failed validation",
                host.node_name
            )));
        }
        state.hosts.push(host.clone());
        Ok(())
    }

    async fn update_host_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let host = state
            .hosts
            .iter_mut()
            .find(|h| h.node_id == node_id)
            .ok_or_else(|| StoreError::NotFound(format!("host {node_id}")))?;
        host.status = status;
        Ok(())
    }

    async fn create_storage_device(&self, device: &StorageDeviceRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.device_writes_fail {
            return Err(StoreError::Validation(
                "storage device failed validation".to_string(),
            ));
        }
        state.devices.push(device.clone());
        Ok(())
    }

    async fn delete_discovered_node(&self, node_name: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.discovered.remove(node_name) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("discovered node {node_name}")))
        }
    }
}

/// A node config with SSH credentials, as a caller would submit it.
pub fn ssh_node_config(addr: &str, name: &str, role: &str) -> NodeConfig {
    NodeConfig {
        management_addr: addr.to_string(),
        node_name: name.to_string(),
        public_addr: None,
        cluster_addr: None,
        role: role.to_string(),
        ssh_username: Some("root".to_string()),
        ssh_password: Some("secret".to_string()),
        ssh_port: None,
        ssh_key_fingerprint: None,
    }
}

/// A pre-discovered node config: no credentials, agent already resident.
pub fn discovered_node_config(addr: &str, name: &str, role: &str) -> NodeConfig {
    NodeConfig {
        management_addr: addr.to_string(),
        node_name: name.to_string(),
        public_addr: None,
        cluster_addr: None,
        role: role.to_string(),
        ssh_username: None,
        ssh_password: None,
        ssh_port: None,
        ssh_key_fingerprint: None,
    }
}

pub fn gluster_config(name: &str, nodes: Vec<NodeConfig>) -> Config {
    Config {
        cluster: ClusterConfig {
            name: name.to_string(),
            kind: "gluster".to_string(),
            storage_type: "file".to_string(),
        },
        nodes,
    }
}

pub fn ceph_config(name: &str, nodes: Vec<NodeConfig>) -> Config {
    Config {
        cluster: ClusterConfig {
            name: name.to_string(),
            kind: "ceph".to_string(),
            storage_type: "block".to_string(),
        },
        nodes,
    }
}

/// A device-facts entry in the shape agents report from lsblk.
pub fn device_facts(name: &str) -> DeviceFacts {
    DeviceFacts {
        name: name.to_string(),
        uuid: format!("uuid-{name}"),
        kind: "disk".to_string(),
        path: format!("/dev/{name}"),
        fs_type: "xfs".to_string(),
        mount_point: String::new(),
    }
}
