// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Block-device inventory for provisioned hosts.

use log::{debug, error};

use crate::agents::AgentMap;
use crate::error::ProvisionError;
use crate::store::{HostRecord, StorageDeviceRecord, Store};
use crate::transport::Transport;

/// Query the trusted agents for their block devices, in one batched
/// request, and materialize a storage-device record per reported device.
///
/// Unlike the per-node isolation used elsewhere, this stage is
/// all-or-nothing: a malformed batched response cannot be safely attributed
/// to one node, so any trouble -- transport failure, a host missing from
/// the response, a write error -- aborts discovery for the entire batch and
/// reports overall failure.
pub async fn discover_disks(
    transport: &dyn Transport,
    store: &dyn Store,
    hosts: &[HostRecord],
    agents: &AgentMap,
) -> bool {
    match discover_batch(transport, store, hosts, agents).await {
        Ok(()) => true,
        Err(e) => {
            error!("{e}");
            false
        }
    }
}

async fn discover_batch(
    transport: &dyn Transport,
    store: &dyn Store,
    hosts: &[HostRecord],
    agents: &AgentMap,
) -> Result<(), ProvisionError> {
    if hosts.is_empty() {
        return Ok(());
    }

    let mut ids = Vec::new();
    for host in hosts.iter() {
        let agent = agents.agent_for(&host.management_addr).ok_or_else(|| {
            ProvisionError::DiscoveryBatchFailed(format!(
                "no trusted agent for host {}",
                host.node_name
            ))
        })?;
        ids.push(agent.clone());
    }

    let inventory = transport
        .fetch_disk_inventory(&ids)
        .await
        .map_err(|e| ProvisionError::DiscoveryBatchFailed(e.to_string()))?;

    for (host, agent) in hosts.iter().zip(ids.iter()) {
        let devices = inventory.get(agent).ok_or_else(|| {
            ProvisionError::DiscoveryBatchFailed(format!(
                "inventory response missing host {}",
                host.node_name
            ))
        })?;

        for facts in devices.iter() {
            debug!("device {} on host {}", facts.name, host.node_name);
            let record = StorageDeviceRecord {
                device_name: facts.name.clone(),
                device_uuid: facts.uuid.clone(),
                device_type: facts.kind.clone(),
                device_path: facts.path.clone(),
                filesystem_type: facts.fs_type.clone(),
                mount_point: facts.mount_point.clone(),
                node_id: host.node_id.clone(),
            };
            store
                .create_storage_device(&record)
                .await
                .map_err(|e| ProvisionError::DiscoveryBatchFailed(e.to_string()))?;
        }
    }

    Ok(())
}
