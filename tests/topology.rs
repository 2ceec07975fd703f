// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::runtime::Runtime;
    use tokio_util::sync::CancellationToken;

    use corral_lib::{
        agents::AgentMap,
        cluster::{ClusterDescriptor, ClusterType, StorageType},
        error::ProvisionError,
        failure::{FailureReason, FailureSet},
        node::{NodeDescriptor, NodeRole, NodeStatus},
        provision::{create_cluster, discover_host_disks},
        settings::Settings,
        store::HostRecord,
        test_env::*,
        topology::{ceph, gluster},
    };

    fn settings() -> Settings {
        Settings {
            ready_wait: Duration::from_millis(10),
            config_push_timeout: Duration::from_millis(10),
        }
    }

    fn node(addr: &str, name: &str, role: NodeRole) -> NodeDescriptor {
        NodeDescriptor {
            management_addr: addr.to_string(),
            node_name: name.to_string(),
            ssh: None,
            public_addr: format!("{addr}-pub"),
            cluster_addr: format!("{addr}-clu"),
            role,
            status: NodeStatus::Inactive,
        }
    }

    /// An agent map as trust establishment would have produced it for the
    /// given nodes, using the scripted transport's agent naming.
    fn agents_for(nodes: &[NodeDescriptor]) -> AgentMap {
        let mut agents = AgentMap::new();
        for n in nodes.iter() {
            agents.insert(&n.management_addr, agent_for_addr(&n.management_addr));
        }
        agents
    }

    fn host_for(node: &NodeDescriptor, cluster: &ClusterDescriptor) -> HostRecord {
        HostRecord::new(node, format!("id-{}", node.node_name), cluster.id)
    }

    #[test]
    fn gluster_full_build_has_no_alternate_root() {
        // B is unreachable from A but would be reachable from C. The full
        // build hard-codes the first node as the probing root, so B fails.
        let transport = ScriptedTransport::new();
        transport
            .script()
            .blocked_probes
            .insert(("10.0.0.1".to_string(), "10.0.0.2".to_string()));

        let nodes = vec![
            node("10.0.0.1", "a", NodeRole::Gluster),
            node("10.0.0.2", "b", NodeRole::Gluster),
            node("10.0.0.3", "c", NodeRole::Gluster),
        ];
        let mut failures = FailureSet::new();

        let rt = Runtime::new().unwrap();
        rt.block_on(gluster::build(&transport, &nodes, &mut failures));

        assert_eq!(failures.len(), 1);
        assert!(failures.contains("10.0.0.2"));
        // No probe toward B was attempted from any other member.
        assert!(!transport
            .calls()
            .contains(&"probe 10.0.0.3->10.0.0.2".to_string()));
        // C was still probed; one bad peer does not stop the rest.
        assert!(transport
            .calls()
            .contains(&"probe 10.0.0.1->10.0.0.3".to_string()));
    }

    #[test]
    fn gluster_add_node_retries_across_members() {
        // Same partition as above, but the incremental path retries from
        // every pool member, so C's vantage point saves the probe.
        let transport = ScriptedTransport::new();
        transport
            .script()
            .blocked_probes
            .insert(("10.0.0.1".to_string(), "10.0.0.2".to_string()));

        let members = vec!["10.0.0.1".to_string(), "10.0.0.3".to_string()];

        let rt = Runtime::new().unwrap();
        let joined = rt.block_on(gluster::add_node(&transport, &members, "10.0.0.2"));

        assert!(joined);
        assert!(transport
            .calls()
            .contains(&"probe 10.0.0.3->10.0.0.2".to_string()));
    }

    #[test]
    fn gluster_add_node_exhausts_all_members() {
        let transport = ScriptedTransport::new();
        {
            let mut script = transport.script();
            script
                .blocked_probes
                .insert(("10.0.0.1".to_string(), "10.0.0.2".to_string()));
            script
                .blocked_probes
                .insert(("10.0.0.3".to_string(), "10.0.0.2".to_string()));
        }

        let members = vec!["10.0.0.1".to_string(), "10.0.0.3".to_string()];

        let rt = Runtime::new().unwrap();
        let joined = rt.block_on(gluster::add_node(&transport, &members, "10.0.0.2"));

        assert!(!joined);
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn gluster_add_node_to_empty_pool() {
        let transport = ScriptedTransport::new();

        let rt = Runtime::new().unwrap();
        let joined = rt.block_on(gluster::add_node(&transport, &[], "10.0.0.2"));

        assert!(joined);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn ceph_bootstrap_error_fails_whole_attempt() {
        let transport = ScriptedTransport::new();
        transport.script().bootstrap_error = Some("mon deployment failed".to_string());
        let store = MemStore::new();
        let config = ceph_config(
            "reef",
            vec![
                ssh_node_config("10.0.1.1", "mon00", "monitor"),
                ssh_node_config("10.0.1.2", "osd00", "osd"),
            ],
        );

        let rt = Runtime::new().unwrap();
        let result = rt.block_on(create_cluster(
            &transport,
            &store,
            &config,
            &settings(),
            &CancellationToken::new(),
        ));

        assert!(matches!(
            result,
            Err(ProvisionError::ClusterCreationFailed { .. })
        ));
        // Bootstrap was attempted; nothing monitor- or OSD-related after it.
        let calls = transport.calls();
        assert!(calls.iter().any(|c| c.starts_with("bootstrap reef")));
        assert!(!calls.iter().any(|c| c.starts_with("add_mons")));
        assert!(!calls.iter().any(|c| c.starts_with("add_osd")));
        assert!(!calls.iter().any(|c| c.starts_with("inventory")));
    }

    #[test]
    fn ceph_bootstrap_excludes_osd_only_nodes() {
        let transport = ScriptedTransport::new();
        let store = MemStore::new();
        let config = ceph_config(
            "reef",
            vec![
                ssh_node_config("10.0.1.1", "mon00", "monitor"),
                ssh_node_config("10.0.1.2", "mixed00", "mixed"),
                ssh_node_config("10.0.1.3", "osd00", "osd"),
            ],
        );

        let rt = Runtime::new().unwrap();
        let outcome = rt
            .block_on(create_cluster(
                &transport,
                &store,
                &config,
                &settings(),
                &CancellationToken::new(),
            ))
            .unwrap();

        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.hosts.len(), 3);
        assert!(transport
            .calls()
            .contains(&"bootstrap reef mons=2".to_string()));
    }

    #[test]
    fn ceph_monitor_add_failure_is_isolated_per_node() {
        let transport = ScriptedTransport::new();
        transport
            .script()
            .monitor_failures
            .insert(agent_for_addr("10.0.1.1"));

        let cluster = ClusterDescriptor::new("reef", ClusterType::Ceph, StorageType::Block);
        let nodes = vec![
            node("10.0.1.1", "mon00", NodeRole::Monitor),
            node("10.0.1.2", "mon01", NodeRole::Monitor),
        ];
        let agents = agents_for(&nodes);
        let mut failures = FailureSet::new();

        let rt = Runtime::new().unwrap();
        rt.block_on(ceph::add_monitors(
            &transport,
            &cluster,
            &nodes,
            &agents,
            &mut failures,
        ));

        assert_eq!(failures.len(), 1);
        assert!(failures.contains("10.0.1.1"));
        // Both nodes were attempted despite the first one failing.
        assert_eq!(
            transport
                .calls()
                .iter()
                .filter(|c| c.starts_with("add_mons"))
                .count(),
            2
        );
    }

    #[test]
    fn ceph_osd_failure_channels_converge() {
        let cluster = ClusterDescriptor::new("reef", ClusterType::Ceph, StorageType::Block);
        let osd_node = node("10.0.1.3", "osd00", NodeRole::Osd);
        let agents = agents_for(std::slice::from_ref(&osd_node));
        let host = host_for(&osd_node, &cluster);

        let rt = Runtime::new().unwrap();

        // Channel 1: the transport reports the agent as failed.
        let transport = ScriptedTransport::new();
        transport
            .script()
            .osd_failures
            .insert(agent_for_addr("10.0.1.3"));
        let failed = rt.block_on(ceph::add_osd(
            &transport, &cluster.name, &host, "/dev/sdb", &agents,
        ));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].node_name, "osd00");

        // Channel 2: the transport raises.
        let transport = ScriptedTransport::new();
        transport.script().osd_error = Some("udev timeout".to_string());
        let failed = rt.block_on(ceph::add_osd(
            &transport, &cluster.name, &host, "/dev/sdb", &agents,
        ));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].node_name, "osd00");

        // And the success case returns nothing.
        let transport = ScriptedTransport::new();
        let failed = rt.block_on(ceph::add_osd(
            &transport, &cluster.name, &host, "/dev/sdb", &agents,
        ));
        assert!(failed.is_empty());
    }

    #[test]
    fn disk_discovery_is_all_or_nothing() {
        let cluster = ClusterDescriptor::new("vault", ClusterType::Gluster, StorageType::File);
        let nodes = vec![
            node("10.0.0.1", "a", NodeRole::Gluster),
            node("10.0.0.2", "b", NodeRole::Gluster),
        ];
        let agents = agents_for(&nodes);
        let hosts: Vec<HostRecord> = nodes.iter().map(|n| host_for(n, &cluster)).collect();

        let rt = Runtime::new().unwrap();

        // One node's entry missing from the batched response fails the
        // whole batch, valid data for the other node notwithstanding.
        let transport = ScriptedTransport::new();
        let store = MemStore::new();
        {
            let mut script = transport.script();
            script.inventory.insert(
                agent_for_addr("10.0.0.1"),
                vec![device_facts("sda"), device_facts("sdb")],
            );
            script
                .omit_from_inventory
                .insert(agent_for_addr("10.0.0.2"));
        }
        assert!(!rt.block_on(discover_host_disks(&transport, &store, &hosts, &agents)));

        // The intact case materializes a record per reported device.
        let transport = ScriptedTransport::new();
        let store = MemStore::new();
        transport.script().inventory.insert(
            agent_for_addr("10.0.0.1"),
            vec![device_facts("sda"), device_facts("sdb")],
        );
        assert!(rt.block_on(discover_host_disks(&transport, &store, &hosts, &agents)));
        let state = store.state();
        assert_eq!(state.devices.len(), 2);
        assert!(state.devices.iter().all(|d| d.node_id == "id-a"));
        assert_eq!(state.devices[0].device_path, "/dev/sda");
    }

    #[test]
    fn disk_discovery_store_error_aborts_batch() {
        let cluster = ClusterDescriptor::new("vault", ClusterType::Gluster, StorageType::File);
        let nodes = vec![node("10.0.0.1", "a", NodeRole::Gluster)];
        let agents = agents_for(&nodes);
        let hosts = vec![host_for(&nodes[0], &cluster)];

        let transport = ScriptedTransport::new();
        transport
            .script()
            .inventory
            .insert(agent_for_addr("10.0.0.1"), vec![device_facts("sda")]);
        let store = MemStore::new();
        store.state().device_writes_fail = true;

        let rt = Runtime::new().unwrap();
        assert!(!rt.block_on(discover_host_disks(&transport, &store, &hosts, &agents)));
    }

    #[test]
    fn failed_nodes_skipped_by_monitor_addition() {
        let transport = ScriptedTransport::new();
        let cluster = ClusterDescriptor::new("reef", ClusterType::Ceph, StorageType::Block);
        let nodes = vec![
            node("10.0.1.1", "mon00", NodeRole::Monitor),
            node("10.0.1.2", "mon01", NodeRole::Monitor),
        ];
        let agents = agents_for(&nodes);
        let mut failures = FailureSet::new();
        failures.record(&nodes[0], FailureReason::ReadinessTimeout);

        let rt = Runtime::new().unwrap();
        rt.block_on(ceph::add_monitors(
            &transport,
            &cluster,
            &nodes,
            &agents,
            &mut failures,
        ));

        // Only the surviving node was offered; the failed one kept its
        // original failure reason.
        assert_eq!(
            transport
                .calls()
                .iter()
                .filter(|c| c.starts_with("add_mons"))
                .count(),
            1
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures.iter().next().unwrap().reason,
            FailureReason::ReadinessTimeout
        );
    }
}
