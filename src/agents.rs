// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::HashMap;

use crate::transport::AgentId;

/// Bidirectional lookup between a node's management address and its agent
/// identity, owned by the provisioning run.
///
/// Entries are kept in insertion order, which trust establishment arranges
/// to be the original node-list order, so every later stage sees nodes in a
/// deterministic sequence. The map dies with the run; only the resulting
/// Host records outlive it.
#[derive(Debug, Clone, Default)]
pub struct AgentMap {
    by_addr: HashMap<String, AgentId>,
    by_agent: HashMap<AgentId, String>,
    order: Vec<String>,
}

impl AgentMap {
    pub fn new() -> Self {
        AgentMap::default()
    }

    pub fn insert(&mut self, management_addr: &str, agent: AgentId) {
        if !self.by_addr.contains_key(management_addr) {
            self.order.push(management_addr.to_string());
        }
        self.by_agent.insert(agent.clone(), management_addr.to_string());
        self.by_addr.insert(management_addr.to_string(), agent);
    }

    /// Drop a node's entry, e.g. after it failed a later trust step.
    pub fn remove(&mut self, management_addr: &str) -> Option<AgentId> {
        let agent = self.by_addr.remove(management_addr)?;
        self.by_agent.remove(&agent);
        self.order.retain(|addr| addr != management_addr);
        Some(agent)
    }

    pub fn agent_for(&self, management_addr: &str) -> Option<&AgentId> {
        self.by_addr.get(management_addr)
    }

    pub fn addr_for(&self, agent: &str) -> Option<&str> {
        self.by_agent.get(agent).map(|s| s.as_str())
    }

    pub fn contains_addr(&self, management_addr: &str) -> bool {
        self.by_addr.contains_key(management_addr)
    }

    /// All agent ids, in node-list order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.order
            .iter()
            .filter_map(|addr| self.by_addr.get(addr).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_addr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_lookup() {
        let mut map = AgentMap::new();
        map.insert("10.0.0.1", "agent-a".to_string());
        map.insert("10.0.0.2", "agent-b".to_string());

        assert_eq!(map.agent_for("10.0.0.1").unwrap(), "agent-a");
        assert_eq!(map.addr_for("agent-b").unwrap(), "10.0.0.2");
        assert_eq!(map.addr_for("agent-z"), None);
        assert_eq!(map.agent_ids(), vec!["agent-a", "agent-b"]);
    }

    #[test]
    fn insertion_order_is_stable() {
        let mut map = AgentMap::new();
        for addr in ["c", "a", "b"] {
            map.insert(addr, format!("agent-{addr}"));
        }
        assert_eq!(map.agent_ids(), vec!["agent-c", "agent-a", "agent-b"]);
    }
}
