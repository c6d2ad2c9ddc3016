use crate::common::{DomainError, DomainResult};
use crate::domains::agent::{AgentState, Route};
use crate::domains::registry::AgentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-lifetime agent store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryAgentStore {
    agents: RwLock<HashMap<String, AgentState>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn put(&self, state: AgentState) {
        let mut agents = self.agents.write().await;
        agents.insert(state.id.clone(), state);
    }

    async fn get(&self, id: &str) -> DomainResult<AgentState> {
        let agents = self.agents.read().await;
        agents
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::AgentNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str) -> Option<AgentState> {
        self.agents.write().await.remove(id)
    }

    async fn list(&self) -> Vec<AgentState> {
        self.agents.read().await.values().cloned().collect()
    }

    async fn ids(&self) -> Vec<String> {
        self.agents.read().await.keys().cloned().collect()
    }

    async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    async fn set_route(&self, id: &str, route: Route) -> DomainResult<()> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| DomainError::AgentNotFound { id: id.to_string() })?;
        agent.route = Some(route);
        Ok(())
    }

    async fn set_neighbours(&self, id: &str, neighbours: Vec<String>) {
        if let Some(agent) = self.agents.write().await.get_mut(id) {
            agent.neighbours = neighbours;
        }
    }
}
