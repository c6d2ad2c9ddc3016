use crate::common::DomainResult;
use crate::domains::agent::{AgentState, Route};
use async_trait::async_trait;

/// Port for the agent record store. Last write wins; no transactions span
/// multiple calls, so callers must tolerate interleaving with other
/// connections' handlers.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Insert or overwrite the record keyed by `state.id`.
    async fn put(&self, state: AgentState);

    /// Fails with `DomainError::AgentNotFound` for unknown ids.
    async fn get(&self, id: &str) -> DomainResult<AgentState>;

    /// No-op for unknown ids.
    async fn remove(&self, id: &str) -> Option<AgentState>;

    async fn list(&self) -> Vec<AgentState>;

    async fn ids(&self) -> Vec<String>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Replace one agent's route wholesale. Never creates a record.
    async fn set_route(&self, id: &str, route: Route) -> DomainResult<()>;

    /// Overwrite the derived neighbour list. Unknown ids are ignored.
    async fn set_neighbours(&self, id: &str, neighbours: Vec<String>);
}
