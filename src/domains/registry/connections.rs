use crate::domains::agent::ServerMessage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `Connecting -> Active -> Closed`. A connection is recorded as
/// `Connecting` on upgrade, becomes `Active` once its first frame is bound
/// to an agent, and is `Closed` once removed. A connection whose first
/// frame fails to parse goes straight from `Connecting` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closed,
}

pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    /// Unset while `Connecting`.
    pub agent_id: Option<String>,
    pub state: ConnectionState,
    outbound: Option<Outbound>,
}

impl ConnectionHandle {
    /// Active and the writer task is still draining the channel.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Active
            && self.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn is_bound_to(&self, agent_id: &str) -> bool {
        self.agent_id.as_deref() == Some(agent_id)
    }

    /// Fire-and-forget push. Returns false when the connection is not open;
    /// nothing is queued for later delivery.
    pub fn send(&self, message: ServerMessage) -> bool {
        match &self.outbound {
            Some(tx) if self.is_open() => tx.send(message).is_ok(),
            _ => false,
        }
    }
}

/// Live connection handle -> the agent id it represents.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Record an upgraded socket that has not sent its first frame yet.
    pub async fn open(&self, id: ConnectionId) {
        let handle = ConnectionHandle {
            id,
            agent_id: None,
            state: ConnectionState::Connecting,
            outbound: None,
        };
        self.connections.write().await.insert(id, handle);
    }

    /// Bind a connection to an agent and mark it `Active`. Works whether or
    /// not the connection was opened first.
    pub async fn register(&self, id: ConnectionId, agent_id: String, outbound: Outbound) {
        let handle = ConnectionHandle {
            id,
            agent_id: Some(agent_id),
            state: ConnectionState::Active,
            outbound: Some(outbound),
        };
        self.connections.write().await.insert(id, handle);
    }

    /// Remove the entry. The returned handle is already `Closed`; its
    /// `agent_id` is `None` if the connection never got past `Connecting`.
    pub async fn close(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        let mut handle = self.connections.write().await.remove(id)?;
        handle.state = ConnectionState::Closed;
        Some(handle)
    }

    /// The agent bound to an `Active` connection.
    pub async fn agent_for(&self, id: &ConnectionId) -> Option<String> {
        self.connections
            .read()
            .await
            .get(id)
            .filter(|h| h.state == ConnectionState::Active)
            .and_then(|h| h.agent_id.clone())
    }

    pub async fn state_of(&self, id: &ConnectionId) -> ConnectionState {
        self.connections
            .read()
            .await
            .get(id)
            .map(|h| h.state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Snapshot of every open connection.
    pub async fn open_handles(&self) -> Vec<ConnectionHandle> {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| h.is_open())
            .cloned()
            .collect()
    }

    /// Open connections bound to `agent_id`.
    pub async fn handles_for_agent(&self, agent_id: &str) -> Vec<ConnectionHandle> {
        self.connections
            .read()
            .await
            .values()
            .filter(|h| h.is_bound_to(agent_id) && h.is_open())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_close() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();

        assert_eq!(registry.state_of(&id).await, ConnectionState::Closed);
        registry.register(id, "car-1".to_string(), tx).await;
        assert_eq!(registry.state_of(&id).await, ConnectionState::Active);
        assert_eq!(registry.agent_for(&id).await.as_deref(), Some("car-1"));

        let closed = registry.close(&id).await.unwrap();
        assert_eq!(closed.state, ConnectionState::Closed);
        assert!(!closed.send(ServerMessage::Neighbours { neighbours: vec![] }));
        assert!(registry.is_empty().await);
        assert!(registry.close(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_not_open() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();
        registry.register(id, "car-1".to_string(), tx).await;
        drop(rx);

        assert!(registry.open_handles().await.is_empty());
        assert!(registry.handles_for_agent("car-1").await.is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_connecting_until_bound() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::new();

        registry.open(id).await;
        assert_eq!(registry.state_of(&id).await, ConnectionState::Connecting);
        assert_eq!(registry.len().await, 1);
        assert!(registry.agent_for(&id).await.is_none());
        assert!(registry.open_handles().await.is_empty());

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register(id, "car-1".to_string(), tx).await;
        assert_eq!(registry.state_of(&id).await, ConnectionState::Active);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.open_handles().await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_while_connecting_has_no_agent() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        registry.open(id).await;

        let closed = registry.close(&id).await.unwrap();
        assert_eq!(closed.state, ConnectionState::Closed);
        assert!(closed.agent_id.is_none());
        assert!(!closed.send(ServerMessage::Neighbours { neighbours: vec![] }));
        assert_eq!(registry.state_of(&id).await, ConnectionState::Closed);
    }
}
