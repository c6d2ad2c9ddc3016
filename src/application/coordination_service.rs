use crate::common::{ApplicationResult, DomainError};
use crate::config::CoordinationConfig;
use crate::domains::agent::{AgentState, ServerMessage};
use crate::domains::logger::DynLogger;
use crate::domains::optimizer::{optimise_routes, RouteOptimizer};
use crate::domains::registry::{neighbours_of, AgentStore, ConnectionId, ConnectionRegistry, Outbound};
use crate::domains::simulation::{generate_agents, GridMap, DEFAULT_MAX_DEMO_COUNT};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What happened to an inbound update on an active connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The frame named a different agent than the one bound to the
    /// connection and identifiers are pinned.
    IgnoredForeignId { claimed: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimiseSummary {
    pub status: &'static str,
    pub agents: Vec<String>,
    #[serde(skip)]
    pub applied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub agents: usize,
    pub connections: usize,
}

/// Owns the agent store, the connection registry and the optimiser, and
/// is shared by every connection handler and HTTP endpoint.
pub struct CoordinationService {
    store: Arc<dyn AgentStore>,
    connections: ConnectionRegistry,
    optimizer: Arc<dyn RouteOptimizer>,
    logger: DynLogger,
    settings: CoordinationConfig,
    grid: GridMap,
    demo_limit: usize,
    /// Held from snapshot to last push so broadcasts land in snapshot order.
    broadcast_lock: Mutex<()>,
}

impl CoordinationService {
    pub fn new(
        store: Arc<dyn AgentStore>,
        optimizer: Arc<dyn RouteOptimizer>,
        logger: DynLogger,
        settings: CoordinationConfig,
        grid: GridMap,
    ) -> Self {
        Self {
            store,
            connections: ConnectionRegistry::new(),
            optimizer,
            logger,
            settings,
            grid,
            demo_limit: DEFAULT_MAX_DEMO_COUNT,
            broadcast_lock: Mutex::new(()),
        }
    }

    /// Largest batch `spawn_demo` accepts.
    pub fn with_demo_limit(mut self, limit: usize) -> Self {
        self.demo_limit = limit;
        self
    }

    pub fn store(&self) -> &Arc<dyn AgentStore> {
        &self.store
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Record an upgraded socket as `Connecting` until its first frame.
    pub async fn open(&self, connection: ConnectionId) {
        self.connections.open(connection).await;
    }

    /// First frame of a connection: store the agent, bind the connection
    /// and broadcast neighbours. On error the connection is closed and
    /// nothing is stored.
    pub async fn connect(
        &self,
        connection: ConnectionId,
        raw: &str,
        outbound: Outbound,
    ) -> ApplicationResult<String> {
        let state = match AgentState::parse(raw) {
            Ok(state) => state,
            Err(e) => {
                self.connections.close(&connection).await;
                return Err(e.into());
            }
        };
        let agent_id = state.id.clone();

        self.store.put(state).await;
        self.connections.register(connection, agent_id.clone(), outbound).await;
        self.logger.info(&format!("Agent {} connected on {}", agent_id, connection));

        self.broadcast_neighbours().await;
        Ok(agent_id)
    }

    /// Routine location update. Does not trigger a broadcast.
    pub async fn update(&self, connection: ConnectionId, raw: &str) -> ApplicationResult<UpdateOutcome> {
        let bound = self
            .connections
            .agent_for(&connection)
            .await
            .ok_or_else(|| DomainError::InvalidCommand {
                reason: format!("connection {} is not active", connection),
            })?;
        let state = AgentState::parse(raw)?;

        if self.settings.pin_agent_id && state.id != bound {
            self.logger.warn(&format!(
                "Connection {} bound to {} sent an update for {}; ignored",
                connection, bound, state.id
            ));
            return Ok(UpdateOutcome::IgnoredForeignId { claimed: state.id });
        }

        self.store.put(state).await;
        Ok(UpdateOutcome::Applied)
    }

    /// Unbind the connection, drop its agent record and rebroadcast.
    /// Every close path goes through here, clean or not.
    pub async fn disconnect(&self, connection: ConnectionId) -> Option<String> {
        let handle = self.connections.close(&connection).await?;
        // Never got past Connecting: nothing stored, nobody to tell.
        let agent_id = handle.agent_id?;
        self.store.remove(&agent_id).await;
        self.logger.info(&format!("Agent {} disconnected from {}", agent_id, connection));

        self.broadcast_neighbours().await;
        Some(agent_id)
    }

    /// Push every open connection the agents strictly within the threshold
    /// of its own agent. Returns how many pushes were accepted.
    pub async fn broadcast_neighbours(&self) -> usize {
        let _guard = self.broadcast_lock.lock().await;
        let agents = self.store.list().await;
        let mut delivered = 0;

        for handle in self.connections.open_handles().await {
            let Some(agent) = agents
                .iter()
                .find(|a| handle.agent_id.as_deref() == Some(a.id.as_str()))
            else {
                continue;
            };
            let neighbours = neighbours_of(
                &agent.id,
                &agent.location,
                &agents,
                self.settings.neighbour_threshold,
            );
            self.store.set_neighbours(&agent.id, neighbours.clone()).await;

            if handle.send(ServerMessage::Neighbours { neighbours }) {
                delivered += 1;
            }
        }

        tracing::debug!(delivered, agents = agents.len(), "neighbour broadcast");
        delivered
    }

    /// Send every known route through the optimiser and apply what comes
    /// back. Optimiser failures leave routes as they were.
    pub async fn optimise(&self) -> OptimiseSummary {
        let payload = self
            .store
            .list()
            .await
            .iter()
            .map(AgentState::route_update)
            .collect::<Vec<_>>();

        let updated = optimise_routes(self.optimizer.as_ref(), payload, self.logger.as_ref()).await;

        let mut applied = 0;
        for update in updated {
            let route = match update.to_route() {
                Ok(route) => route,
                Err(e) => {
                    tracing::debug!(agent_id = %update.agent_id, "skipping route update: {}", e);
                    continue;
                }
            };
            if self.store.set_route(&update.agent_id, route).await.is_err() {
                // Unknown agent: no record is created.
                continue;
            }
            applied += 1;

            for handle in self.connections.handles_for_agent(&update.agent_id).await {
                handle.send(ServerMessage::Route { route: update.clone() });
            }
        }

        let mut agents = self.store.ids().await;
        agents.sort();
        self.logger.info(&format!(
            "Optimisation applied {} route(s) across {} agent(s)",
            applied,
            agents.len()
        ));

        OptimiseSummary {
            status: "optimised",
            agents,
            applied,
        }
    }

    /// Populate the store with `count` synthetic agents. No broadcast.
    /// Counts above the demo limit are rejected before anything is built.
    pub async fn spawn_demo(&self, count: usize) -> ApplicationResult<Vec<String>> {
        if count > self.demo_limit {
            return Err(DomainError::InvalidCommand {
                reason: format!("num_cars {} exceeds the demo limit of {}", count, self.demo_limit),
            }
            .into());
        }
        let agents = generate_agents(&self.grid, count);
        let ids = agents.iter().map(|a| a.id.clone()).collect::<Vec<_>>();
        for agent in agents {
            self.store.put(agent).await;
        }
        self.logger.info(&format!("Spawned {} demo agent(s)", ids.len()));
        Ok(ids)
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            agents: self.store.len().await,
            connections: self.connections.len().await,
        }
    }
}
