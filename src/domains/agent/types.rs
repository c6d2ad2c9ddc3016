use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// A point in raw degrees. No range validation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Euclidean distance in degree units (not metres).
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        ((self.lat - other.lat).powi(2) + (self.lon - other.lon).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default = "generate_id")]
    pub id: String,
    pub waypoints: Vec<Coordinate>,
}

impl Route {
    pub fn new(id: impl Into<String>, waypoints: Vec<Coordinate>) -> DomainResult<Self> {
        let route = Self {
            id: id.into(),
            waypoints,
        };
        route.validate()?;
        Ok(route)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.waypoints.is_empty() {
            return Err(DomainError::InvalidRoute {
                reason: "Route must have at least one waypoint".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default = "generate_id")]
    pub id: String,
    pub location: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub neighbours: Vec<String>,
}

impl AgentState {
    pub fn new(id: impl Into<String>, location: Coordinate, destination: Coordinate) -> Self {
        Self {
            id: id.into(),
            location,
            destination,
            route: None,
            neighbours: Vec::new(),
        }
    }

    /// Decode and validate a client frame.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let state: AgentState = serde_json::from_str(raw)?;
        if let Some(route) = &state.route {
            route.validate()?;
        }
        Ok(state)
    }

    pub fn plan_route(&self) -> Route {
        let route = super::planner::plan_route(&self.location, &self.destination);
        tracing::debug!(agent_id = %self.id, route_id = %route.id, "planned straight-line route");
        route
    }

    /// The optimiser wire shape for this agent. Agents without a route send
    /// an empty waypoint list.
    pub fn route_update(&self) -> RouteUpdate {
        RouteUpdate {
            agent_id: self.id.clone(),
            waypoints: self
                .route
                .as_ref()
                .map(|r| r.waypoints.clone())
                .unwrap_or_default(),
        }
    }
}

/// One entry of an optimiser batch, in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub agent_id: String,
    pub waypoints: Vec<Coordinate>,
}

impl RouteUpdate {
    /// Stored routes written back from the optimiser reuse the agent id as
    /// the route id.
    pub fn to_route(&self) -> DomainResult<Route> {
        Route::new(self.agent_id.clone(), self.waypoints.clone())
    }
}

/// Frames pushed from the server to a connected agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Neighbours { neighbours: Vec<String> },
    Route { route: RouteUpdate },
}
