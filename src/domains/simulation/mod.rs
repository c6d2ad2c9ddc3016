//! Synthetic agents on a fixed lattice, for populating the registry without
//! live connections.

use crate::domains::agent::{AgentState, Coordinate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAX_DEMO_COUNT: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMap {
    pub size: usize,
    pub base: Coordinate,
    pub spacing: f64,
}

impl Default for GridMap {
    fn default() -> Self {
        // Bangalore city centre
        Self {
            size: 5,
            base: Coordinate::new(12.9716, 77.5946),
            spacing: 0.02,
        }
    }
}

impl GridMap {
    pub fn node_to_coordinate(&self, row: usize, col: usize) -> Coordinate {
        Coordinate::new(
            self.base.lat + row as f64 * self.spacing,
            self.base.lon + col as f64 * self.spacing,
        )
    }

    /// Start and destination on the lattice diagonal.
    pub fn sample_start_end<R: Rng>(&self, rng: &mut R) -> (Coordinate, Coordinate) {
        let upper = self.size.saturating_sub(1).max(1) as f64;
        let start = rng.gen_range(0.0..upper) as usize;
        let end = rng.gen_range(0.0..upper) as usize;
        (
            self.node_to_coordinate(start, start),
            self.node_to_coordinate(end, end),
        )
    }
}

/// `count` agents with fresh ids and pre-planned straight routes. Callers
/// bound `count`; capacity is not reserved up front.
pub fn generate_agents(grid: &GridMap, count: usize) -> Vec<AgentState> {
    let mut rng = rand::thread_rng();
    let mut agents = Vec::new();
    for _ in 0..count {
        let (start, destination) = grid.sample_start_end(&mut rng);
        let mut agent = AgentState::new(Uuid::new_v4().to_string(), start, destination);
        agent.route = Some(agent.plan_route());
        agents.push(agent);
    }
    agents
}
