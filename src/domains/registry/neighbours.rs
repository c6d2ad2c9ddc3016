use crate::domains::agent::{AgentState, Coordinate};

pub const DEFAULT_NEIGHBOUR_THRESHOLD: f64 = 0.05;

/// Ids of every agent strictly closer than `threshold` to `location`,
/// excluding `self_id`.
pub fn neighbours_of(
    self_id: &str,
    location: &Coordinate,
    agents: &[AgentState],
    threshold: f64,
) -> Vec<String> {
    agents
        .iter()
        .filter(|other| other.id != self_id && other.location.distance_to(location) < threshold)
        .map(|other| other.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, lat: f64, lon: f64) -> AgentState {
        AgentState::new(id, Coordinate::new(lat, lon), Coordinate::new(0.0, 0.0))
    }

    #[test]
    fn test_excludes_self_and_far_agents() {
        let agents = vec![agent("a", 0.0, 0.0), agent("b", 0.01, 0.01), agent("c", 1.0, 1.0)];
        let found = neighbours_of("a", &agents[0].location, &agents, DEFAULT_NEIGHBOUR_THRESHOLD);
        assert_eq!(found, vec!["b".to_string()]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let agents = vec![agent("a", 0.0, 0.0), agent("edge", 0.05, 0.0), agent("inside", 0.0499, 0.0)];
        let found = neighbours_of("a", &agents[0].location, &agents, DEFAULT_NEIGHBOUR_THRESHOLD);
        assert_eq!(found, vec!["inside".to_string()]);
    }
}
