use super::types::{Coordinate, Route};
use uuid::Uuid;

/// Straight line from `location` to `destination`. Stand-in for a real
/// routing engine; the only non-deterministic part is the route id.
pub fn plan_route(location: &Coordinate, destination: &Coordinate) -> Route {
    Route {
        id: Uuid::new_v4().to_string(),
        waypoints: vec![*location, *destination],
    }
}
