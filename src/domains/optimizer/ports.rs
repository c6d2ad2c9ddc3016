use crate::common::OptimizerError;
use crate::domains::agent::RouteUpdate;
use crate::domains::logger::DomainLogger;
use async_trait::async_trait;

/// Port for the external batch route optimiser. Implementations make no
/// promise about the correctness of what they return.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimise(&self, routes: &[RouteUpdate]) -> Result<Vec<RouteUpdate>, OptimizerError>;
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOptimizer;

#[async_trait]
impl RouteOptimizer for DisabledOptimizer {
    async fn optimise(&self, _routes: &[RouteUpdate]) -> Result<Vec<RouteUpdate>, OptimizerError> {
        Err(OptimizerError::NotConfigured)
    }
}

/// Fail-open wrapper: any optimiser error yields the input unchanged.
pub async fn optimise_routes(
    optimizer: &dyn RouteOptimizer,
    routes: Vec<RouteUpdate>,
    logger: &dyn DomainLogger,
) -> Vec<RouteUpdate> {
    match optimizer.optimise(&routes).await {
        Ok(updated) => updated,
        Err(e) => {
            logger.error(&format!("Route optimisation failed, keeping current routes: {}", e));
            routes
        }
    }
}
