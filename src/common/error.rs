use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Agent not found: {id}")]
    AgentNotFound { id: String },

    #[error("Invalid route: {reason}")]
    InvalidRoute { reason: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Failures of the external route optimiser. None of these ever reach a
/// client: the optimiser is fail-open.
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Optimizer is not configured (missing API key)")]
    NotConfigured,

    #[error("Failed to encode routes: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Optimizer API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Optimizer reply contained no choices")]
    EmptyReply,

    #[error("Malformed optimizer reply: {0}")]
    MalformedReply(String),
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::AgentNotFound { id: "car-7".to_string() };
        assert_eq!(err.to_string(), "Agent not found: car-7");

        let err = OptimizerError::Api { status: 429, body: "slow down".to_string() };
        assert_eq!(err.to_string(), "Optimizer API returned 429: slow down");
    }

    #[test]
    fn test_domain_error_lifts_into_application_error() {
        let app: ApplicationError = DomainError::InvalidRoute {
            reason: "empty".to_string(),
        }
        .into();
        assert!(matches!(app, ApplicationError::Domain(DomainError::InvalidRoute { .. })));
    }
}
