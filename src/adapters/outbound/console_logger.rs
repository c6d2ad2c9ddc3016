use crate::domains::logger::{DomainLogger, DOMAIN_LOG_TARGET};
use std::sync::Arc;

struct TracingBridge;

impl DomainLogger for TracingBridge {
    fn info(&self, msg: &str) {
        tracing::info!(target: DOMAIN_LOG_TARGET, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: DOMAIN_LOG_TARGET, "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: DOMAIN_LOG_TARGET, "{}", msg);
    }
}

/// Domain logger that forwards into the process-wide tracing subscriber.
pub fn init_console_logger() -> Arc<dyn DomainLogger> {
    Arc::new(TracingBridge)
}
