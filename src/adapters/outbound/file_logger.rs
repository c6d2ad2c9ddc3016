use crate::domains::logger::{DomainLogger, FileLogger};
use log::LevelFilter;
use std::sync::Arc;

/// Install the `fast_log` appender at `path` and return the domain logger
/// that writes into it.
pub fn init_file_logger(path: &str, level: LevelFilter) -> Result<Arc<dyn DomainLogger>, String> {
    let logger = FileLogger::init(path, level)
        .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(logger))
}
