use crate::config::LoggingConfig;
use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Fans each message out to every sink, in the order they were added.
pub struct MultiLogger {
    sinks: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: DynLogger) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

/// Console logger, plus a `fast_log` file sink at `logging.file_level` when
/// `logging.file` is set. An unknown level falls back to `info`; a file
/// appender that cannot be installed leaves the console on its own.
pub fn init_combined_logger(logging: &LoggingConfig) -> DynLogger {
    let console = super::init_console_logger();
    let Some(path) = &logging.file else {
        return console;
    };

    let level = match logging.file_level_filter() {
        Ok(level) => level,
        Err(e) => {
            console.warn(&format!("{}; using info", e));
            log::LevelFilter::Info
        }
    };

    match super::init_file_logger(path, level) {
        Ok(file_logger) => Arc::new(MultiLogger::new(vec![console, file_logger])) as DynLogger,
        Err(e) => {
            console.warn(&e);
            console
        }
    }
}
