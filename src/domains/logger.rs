use chrono::Utc;
use log::{Level, LevelFilter};
use std::sync::Arc;

/// Log target shared by every domain logger adapter, so file and console
/// output can be filtered on the same name.
pub const DOMAIN_LOG_TARGET: &str = "route_mesh::domain";

/// Domain-level logging port. Connection lifecycle, rejected updates and
/// optimiser fallbacks are reported through it; it never fails.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Writes through the `log` facade into a `fast_log` file appender, under
/// [`DOMAIN_LOG_TARGET`].
pub struct FileLogger {
    level: LevelFilter,
}

impl FileLogger {
    /// Install `fast_log` as the global `log` backend, appending to `path`
    /// everything at `level` or more severe. Fails if another `log` backend
    /// is already installed.
    pub fn init(path: &str, level: LevelFilter) -> Result<Self, Box<dyn std::error::Error>> {
        fast_log::init(fast_log::config::Config::new().file(path).level(level))?;
        Ok(Self { level })
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    fn write(&self, level: Level, msg: &str) {
        if level <= self.level {
            log::log!(target: DOMAIN_LOG_TARGET, level, "{} - {}", Utc::now().to_rfc3339(), msg);
        }
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        self.write(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.write(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.write(Level::Error, msg);
    }
}
