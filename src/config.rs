use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::domains::agent::Coordinate;
use crate::domains::registry::DEFAULT_NEIGHBOUR_THRESHOLD;
use crate::domains::simulation::{GridMap, DEFAULT_MAX_DEMO_COUNT};

pub const DEFAULT_CONFIG_FILE: &str = "route-mesh.toml";
pub const ENV_PREFIX: &str = "ROUTE_MESH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub coordination: CoordinationConfig,
    pub optimizer: OptimizerConfig,
    pub demo: DemoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// Strict upper bound, in raw degrees, for two agents to be neighbours.
    pub neighbour_threshold: f64,
    /// Drop updates whose `id` differs from the one bound at connect time.
    pub pin_agent_id: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub default_count: usize,
    /// Largest `num_cars` a single demo request may ask for.
    pub max_count: usize,
    pub grid_size: usize,
    pub base_lat: f64,
    pub base_lon: f64,
    pub spacing: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// When set, domain events are also appended to this file.
    pub file: Option<String>,
    /// Minimum level written to `file` (`error`, `warn`, `info`, ...).
    pub file_level: String,
}

impl Config {
    /// Defaults, then the TOML file at `path` if it exists, then
    /// `ROUTE_MESH__SECTION__KEY` environment variables. `GROQ_API_KEY` and
    /// `GROQ_MODEL` fill in the optimiser settings last.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let defaults = config::Config::try_from(&Config::default())
            .context("failed to seed configuration defaults")?;

        let mut config: Config = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?
            .try_deserialize()?;

        config.apply_groq_env();
        Ok(config)
    }

    fn apply_groq_env(&mut self) {
        if self.optimizer.api_key.is_none() {
            self.optimizer.api_key = std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            if !model.is_empty() {
                self.optimizer.model = model;
            }
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

impl LoggingConfig {
    pub fn file_level_filter(&self) -> Result<log::LevelFilter, String> {
        log::LevelFilter::from_str(self.file_level.trim())
            .map_err(|_| format!("unknown log level {:?}", self.file_level))
    }
}

impl DemoConfig {
    pub fn grid(&self) -> GridMap {
        GridMap {
            size: self.grid_size,
            base: Coordinate::new(self.base_lat, self.base_lon),
            spacing: self.spacing,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            neighbour_threshold: DEFAULT_NEIGHBOUR_THRESHOLD,
            pin_agent_id: true,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout_secs: 30,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        let grid = GridMap::default();
        Self {
            default_count: 10,
            max_count: DEFAULT_MAX_DEMO_COUNT,
            grid_size: grid.size,
            base_lat: grid.base.lat,
            base_lon: grid.base.lon,
            spacing: grid.spacing,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "route_mesh=info,tower_http=info".to_string(),
            file: None,
            file_level: "info".to_string(),
        }
    }
}
