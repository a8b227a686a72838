use serde::{Deserialize, Serialize};
use stakepot_types::lottery::{
    DEFAULT_AUTO_START_SECS, DEFAULT_COUNTDOWN_SECS, DEFAULT_PREFIX, DEFAULT_RESOURCE,
    MAX_RESOURCE_LENGTH,
};
use std::{fs, io, path::Path, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;

pub mod console;
pub mod lottery;

/// Configuration for the node, read from YAML.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    #[serde(default = "default_auto_start_secs")]
    pub auto_start_secs: u64,
    #[serde(default = "default_resource")]
    pub resource: String,
    #[serde(default = "default_broadcast_to_all")]
    pub broadcast_to_all: bool,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub starting_balance: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("invalid resource: {value}")]
    InvalidResource { value: String },
}

pub struct ValidatedConfig {
    pub round: stakepot_execution::Config,
    pub starting_balance: u64,

    pub log_level: Level,
    pub json_logs: bool,
    pub metrics_port: u16,
    pub worker_threads: usize,
    pub mailbox_size: usize,
}

fn default_countdown_secs() -> u64 {
    DEFAULT_COUNTDOWN_SECS
}

fn default_auto_start_secs() -> u64 {
    DEFAULT_AUTO_START_SECS
}

fn default_resource() -> String {
    DEFAULT_RESOURCE.to_string()
}

fn default_broadcast_to_all() -> bool {
    true
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_worker_threads() -> usize {
    2
}

fn default_mailbox_size() -> usize {
    1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            auto_start_secs: default_auto_start_secs(),
            resource: default_resource(),
            broadcast_to_all: default_broadcast_to_all(),
            prefix: default_prefix(),
            starting_balance: 0,
            log_level: default_log_level(),
            json_logs: false,
            metrics_port: default_metrics_port(),
            worker_threads: default_worker_threads(),
            mailbox_size: default_mailbox_size(),
        }
    }
}

/// Where a loaded [Config] came from.
#[derive(Debug)]
pub enum Loaded {
    /// Parsed from the file.
    File(Config),
    /// The file did not exist and defaults were written in its place.
    Created(Config),
    /// The file could not be parsed, so defaults were used.
    Fallback(Config, ConfigError),
}

impl Loaded {
    pub fn into_config(self) -> Config {
        match self {
            Self::File(config) | Self::Created(config) | Self::Fallback(config, _) => config,
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load the config at `path`.
    ///
    /// A missing file is created with defaults. A file that cannot be parsed
    /// is left untouched and defaults are used instead.
    pub fn load(path: &Path) -> Result<Loaded, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                fs::write(path, serde_yaml::to_string(&config)?)?;
                return Ok(Loaded::Created(config));
            }
            Err(err) => return Err(err.into()),
        };
        match Self::parse(&contents) {
            Ok(config) => Ok(Loaded::File(config)),
            Err(err) => Ok(Loaded::Fallback(Self::default(), err)),
        }
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        for (field, value) in [
            ("countdown_secs", self.countdown_secs),
            ("auto_start_secs", self.auto_start_secs),
            ("worker_threads", self.worker_threads as u64),
            ("mailbox_size", self.mailbox_size as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidNonZero { field, value });
            }
        }

        let resource = self.resource.trim();
        if resource.is_empty()
            || resource.len() > MAX_RESOURCE_LENGTH
            || resource.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidResource {
                value: self.resource,
            });
        }

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            round: stakepot_execution::Config {
                countdown: self.countdown_secs,
                auto_start_interval: Duration::from_secs(self.auto_start_secs),
                resource: resource.to_string(),
                broadcast_to_all: self.broadcast_to_all,
                prefix: self.prefix,
            },
            starting_balance: self.starting_balance,
            log_level,
            json_logs: self.json_logs,
            metrics_port: self.metrics_port,
            worker_threads: self.worker_threads,
            mailbox_size: self.mailbox_size,
        })
    }
}
