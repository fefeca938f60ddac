//! Gateway configuration: defaults, optional YAML file, environment overrides.
//!
//! Resolution order is defaults → `GATEWAY_CONFIG` YAML file → environment
//! variables. The resolved config is immutable and shared by the HTTP
//! server and the task worker.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{TopicSubscription, WorkerId};

/// Environment variable naming the optional YAML config file.
pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG";

/// Errors raised while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GatewayConfig
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// Directory holding `index.html` and other static assets.
    pub public_dir: PathBuf,
    pub engine: EngineConfig,
    pub process: ProcessConfig,
    pub worker: WorkerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            public_dir: PathBuf::from("public"),
            engine: EngineConfig::default(),
            process: ProcessConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

/// Where the engine REST API lives and how long a single call may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/engine-rest".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The process definition the start-process endpoint instantiates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub key: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            key: "process_application".to_string(),
        }
    }
}

/// What to do with the rest of a batch after one completion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFailurePolicy {
    /// Log and keep completing the remaining tasks.
    #[default]
    Continue,
    /// Stop at the first failed completion; remaining tasks stay locked
    /// until their lock expires.
    Abort,
}

impl FromStr for BatchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(BatchFailurePolicy::Continue),
            "abort" => Ok(BatchFailurePolicy::Abort),
            other => Err(format!("expected 'continue' or 'abort', got '{other}'")),
        }
    }
}

/// External task worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub worker_id: String,
    pub topic_name: String,
    pub lock_duration_ms: u64,
    pub max_tasks: u32,
    pub poll_interval_ms: u64,
    /// Name of the variable written on completion.
    pub result_variable: String,
    /// Constant value written to `result_variable`.
    pub result_label: String,
    pub batch_failure_policy: BatchFailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_id: "node-worker-1".to_string(),
            topic_name: "process-in-node".to_string(),
            lock_duration_ms: 10_000,
            max_tasks: 1,
            poll_interval_ms: 5_000,
            result_variable: "processedBy".to_string(),
            result_label: "Node.js Worker".to_string(),
            batch_failure_policy: BatchFailurePolicy::Continue,
        }
    }
}

impl WorkerConfig {
    pub fn worker_id(&self) -> WorkerId {
        WorkerId::new(self.worker_id.clone())
    }

    pub fn subscription(&self) -> TopicSubscription {
        TopicSubscription {
            topic_name: self.topic_name.clone(),
            lock_duration: self.lock_duration_ms,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl GatewayConfig {
    /// Load from a YAML file. Missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the full configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::load_from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides on top of the current values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            let port: u16 = parse("PORT", &port)?;
            self.bind_addr = format!("0.0.0.0:{port}");
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = lookup("PUBLIC_DIR") {
            self.public_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("ENGINE_URL") {
            self.engine.base_url = url;
        }
        if let Some(ms) = lookup("HTTP_TIMEOUT_MS") {
            self.engine.timeout_ms = parse("HTTP_TIMEOUT_MS", &ms)?;
        }
        if let Some(key) = lookup("PROCESS_KEY") {
            self.process.key = key;
        }
        if let Some(enabled) = lookup("POLLER_ENABLED") {
            self.worker.enabled = parse("POLLER_ENABLED", &enabled)?;
        }
        if let Some(id) = lookup("WORKER_ID") {
            self.worker.worker_id = id;
        }
        if let Some(topic) = lookup("TOPIC_NAME") {
            self.worker.topic_name = topic;
        }
        if let Some(ms) = lookup("LOCK_DURATION_MS") {
            self.worker.lock_duration_ms = parse("LOCK_DURATION_MS", &ms)?;
        }
        if let Some(n) = lookup("MAX_TASKS") {
            self.worker.max_tasks = parse("MAX_TASKS", &n)?;
        }
        if let Some(ms) = lookup("POLL_INTERVAL_MS") {
            self.worker.poll_interval_ms = parse("POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(label) = lookup("RESULT_LABEL") {
            self.worker.result_label = label;
        }
        if let Some(policy) = lookup("BATCH_FAILURE_POLICY") {
            self.worker.batch_failure_policy = policy
                .parse()
                .map_err(|reason: String| ConfigError::invalid("BATCH_FAILURE_POLICY", reason))?;
        }
        Ok(())
    }

    /// Reject values the engine or the poll loop cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.engine.base_url)
            .map_err(|e| ConfigError::invalid("engine.base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "engine.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.engine.timeout_ms == 0 {
            return Err(ConfigError::invalid("engine.timeout_ms", "must be > 0"));
        }
        if self.process.key.is_empty() {
            return Err(ConfigError::invalid("process.key", "must not be empty"));
        }
        if self.worker.worker_id.is_empty() {
            return Err(ConfigError::invalid("worker.worker_id", "must not be empty"));
        }
        if self.worker.topic_name.is_empty() {
            return Err(ConfigError::invalid("worker.topic_name", "must not be empty"));
        }
        if self.worker.max_tasks == 0 {
            return Err(ConfigError::invalid("worker.max_tasks", "must be >= 1"));
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("worker.poll_interval_ms", "must be > 0"));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{raw}': {e}")))
}
