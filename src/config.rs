//! Geocoder configuration.
//!
//! Configuration is plain serde data so it can be loaded from JSON (or TOML
//! with the `toml` feature) alongside the rest of an application's settings.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// How batch queries are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Every query runs on the calling thread.
    Single,
    /// Batches are split across the worker pool.
    #[default]
    Parallel,
}

/// Geocoder configuration
///
/// # Example
///
/// ```rust
/// use revgeo::{Config, QueryMode};
///
/// let config = Config::default().with_workers(4);
/// assert_eq!(config.mode, QueryMode::Parallel);
///
/// let json = r#"{
///     "mode": "single",
///     "leaf_size": 32
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.mode, QueryMode::Single);
/// assert_eq!(config.leaf_size, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Single-threaded or parallel batch execution
    #[serde(default)]
    pub mode: QueryMode,

    /// Number of worker threads used for parallel batches
    #[serde(default = "Config::default_workers")]
    pub workers: usize,

    /// Maximum number of points stored in a k-d tree leaf
    #[serde(default = "Config::default_leaf_size")]
    pub leaf_size: usize,
}

impl Config {
    fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    const fn default_leaf_size() -> usize {
        16
    }

    /// Configuration for single-threaded execution.
    pub fn single() -> Self {
        Self {
            mode: QueryMode::Single,
            workers: 1,
            leaf_size: Self::default_leaf_size(),
        }
    }

    /// Configuration for parallel execution with `workers` threads.
    pub fn parallel(workers: usize) -> Self {
        Self {
            mode: QueryMode::Parallel,
            workers,
            leaf_size: Self::default_leaf_size(),
        }
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        assert!(workers > 0, "Worker count must be greater than zero");
        self.workers = workers;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        assert!(leaf_size > 0, "Leaf size must be greater than zero");
        self.leaf_size = leaf_size;
        self
    }

    /// Whether batches are dispatched to the worker pool.
    ///
    /// A parallel configuration with a single worker runs inline.
    pub fn is_parallel(&self) -> bool {
        self.mode == QueryMode::Parallel && self.workers > 1
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Worker count must be greater than zero".to_string());
        }

        if self.leaf_size == 0 {
            return Err("Leaf size must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: QueryMode::default(),
            workers: Self::default_workers(),
            leaf_size: Self::default_leaf_size(),
        }
    }
}
