use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Engine tuning settings
///
/// These are deployment knobs, not event data: event-specific input
/// (group size, meal times) travels in [`crate::models::EventConfig`]
/// per invocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub formation: FormationSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Knobs for the group formation engine
#[derive(Debug, Clone, Deserialize)]
pub struct FormationSettings {
    /// Amplitude of the random jitter added to waitlist keep-scores to
    /// break exact ties
    #[serde(default = "default_waitlist_jitter")]
    pub waitlist_jitter: f64,
    /// Upper bound on bucket-rebalancing moves before giving up with a
    /// warning
    #[serde(default = "default_max_rebalance_iterations")]
    pub max_rebalance_iterations: u32,
}

impl Default for FormationSettings {
    fn default() -> Self {
        Self {
            waitlist_jitter: default_waitlist_jitter(),
            max_rebalance_iterations: default_max_rebalance_iterations(),
        }
    }
}

fn default_waitlist_jitter() -> f64 { 0.25 }
fn default_max_rebalance_iterations() -> u32 { 100 }

/// Knobs for the route assignment engine
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSettings {
    /// Budget of seating combinations a single backtracking run may try
    #[serde(default = "default_max_backtrack_attempts")]
    pub max_backtrack_attempts: u64,
    /// Outer retries with reshuffled group order
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            max_backtrack_attempts: default_max_backtrack_attempts(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_backtrack_attempts() -> u64 { 100_000 }
fn default_max_retries() -> u32 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with DINNER_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g. DINNER__ROUTING__MAX_RETRIES -> routing.max_retries
            .add_source(
                Environment::with_prefix("DINNER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("DINNER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
