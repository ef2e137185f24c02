use serde::Deserialize;
use std::env;

/// Engine tunables. Every field carries a default so the engine also runs
/// without a config directory.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub cache: CacheRules,
    #[serde(default)]
    pub booking: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheRules {
    /// Whole-cache TTL for availability listings, measured from the first
    /// population.
    #[serde(default = "default_availability_ttl")]
    pub availability_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// How long a pending hold keeps its seats while payment is collected.
    #[serde(default = "default_hold_expiry")]
    pub hold_expiry_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_availability_ttl() -> u64 {
    30
}

fn default_hold_expiry() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for CacheRules {
    fn default() -> Self {
        Self {
            availability_ttl_seconds: default_availability_ttl(),
        }
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            hold_expiry_seconds: default_hold_expiry(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Base configuration file, if the deployment ships one
            .add_source(config::File::with_name("config/default").required(false))
            // Environment-specific overlay
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Settings from the environment (e.g. FITGRID__BOOKING__HOLD_EXPIRY_SECONDS)
            .add_source(config::Environment::with_prefix("FITGRID").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
