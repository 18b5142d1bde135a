//! Cache configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use creature_core::constants::{DEFAULT_CACHE_TTL_MS, ENV_CACHE_LOCK_MODE, ENV_CACHE_TTL_MS};
use creature_core::error::{CreatureError, Result};

/// How store fetches for cold keys are serialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockMode {
    /// One fetch lock per key. Cold lookups of different keys run in parallel.
    #[default]
    PerKey,
    /// One fetch lock for the whole cache. Every cold lookup waits its turn.
    Global,
}

impl FromStr for LockMode {
    type Err = CreatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "per-key" | "per_key" | "perkey" => Ok(LockMode::PerKey),
            "global" => Ok(LockMode::Global),
            other => Err(CreatureError::ConfigError(format!(
                "unknown lock mode '{}', expected 'per-key' or 'global'",
                other
            ))),
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::PerKey => f.write_str("per-key"),
            LockMode::Global => f.write_str("global"),
        }
    }
}

/// Cache configuration.
///
/// Fixed for the lifetime of the cache it builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for every cached lookup
    pub ttl: Duration,
    /// Granularity of the store fetch lock
    #[serde(default)]
    pub lock_mode: LockMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            lock_mode: LockMode::default(),
        }
    }
}

impl CacheConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the fetch lock granularity.
    pub fn with_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads the config from the environment, loading `.env` first.
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn try_from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`CacheConfig::try_from_env`], falling back to defaults on bad input.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid cache configuration, using defaults");
            Self::default()
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_MS) {
            let ttl_ms: u64 = raw.trim().parse().map_err(|_| {
                CreatureError::ConfigError(format!("{} must be milliseconds, got '{}'", ENV_CACHE_TTL_MS, raw))
            })?;
            config.ttl = Duration::from_millis(ttl_ms);
        }
        if let Some(raw) = lookup(ENV_CACHE_LOCK_MODE) {
            config.lock_mode = raw.parse()?;
        }

        Ok(config)
    }
}
