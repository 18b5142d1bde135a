//! Defaults and environment variable names.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for cached lookups, in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 60_000;

/// Environment variable overriding the cache TTL (milliseconds).
pub const ENV_CACHE_TTL_MS: &str = "CREATURE_CACHE_TTL_MS";

/// Environment variable selecting the fetch lock mode (`per-key` or `global`).
pub const ENV_CACHE_LOCK_MODE: &str = "CREATURE_CACHE_LOCK_MODE";

// ═══════════════════════════════════════════════════════════════════════════════
// STORE DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// First id handed out by the in-process stores.
pub const FIRST_CREATURE_ID: i64 = 1;

/// Writes between automatic saves of the file store.
pub const DEFAULT_AUTO_SAVE_THRESHOLD: u64 = 100;

/// Environment variable holding the database URL for the SQL store.
pub const ENV_DB_URL: &str = "CREATURE_DB_URL";

/// Environment variable holding the database auth token for the SQL store.
pub const ENV_DB_AUTH_TOKEN: &str = "CREATURE_DB_AUTH_TOKEN";

/// Database URL used when none is configured.
pub const DEFAULT_DB_URL: &str = "http://127.0.0.1:8080";
