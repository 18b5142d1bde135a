//! libSQL-backed creature store.
//!
//! Talks to a remote libSQL / Turso database. Connection handling and retries
//! belong to the driver; this store only maps rows to creatures and driver
//! errors to [`CreatureError`].

use async_trait::async_trait;
use libsql::{params, Builder, Connection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use creature_core::constants::{DEFAULT_DB_URL, ENV_DB_AUTH_TOKEN, ENV_DB_URL};
use creature_core::error::{CreatureError, Result};
use creature_core::traits::CreatureStore;
use creature_core::types::{Creature, CreatureId, CreatureLookupResult};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS creatures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL
)";
const INSERT_CREATURE: &str =
    "INSERT INTO creatures (name, description) VALUES (?1, ?2) RETURNING id";
const SELECT_CREATURE: &str = "SELECT name, description FROM creatures WHERE id = ?1";

/// Connection parameters for [`SqlCreatureStore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Database URL
    pub url: String,
    /// Auth token, if the database requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DB_URL.into(),
            auth_token: None,
        }
    }
}

impl SqlConfig {
    /// Creates a config for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
        }
    }

    /// Sets the auth token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Reads connection parameters from the environment, loading `.env` first.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            url: std::env::var(ENV_DB_URL).unwrap_or_else(|_| DEFAULT_DB_URL.into()),
            auth_token: std::env::var(ENV_DB_AUTH_TOKEN).ok(),
        }
    }
}

/// Creature store over a libSQL database.
pub struct SqlCreatureStore {
    // Kept alive for the lifetime of the connection
    _db: Database,
    conn: Connection,
}

impl SqlCreatureStore {
    /// Connects to the configured database and ensures the schema exists.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &SqlConfig) -> Result<Self> {
        let db = Builder::new_remote(
            config.url.clone(),
            config.auth_token.clone().unwrap_or_default(),
        )
        .build()
        .await
        .map_err(unavailable)?;
        let conn = db.connect().map_err(unavailable)?;

        info!("Connected to creature database");
        Self::init(db, conn).await
    }

    async fn init(db: Database, conn: Connection) -> Result<Self> {
        conn.execute(CREATE_TABLE, ()).await.map_err(query_failed)?;
        Ok(Self { _db: db, conn })
    }
}

fn unavailable(e: libsql::Error) -> CreatureError {
    CreatureError::StoreUnavailable(e.to_string())
}

fn query_failed(e: libsql::Error) -> CreatureError {
    CreatureError::QueryFailed(e.to_string())
}

#[async_trait]
impl CreatureStore for SqlCreatureStore {
    #[instrument(skip(self, description))]
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature> {
        let mut rows = self
            .conn
            .query(INSERT_CREATURE, params![name, description])
            .await
            .map_err(query_failed)?;

        let row = rows
            .next()
            .await
            .map_err(query_failed)?
            .ok_or_else(|| CreatureError::StoreError("insert returned no id".into()))?;
        let id: i64 = row.get(0).map_err(query_failed)?;

        debug!(id, "Inserted creature");
        Ok(Creature::new(id, name, description))
    }

    #[instrument(skip(self))]
    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult> {
        let mut rows = self
            .conn
            .query(SELECT_CREATURE, params![id])
            .await
            .map_err(query_failed)?;

        match rows.next().await.map_err(query_failed)? {
            Some(row) => {
                let name: String = row.get(0).map_err(query_failed)?;
                let description: String = row.get(1).map_err(query_failed)?;
                Ok(CreatureLookupResult::Found(Creature::new(id, name, description)))
            }
            None => Ok(CreatureLookupResult::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn local_store() -> SqlCreatureStore {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        let conn = db.connect().unwrap();
        SqlCreatureStore::init(db, conn).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = local_store().await;

        let bob = store.create_creature("bob", "likes testing").await.unwrap();
        assert_eq!(bob.name, "bob");
        assert_eq!(bob.description, "likes testing");

        let found = store.get_creature(bob.id).await.unwrap();
        assert_eq!(found, CreatureLookupResult::Found(bob));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = local_store().await;

        // Autoincrement ids are positive
        let result = store.get_creature(-1).await.unwrap();
        assert_eq!(result, CreatureLookupResult::NotFound);
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let store = local_store().await;

        let a = store.create_creature("a", "").await.unwrap();
        let b = store.create_creature("b", "").await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let store = local_store().await;
        store.create_creature("bob", "").await.unwrap();

        store.conn.execute(CREATE_TABLE, ()).await.unwrap();
        assert!(store.get_creature(1).await.unwrap().is_found());
    }

    #[test]
    fn test_config_builder() {
        let config = SqlConfig::new("libsql://creatures.example").with_auth_token("secret");
        assert_eq!(config.url, "libsql://creatures.example");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }
}
