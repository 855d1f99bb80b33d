use anyhow::{Context, Result};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

const SECRET_KEY: &str = "shared_secret";

/// Durable client-side storage. The only thing kept is the shared secret
/// the agent expects on mutating requests.
#[derive(Clone)]
pub struct ClientStore {
    pool: SqlitePool,
}

impl ClientStore {
    /// Open (creating if needed) the store at a sqlx sqlite URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        // Every in-memory connection is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;

        let store = Self { pool };
        store.init_schema().await?;
        debug!("Client store ready at {}", database_url);

        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_secret(&self) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM client_state WHERE key = ?")
            .bind(SECRET_KEY)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Store the shared secret, replacing any previous one
    pub async fn save_secret(&self, secret: &str) -> Result<()> {
        let secret = secret.trim();
        anyhow::ensure!(!secret.is_empty(), "Shared secret cannot be empty");

        sqlx::query(
            "INSERT INTO client_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(SECRET_KEY)
        .bind(secret)
        .execute(&self.pool)
        .await?;

        info!("Shared secret saved");
        Ok(())
    }

    /// Forget the shared secret. Returns whether one was stored.
    pub async fn clear_secret(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(SECRET_KEY)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!("Shared secret cleared");
        }
        Ok(removed)
    }
}

/// Initialize an in-memory store for testing
#[cfg(test)]
pub async fn init_test_db() -> Result<ClientStore> {
    ClientStore::new("sqlite::memory:").await
}
