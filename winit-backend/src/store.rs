use crate::config::Database;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::debug;

/// Liveness check against the backing store.
#[async_trait]
pub trait StoreProbe: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL pool shared by all requests. Connections are opened on demand,
/// so the relay starts even when the database is unreachable.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect_lazy(db: &Database) -> Self {
        let options = PgConnectOptions::new()
            .host(&db.host)
            .port(db.port)
            .database(&db.name)
            .username(&db.user)
            .password(&db.password);

        let max_connections = db.max_connections.unwrap_or(5);
        let acquire_timeout = Duration::from_secs(db.acquire_timeout_secs.unwrap_or(5));
        debug!(
            host = %db.host,
            port = db.port,
            database = %db.name,
            max_connections,
            ?acquire_timeout,
            "Configured store pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);
        Self { pool }
    }
}

#[async_trait]
impl StoreProbe for PgStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        // returned to the pool here, never held across requests
        drop(conn);
        Ok(())
    }
}
