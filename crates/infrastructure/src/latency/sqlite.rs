use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use domain::device::{DeviceGroupId, DeviceId};
use domain::latency::{Latency, LatencyStore};
use domain::DomainError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::now;

const CREATE_LATENCY: &str = "CREATE TABLE IF NOT EXISTS latency (
    organization_id TEXT NOT NULL,
    device_group_id TEXT NOT NULL,
    device_id TEXT NOT NULL,
    inserted_at INTEGER NOT NULL,
    latency INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (organization_id, device_group_id, device_id, inserted_at)
)";

const CREATE_LAST_LATENCY: &str = "CREATE TABLE IF NOT EXISTS last_latency (
    organization_id TEXT NOT NULL,
    device_group_id TEXT NOT NULL,
    device_id TEXT NOT NULL,
    inserted_at INTEGER NOT NULL,
    latency INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (organization_id, device_group_id, device_id)
)";

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS latency_expires_at ON latency (expires_at)",
    "CREATE INDEX IF NOT EXISTS last_latency_expires_at ON last_latency (expires_at)",
];

const COLUMNS: &str = "organization_id, device_group_id, device_id, inserted_at, latency";

/// Latency store backed by SQLite.
///
/// The pool is opened on first use. A connectivity failure drops it and the
/// operation is retried once against a fresh pool.
pub struct SqliteLatencyStore {
    url: String,
    retention: Duration,
    pool: Mutex<Connection>,
}

/// Current pool plus a counter bumped on every reconnect, so a caller can
/// only drop the pool it actually saw failing.
#[derive(Default)]
struct Connection {
    pool: Option<Pool<Sqlite>>,
    generation: u64,
}

impl SqliteLatencyStore {
    pub fn new(url: impl Into<String>, retention: Duration) -> Self {
        Self {
            url: url.into(),
            retention,
            pool: Mutex::new(Connection::default()),
        }
    }

    /// Open the pool now instead of on the first request.
    pub async fn connect(&self) -> Result<(), DomainError> {
        self.pool().await.map(|_| ())
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.pool.take() {
            pool.close().await;
            info!("Latency store closed");
        }
    }

    async fn pool(&self) -> Result<(u64, Pool<Sqlite>), DomainError> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.pool.as_ref() {
            return Ok((guard.generation, pool.clone()));
        }

        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|e| DomainError::Internal(format!("invalid sqlite url: {e}")))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1) // SQLite is single-writer
            .connect_with(options)
            .await
            .map_err(|e| map_error("connect", e))?;

        sqlx::query(CREATE_LATENCY)
            .execute(&pool)
            .await
            .map_err(|e| map_error("create latency table", e))?;
        sqlx::query(CREATE_LAST_LATENCY)
            .execute(&pool)
            .await
            .map_err(|e| map_error("create last_latency table", e))?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| map_error("create expiry index", e))?;
        }

        guard.generation += 1;
        guard.pool = Some(pool.clone());
        debug!(url = %self.url, generation = guard.generation, "Latency store connected");
        Ok((guard.generation, pool))
    }

    /// Drop the pool of `generation`; a pool opened since is left alone.
    async fn reset(&self, generation: u64) {
        let mut guard = self.pool.lock().await;
        if guard.generation != generation {
            return;
        }
        if let Some(pool) = guard.pool.take() {
            pool.close().await;
        }
    }

    async fn run<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, DomainError>
    where
        F: Fn(Pool<Sqlite>) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let (generation, pool) = self.pool().await?;
        match f(pool).await {
            Ok(value) => Ok(value),
            Err(e) if is_connectivity_error(&e) => {
                warn!(operation, error = %e, "Latency store connection lost, reconnecting");
                self.reset(generation).await;
                let (_, pool) = self.pool().await?;
                f(pool).await.map_err(|e| map_error(operation, e))
            }
            Err(e) => Err(map_error(operation, e)),
        }
    }

    #[cfg(test)]
    async fn break_connection(&self) {
        if let Some(pool) = self.pool.lock().await.pool.as_ref() {
            pool.close().await;
        }
    }
}

fn is_connectivity_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

fn map_error(operation: &str, e: sqlx::Error) -> DomainError {
    if is_connectivity_error(&e) {
        DomainError::unavailable(format!("latency store {operation}: {e}"))
    } else {
        DomainError::Internal(format!("latency store {operation}: {e}"))
    }
}

fn latency_from_row(row: &SqliteRow) -> Result<Latency, sqlx::Error> {
    Ok(Latency {
        organization_id: row.try_get("organization_id")?,
        device_group_id: row.try_get("device_group_id")?,
        device_id: row.try_get("device_id")?,
        inserted_at: row.try_get("inserted_at")?,
        latency_millis: row.try_get("latency")?,
    })
}

#[async_trait]
impl LatencyStore for SqliteLatencyStore {
    async fn record(&self, latency: Latency) -> Result<(), DomainError> {
        let expires_at = latency.expires_at(self.retention);
        self.run("record", |pool| {
            let latency = latency.clone();
            async move {
                let now = now();
                let mut tx = pool.begin().await?;

                sqlx::query(
                    "INSERT OR REPLACE INTO latency (organization_id, device_group_id, device_id, inserted_at, latency, expires_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&latency.organization_id)
                .bind(&latency.device_group_id)
                .bind(&latency.device_id)
                .bind(latency.inserted_at)
                .bind(latency.latency_millis)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    "INSERT INTO last_latency (organization_id, device_group_id, device_id, inserted_at, latency, expires_at)
                     VALUES (?, ?, ?, ?, ?, ?)
                     ON CONFLICT (organization_id, device_group_id, device_id) DO UPDATE SET
                         inserted_at = excluded.inserted_at,
                         latency = excluded.latency,
                         expires_at = excluded.expires_at
                     WHERE excluded.inserted_at >= last_latency.inserted_at",
                )
                .bind(&latency.organization_id)
                .bind(&latency.device_group_id)
                .bind(&latency.device_id)
                .bind(latency.inserted_at)
                .bind(latency.latency_millis)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?;

                sqlx::query("DELETE FROM latency WHERE expires_at <= ?")
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM last_latency WHERE expires_at <= ?")
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await
            }
        })
        .await
    }

    async fn last_latency(&self, device: &DeviceId) -> Result<Option<Latency>, DomainError> {
        self.run("last latency", |pool| async move {
            let row = sqlx::query(&format!(
                "SELECT {COLUMNS} FROM last_latency
                 WHERE organization_id = ? AND device_group_id = ? AND device_id = ? AND expires_at > ?"
            ))
            .bind(&device.organization_id)
            .bind(&device.device_group_id)
            .bind(&device.device_id)
            .bind(now())
            .fetch_optional(&pool)
            .await?;
            row.as_ref().map(latency_from_row).transpose()
        })
        .await
    }

    async fn group_last_latencies(
        &self,
        group: &DeviceGroupId,
    ) -> Result<Vec<Latency>, DomainError> {
        self.run("group last latencies", |pool| async move {
            let rows = sqlx::query(&format!(
                "SELECT {COLUMNS} FROM last_latency
                 WHERE organization_id = ? AND device_group_id = ? AND expires_at > ?
                 ORDER BY device_id ASC"
            ))
            .bind(&group.organization_id)
            .bind(&group.device_group_id)
            .bind(now())
            .fetch_all(&pool)
            .await?;
            rows.iter().map(latency_from_row).collect()
        })
        .await
    }

    async fn history(&self, device: &DeviceId) -> Result<Vec<Latency>, DomainError> {
        self.run("history", |pool| async move {
            let rows = sqlx::query(&format!(
                "SELECT {COLUMNS} FROM latency
                 WHERE organization_id = ? AND device_group_id = ? AND device_id = ? AND expires_at > ?
                 ORDER BY inserted_at ASC"
            ))
            .bind(&device.organization_id)
            .bind(&device.device_group_id)
            .bind(&device.device_id)
            .bind(now())
            .fetch_all(&pool)
            .await?;
            rows.iter().map(latency_from_row).collect()
        })
        .await
    }

    async fn remove_latencies(&self, device: &DeviceId) -> Result<(), DomainError> {
        self.run("remove latencies", |pool| async move {
            let mut tx = pool.begin().await?;
            for table in ["latency", "last_latency"] {
                sqlx::query(&format!(
                    "DELETE FROM {table} WHERE organization_id = ? AND device_group_id = ? AND device_id = ?"
                ))
                .bind(&device.organization_id)
                .bind(&device.device_group_id)
                .bind(&device.device_id)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await
        })
        .await
    }
}
