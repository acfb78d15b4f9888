//! sqlx-backed blocker store
//!
//! Runs over the sqlx `Any` driver so the same statements serve MySQL in
//! production and SQLite in tests. Every value is bound; no SQL text is
//! built from data.

use async_trait::async_trait;
use chrono::Local;
use sqlx::any::AnyRow;
use sqlx::{Any, AnyConnection, Connection, Row, Transaction};
use tracing::{debug, instrument};

use crate::domain::{Blocker, DEFAULT_STATUS, PARAMETER_KEYS};
use crate::infrastructure::traits::BlockerStore;
use crate::infrastructure::{InfraError, InfraResult};

/// Format used for `created_at`/`updated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_IDS: &str = "SELECT id FROM blocker";
const SELECT_BLOCKER: &str = "SELECT `type`, capacity FROM blocker WHERE id = ?";
const SELECT_PARAMETERS: &str = "SELECT `key`, value FROM blocker_parameter WHERE blocker_id = ?";
const INSERT_BLOCKER: &str = "INSERT INTO blocker (id, `type`, capacity, status, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?)";
const INSERT_PARAMETER: &str = "INSERT INTO blocker_parameter (blocker_id, `key`, value, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?)";
const DELETE_BLOCKER: &str = "DELETE FROM blocker WHERE id = ?";
const DELETE_PARAMETERS: &str = "DELETE FROM blocker_parameter WHERE blocker_id = ?";

/// Register the MySQL and SQLite drivers with the `Any` driver. Idempotent.
pub fn install_drivers() {
    sqlx::any::install_default_drivers();
}

/// Open a single connection. `url` is used verbatim, `display_url` in errors.
pub async fn connect(url: &str, display_url: &str) -> InfraResult<AnyConnection> {
    install_drivers();
    debug!("connect: {}", display_url);
    AnyConnection::connect(url)
        .await
        .map_err(|source| InfraError::Connect {
            url: display_url.to_string(),
            source,
        })
}

/// Blocker store bound to one open transaction.
///
/// Dropping the store without [`SqlBlockerStore::commit`] rolls back.
pub struct SqlBlockerStore<'c> {
    tx: Transaction<'c, Any>,
}

impl<'c> SqlBlockerStore<'c> {
    /// Begin a transaction on `conn`.
    pub async fn begin(conn: &'c mut AnyConnection) -> InfraResult<Self> {
        let tx = conn
            .begin()
            .await
            .map_err(|e| InfraError::db("begin transaction", e))?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> InfraResult<()> {
        debug!("commit");
        self.tx
            .commit()
            .await
            .map_err(|e| InfraError::db("commit", e))
    }

    fn now() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

#[async_trait]
impl BlockerStore for SqlBlockerStore<'_> {
    #[instrument(level = "trace", skip(self))]
    async fn list_ids(&mut self) -> sqlx::Result<Vec<i64>> {
        let rows = sqlx::query(SELECT_IDS).fetch_all(&mut *self.tx).await?;
        rows.iter().map(|row| row.try_get::<i64, _>(0)).collect()
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_blocker(&mut self, id: i64) -> sqlx::Result<Option<Blocker>> {
        let Some(row) = sqlx::query(SELECT_BLOCKER)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
        else {
            return Ok(None);
        };
        let blocker_type: String = row.try_get(0)?;
        let capacity: i64 = row.try_get(1)?;
        let mut blocker = Blocker::new(id, blocker_type, capacity);

        let params: Vec<AnyRow> = sqlx::query(SELECT_PARAMETERS)
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;
        for param in &params {
            blocker
                .parameters
                .insert(param.try_get::<String, _>(0)?, param.try_get::<String, _>(1)?);
        }
        debug!("fetch_blocker: {} with {} parameters", id, params.len());
        Ok(Some(blocker))
    }

    #[instrument(level = "trace", skip(self, blocker), fields(id = blocker.id))]
    async fn insert_blocker(&mut self, blocker: &Blocker) -> sqlx::Result<()> {
        let now = Self::now();
        sqlx::query(INSERT_BLOCKER)
            .bind(blocker.id)
            .bind(blocker.blocker_type.as_str())
            .bind(blocker.capacity)
            .bind(DEFAULT_STATUS)
            .bind(now.as_str())
            .bind(now.as_str())
            .execute(&mut *self.tx)
            .await?;

        for key in PARAMETER_KEYS {
            let value = blocker.parameter(key).unwrap_or_default();
            sqlx::query(INSERT_PARAMETER)
                .bind(blocker.id)
                .bind(key)
                .bind(value)
                .bind(now.as_str())
                .bind(now.as_str())
                .execute(&mut *self.tx)
                .await?;
        }
        debug!("insert_blocker: {}", blocker);
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn delete_blocker(&mut self, id: i64) -> sqlx::Result<u64> {
        let removed = sqlx::query(DELETE_BLOCKER)
            .bind(id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        let params = sqlx::query(DELETE_PARAMETERS)
            .bind(id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        debug!("delete_blocker: {} rows, {} parameter rows", removed, params);
        Ok(removed)
    }
}
