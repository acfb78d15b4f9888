//! Blocker record service
//!
//! Implements get/set/delete on top of a [`BlockerStore`]. The service never
//! commits; the caller owns the transaction and commits once the whole
//! command has succeeded.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::application::error_ext::DbResultExt;
use crate::application::ApplicationResult;
use crate::domain::Blocker;
use crate::infrastructure::traits::BlockerStore;

/// Outcome of a bulk create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetReport {
    /// Ids inserted, in batch order
    pub created: Vec<i64>,
    /// Records rejected because their id already existed
    pub duplicates: Vec<Blocker>,
}

/// Service for reading and writing blocker records.
pub struct BlockerService<S> {
    store: S,
}

impl<S: BlockerStore> BlockerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Hand the store back, e.g. to commit its transaction.
    pub fn into_store(self) -> S {
        self.store
    }

    pub async fn list_ids(&mut self) -> ApplicationResult<Vec<i64>> {
        self.store.list_ids().await.with_db_context("list blocker ids")
    }

    /// Fetch one blocker with its parameters. `None` if the id is unknown.
    pub async fn fetch(&mut self, id: i64) -> ApplicationResult<Option<Blocker>> {
        self.store
            .fetch_blocker(id)
            .await
            .with_db_context(format!("fetch blocker {id}"))
    }

    /// Fetch every stored blocker in database iteration order.
    pub async fn fetch_all(&mut self) -> ApplicationResult<Vec<Blocker>> {
        let ids = self.list_ids().await?;
        self.fetch_each(&ids).await
    }

    /// Resolve a `get` request.
    ///
    /// A known id yields that single blocker; any other id (including the
    /// default 0) yields all blockers.
    pub async fn get(&mut self, id: i64) -> ApplicationResult<Vec<Blocker>> {
        let ids = self.list_ids().await?;
        debug!("get: id={} known={}", id, ids.len());
        if ids.contains(&id) {
            self.fetch_each(&[id]).await
        } else {
            self.fetch_each(&ids).await
        }
    }

    async fn fetch_each(&mut self, ids: &[i64]) -> ApplicationResult<Vec<Blocker>> {
        let mut blockers = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.fetch(id).await? {
                Some(b) => blockers.push(b),
                None => warn!("blocker {} disappeared while listing", id),
            }
        }
        Ok(blockers)
    }

    /// Create every record of a batch.
    ///
    /// All records are validated before the first insert; an incomplete
    /// record rejects the whole batch. Ids already stored, or seen earlier
    /// in the batch, are reported as duplicates and skipped.
    pub async fn create_batch(&mut self, batch: &[Blocker]) -> ApplicationResult<SetReport> {
        for blocker in batch {
            blocker.validate()?;
        }

        let mut known: HashSet<i64> = self.list_ids().await?.into_iter().collect();
        let mut report = SetReport::default();

        for blocker in batch {
            if known.contains(&blocker.id) {
                warn!("duplicate id entry: {}", blocker.id);
                report.duplicates.push(blocker.clone());
                continue;
            }
            let ignored = blocker.unknown_parameters();
            if !ignored.is_empty() {
                warn!("blocker {}: ignoring parameters {:?}", blocker.id, ignored);
            }
            self.store
                .insert_blocker(blocker)
                .await
                .with_db_context(format!("create blocker {}", blocker.id))?;
            known.insert(blocker.id);
            report.created.push(blocker.id);
        }

        info!(
            "create_batch: created={} duplicates={}",
            report.created.len(),
            report.duplicates.len()
        );
        Ok(report)
    }

    /// Remove a blocker and its parameters, returning what was removed.
    ///
    /// Unknown ids are a no-op returning `None`.
    pub async fn delete(&mut self, id: i64) -> ApplicationResult<Option<Blocker>> {
        let Some(existing) = self.fetch(id).await? else {
            debug!("delete: id={} not found", id);
            return Ok(None);
        };
        self.store
            .delete_blocker(id)
            .await
            .with_db_context(format!("delete blocker {id}"))?;
        info!("delete: removed {}", existing);
        Ok(Some(existing))
    }
}
