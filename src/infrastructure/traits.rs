//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::Blocker;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Access to the `blocker` and `blocker_parameter` tables.
///
/// Implementations run inside whatever transaction the caller opened;
/// nothing here commits.
#[async_trait]
pub trait BlockerStore: Send {
    /// All blocker ids in database iteration order.
    async fn list_ids(&mut self) -> sqlx::Result<Vec<i64>>;

    /// One blocker with all of its parameter rows, `None` if absent.
    async fn fetch_blocker(&mut self, id: i64) -> sqlx::Result<Option<Blocker>>;

    /// Insert the blocker row and one parameter row per fixed key.
    async fn insert_blocker(&mut self, blocker: &Blocker) -> sqlx::Result<()>;

    /// Delete the blocker row and its parameter rows.
    /// Returns the number of blocker rows removed.
    async fn delete_blocker(&mut self, id: i64) -> sqlx::Result<u64>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
