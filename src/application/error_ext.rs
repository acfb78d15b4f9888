//! Error conversion helpers for store and file operations
//!
//! Provides extension traits for cleaner error handling with context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read blocker file", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait for converting `sqlx::Result` to `ApplicationResult` with context.
pub trait DbResultExt<T> {
    /// Name the statement that failed.
    ///
    /// # Example
    /// ```ignore
    /// store.list_ids().await.with_db_context("list blocker ids")?;
    /// ```
    fn with_db_context(self, action: impl Into<String>) -> ApplicationResult<T>;
}

impl<T> DbResultExt<T> for sqlx::Result<T> {
    fn with_db_context(self, action: impl Into<String>) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Database {
            context: action.into(),
            source: e,
        })
    }
}
