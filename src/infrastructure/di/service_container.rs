//! Service container for dependency injection
//!
//! Wires settings, filesystem and the database connection together.

use std::sync::Arc;

use sqlx::AnyConnection;

use crate::config::Settings;
use crate::infrastructure::db;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding the resolved settings and I/O implementations.
///
/// The database connection is not held here: each command opens exactly
/// one via [`ServiceContainer::connect`] and closes it when done.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs }
    }

    /// Open the single connection used by one invocation.
    pub async fn connect(&self) -> InfraResult<AnyConnection> {
        let url = self.settings.database.connection_url()?;
        let display = self.settings.database.redacted_url()?;
        db::connect(&url, &display).await
    }
}
