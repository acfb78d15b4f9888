//! Test support: logging setup and a throwaway SQLite database with the
//! blocker schema.

use std::env;
use std::path::Path;
use std::sync::Once;

use sqlx::{AnyConnection, Connection};
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::db::install_drivers;

static TEST_SETUP: Once = Once::new();

/// SQLite rendition of the production tables.
pub const TEST_SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS blocker (
        id INTEGER PRIMARY KEY,
        `type` TEXT NOT NULL,
        capacity INTEGER NOT NULL,
        status INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS blocker_parameter (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        blocker_id INTEGER NOT NULL,
        `key` TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // sqlx logs every statement at info
    let noisy_modules = ["sqlx::query"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Create the blocker tables on an open connection.
pub async fn create_schema(conn: &mut AnyConnection) -> sqlx::Result<()> {
    for statement in TEST_SCHEMA {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Fresh in-memory SQLite database with the blocker schema.
pub async fn memory_db() -> sqlx::Result<AnyConnection> {
    install_drivers();
    let mut conn = AnyConnection::connect("sqlite::memory:").await?;
    create_schema(&mut conn).await?;
    Ok(conn)
}

/// `sqlite://` URL for a database file, created with the blocker schema.
pub async fn sqlite_file_db(path: &Path) -> sqlx::Result<String> {
    install_drivers();
    let url = format!("sqlite://{}", path.display());
    let mut conn = AnyConnection::connect(&format!("{url}?mode=rwc")).await?;
    create_schema(&mut conn).await?;
    conn.close().await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[tokio::test]
    async fn given_memory_db_when_listing_blockers_then_empty() {
        let mut conn = memory_db().await.unwrap();
        let rows = sqlx::query("SELECT id FROM blocker")
            .fetch_all(&mut conn)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
