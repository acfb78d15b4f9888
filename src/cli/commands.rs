//! Command dispatch: one connection, one transaction, one commit per run.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use sqlx::{AnyConnection, Connection};
use tracing::{debug, info, instrument, warn};

use crate::application::services::{BlockerService, SetReport};
use crate::application::{record_to_yaml, ApplicationResult, BlockerDocument};
use crate::cli::args::{Cli, DatabaseArgs, Mode};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{DatabaseConfig, Settings};
use crate::domain::Blocker;
use crate::infrastructure::db::SqlBlockerStore;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::BlockerStore;
use crate::infrastructure::InfraError;

/// What a command produced; printed only after the transaction committed.
#[derive(Debug)]
enum Outcome {
    Listed(BlockerDocument),
    Created(SetReport),
    Deleted(Option<Blocker>),
}

/// Entry point from `main`: handles the informational flags, resolves
/// settings and runs the selected mode.
pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(shell) = cli.completion {
        print_completions(shell);
        return Ok(());
    }
    if cli.config_template {
        output::info(&Settings::template());
        return Ok(());
    }

    let settings = resolve_settings(cli)?;
    if cli.show_config {
        output::info(&settings.to_toml()?);
        return Ok(());
    }

    let container = ServiceContainer::new(settings);
    run(cli, &container).await
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Layer command-line flags over file and environment settings.
pub fn resolve_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_database_args(&mut settings.database, &cli.database);
    debug!("resolve_settings: host={} db={}", settings.database.host, settings.database.name);
    Ok(settings)
}

fn apply_database_args(db: &mut DatabaseConfig, args: &DatabaseArgs) {
    if let Some(host) = &args.host {
        db.host = host.clone();
    }
    if let Some(port) = args.port {
        db.port = port;
    }
    if let Some(user) = &args.user {
        db.user = user.clone();
    }
    if let Some(passwd) = &args.passwd {
        db.password = passwd.clone();
    }
    if let Some(name) = &args.db {
        db.name = name.clone();
    }
    if let Some(url) = &args.url {
        db.url = Some(url.clone());
    }
}

/// Run the selected mode against the container's database, reporting on stdout.
pub async fn run(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    run_to(cli, container, &mut io::stdout()).await
}

/// Run the selected mode, writing the YAML report to `out`.
///
/// The input file for `set` is read before connecting. The connection is
/// closed on every path once the command body returns.
pub async fn run_to<W: Write>(
    cli: &Cli,
    container: &ServiceContainer,
    out: &mut W,
) -> CliResult<()> {
    let batch = match cli.mode {
        Mode::Set => Some(load_batch(cli, container)?),
        Mode::Get | Mode::Del => None,
    };

    let mut conn = container.connect().await?;
    let result = run_in_transaction(cli, batch, &mut conn).await;
    if let Err(e) = conn.close().await {
        warn!("closing database connection: {}", e);
    }

    let outcome = result?;
    write_outcome(out, cli.id, &outcome).map_err(|e| InfraError::io("write report", e))?;
    Ok(())
}

fn load_batch(cli: &Cli, container: &ServiceContainer) -> CliResult<BlockerDocument> {
    let path = cli
        .file
        .as_deref()
        .ok_or_else(|| CliError::InvalidArgs("`-m set` requires `-f <file>`".into()))?;
    Ok(BlockerDocument::load(container.fs.as_ref(), path)?)
}

async fn run_in_transaction(
    cli: &Cli,
    batch: Option<BlockerDocument>,
    conn: &mut AnyConnection,
) -> CliResult<Outcome> {
    let mut service = BlockerService::new(SqlBlockerStore::begin(conn).await?);

    let outcome = match cli.mode {
        Mode::Get => _get(&mut service, cli.id).await?,
        Mode::Set => _set(&mut service, batch.unwrap_or_default()).await?,
        Mode::Del => _del(&mut service, cli.id).await?,
    };

    service.into_store().commit().await?;
    Ok(outcome)
}

#[instrument(skip(service))]
async fn _get<S: BlockerStore>(service: &mut BlockerService<S>, id: i64) -> CliResult<Outcome> {
    let blockers = service.get(id).await?;
    info!("get: {} blockers", blockers.len());
    Ok(Outcome::Listed(BlockerDocument::new(blockers)))
}

#[instrument(skip_all, fields(records = batch.blocker.len()))]
async fn _set<S: BlockerStore>(
    service: &mut BlockerService<S>,
    batch: BlockerDocument,
) -> CliResult<Outcome> {
    let report = service.create_batch(&batch.blocker).await?;
    Ok(Outcome::Created(report))
}

#[instrument(skip(service))]
async fn _del<S: BlockerStore>(service: &mut BlockerService<S>, id: i64) -> CliResult<Outcome> {
    Ok(Outcome::Deleted(service.delete(id).await?))
}

/// Render an outcome: YAML documents, duplicate reports and the
/// confirmation line, all on the same stream.
fn write_outcome<W: Write>(out: &mut W, id: i64, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Listed(doc) => {
            writeln!(out, "{}", yaml(doc.to_yaml())?.trim_end())?;
        }
        Outcome::Created(report) => {
            for dup in &report.duplicates {
                writeln!(out, "{}: duplicate id entry: {}", "Warning".yellow(), dup.id)?;
                writeln!(out, "{}", yaml(record_to_yaml(dup))?.trim_end())?;
            }
            writeln!(
                out,
                "{} created {} blocker(s), skipped {} duplicate(s)",
                "✓".green(),
                report.created.len(),
                report.duplicates.len()
            )?;
        }
        Outcome::Deleted(removed) => {
            match removed {
                Some(b) => writeln!(out, "{} Deleted blocker {}.", "✓".green(), b.id)?,
                None => writeln!(out, "{} Deleted. (no blocker with id {})", "✓".green(), id)?,
            }
            let doc = BlockerDocument::new(removed.iter().cloned().collect());
            writeln!(out, "{}", yaml(doc.to_yaml())?.trim_end())?;
        }
    }
    Ok(())
}

fn yaml(rendered: ApplicationResult<String>) -> io::Result<String> {
    rendered.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn given_no_flags_when_parse_then_get_all() {
        let cli = Cli::try_parse_from(["blockerctl"]).unwrap();
        assert_eq!(cli.mode, Mode::Get);
        assert_eq!(cli.id, 0);
        assert!(cli.file.is_none());
    }

    #[test]
    fn given_db_flags_when_apply_then_override_settings() {
        let cli = Cli::try_parse_from([
            "blockerctl", "--host", "db.local", "--port", "3307", "--user", "dots", "--passwd",
            "pw", "--db", "dots_test",
        ])
        .unwrap();
        let mut db = DatabaseConfig::default();

        apply_database_args(&mut db, &cli.database);

        assert_eq!(db.host, "db.local");
        assert_eq!(db.port, 3307);
        assert_eq!(db.user, "dots");
        assert_eq!(db.password, "pw");
        assert_eq!(db.name, "dots_test");
        assert_eq!(db.url, None);
    }

    #[test]
    fn given_invalid_mode_when_parse_then_error() {
        assert!(Cli::try_parse_from(["blockerctl", "-m", "update"]).is_err());
    }

    #[test]
    fn given_set_without_file_when_load_batch_then_invalid_args() {
        let cli = Cli::try_parse_from(["blockerctl", "-m", "set"]).unwrap();
        let container = ServiceContainer::new(Settings::default());

        let err = load_batch(&cli, &container).unwrap_err();

        assert!(matches!(err, CliError::InvalidArgs(_)));
    }
}
