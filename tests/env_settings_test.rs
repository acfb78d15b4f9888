//! Settings precedence across file, `BLOCKERCTL_*` environment and flags.
//!
//! Kept in its own test binary because it mutates process environment;
//! `ENV_LOCK` serializes the tests inside it.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tempfile::TempDir;

use blockerctl::cli::commands::resolve_settings;
use blockerctl::cli::Cli;
use blockerctl::config::Settings;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const PASSWORD_VAR: &str = "BLOCKERCTL_DATABASE__PASSWORD";
const NAME_VAR: &str = "BLOCKERCTL_DATABASE__NAME";
const PORT_VAR: &str = "BLOCKERCTL_DATABASE__PORT";

/// Sets variables for the lifetime of the guard, removing them on drop.
struct EnvVars(Vec<&'static str>);

impl EnvVars {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        for (key, value) in vars {
            env::set_var(key, value);
        }
        Self(vars.iter().map(|(key, _)| *key).collect())
    }
}

impl Drop for EnvVars {
    fn drop(&mut self) {
        for key in &self.0 {
            env::remove_var(key);
        }
    }
}

fn settings_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("blockerctl.toml");
    fs::write(
        &path,
        r#"
[database]
host = "db.example.org"
password = "fromfile"
name = "dots"
port = 3306
"#,
    )
    .unwrap();
    path
}

#[test]
fn given_env_vars_when_load_then_override_file_verbatim() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let path = settings_file(&dir);
    let _env = EnvVars::set(&[(PASSWORD_VAR, "00123"), (NAME_VAR, "1.50")]);

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    // numeric-looking strings keep their exact text
    assert_eq!(settings.database.password, "00123");
    assert_eq!(settings.database.name, "1.50");
    assert_eq!(settings.database.host, "db.example.org");
}

#[test]
fn given_port_env_var_when_load_then_parsed_as_number() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let path = settings_file(&dir);
    let _env = EnvVars::set(&[(PORT_VAR, "3307")]);

    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    assert_eq!(settings.database.port, 3307);
}

#[test]
fn given_passwd_flag_and_env_var_when_resolve_settings_then_flag_wins() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let path = settings_file(&dir);
    let _env = EnvVars::set(&[(PASSWORD_VAR, "fromenv"), (NAME_VAR, "dots_env")]);
    let cli = Cli::try_parse_from([
        "blockerctl",
        "-c",
        path.to_str().unwrap(),
        "--passwd",
        "fromflag",
    ])
    .unwrap();

    let settings = resolve_settings(&cli).expect("resolve settings");

    assert_eq!(settings.database.password, "fromflag");
    assert_eq!(settings.database.name, "dots_env");
}
