//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum, ValueHint};

/// Read and write blocker records in the DOTS database
#[derive(Parser, Debug)]
#[command(name = "blockerctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Operation to perform
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = Mode::Get)]
    pub mode: Mode,

    /// Blocker id; for `get`, an unknown id lists all blockers
    #[arg(short = 'i', long = "id", default_value_t = 0)]
    pub id: i64,

    /// YAML file with a `blocker` collection (for `set`)
    #[arg(short = 'f', long = "file", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Settings file (default: ~/.config/blockerctl/blockerctl.toml)
    #[arg(short = 'c', long = "config", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print effective settings as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print a settings template and exit
    #[arg(long)]
    pub config_template: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completion: Option<clap_complete::Shell>,
}

/// Database connection flags; each overrides settings and environment.
#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// Database host [default: localhost]
    #[arg(long)]
    pub host: Option<String>,

    /// Database port [default: 3306]
    #[arg(long)]
    pub port: Option<u16>,

    /// Database user
    #[arg(long)]
    pub user: Option<String>,

    /// Database password
    #[arg(long)]
    pub passwd: Option<String>,

    /// Database name [default: dots]
    #[arg(long)]
    pub db: Option<String>,

    /// Full connection URL (mysql://..., sqlite://...); overrides the flags above
    #[arg(long, value_hint = ValueHint::Url)]
    pub url: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Print one or all blockers
    #[default]
    Get,
    /// Create blockers from a file
    Set,
    /// Delete a blocker by id
    Del,
}
