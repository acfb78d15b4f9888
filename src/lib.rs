//! Read, bulk-insert and delete blocker records in the DOTS database.
//!
//! Layers, innermost first: [`domain`], [`application`], [`infrastructure`],
//! [`cli`]. [`config`] resolves connection settings.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
