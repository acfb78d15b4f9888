//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (BlockerStore, FileSystem)
//! but are themselves concrete structs, not traits.

mod blocker;

pub use blocker::{BlockerService, SetReport};
