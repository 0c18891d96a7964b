//! Shared plumbing used by every Invopay crate.
//!
//! Currently just database pool construction and migrations; anything else
//! that more than one crate needs lands here.

pub mod db;

pub use db::{create_migration_pool, create_pool, run_migrations};
