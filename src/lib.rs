//! taskboard - team task dashboard library
//!
//! Pulls paginated todo records from an upstream GraphQL service and keeps
//! two incrementally maintained views of them: per-assignee priority
//! buckets and a flat, sortable task table.
//!
//! # Module Organization
//!
//! - `record`: Raw upstream records and their normalized form
//! - `dedup`: Composite keys that keep re-delivered records out of the views
//! - `board`: Per-assignee buckets of the highest-priority open tasks
//! - `table`: One row per task and assignee
//! - `query`: Search, stage filter and sort over table rows
//! - `paging`: Pagination coordinator owning the session state
//! - `upstream`: GraphQL client for the todo service
//! - `config`: Configuration loading from `taskboard.toml`
//! - `error`: Error types and result aliases
//! - `output`: Human and JSON command output
//! - `cli`: Command-line interface using clap
//! - `ui`: Terminal dashboard

pub mod board;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod output;
pub mod paging;
pub mod query;
pub mod record;
pub mod table;
pub mod ui;
pub mod upstream;

pub use error::{Error, Result};
