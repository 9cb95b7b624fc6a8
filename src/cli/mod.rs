//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::query::SortKey;
use crate::upstream::{Credentials, UpstreamClient};

mod board;
mod config;
mod load;
mod table;
mod view;

/// taskboard - team task dashboard
///
/// Pulls paginated todos from the upstream GraphQL service and shows them
/// as per-assignee buckets or as a sortable flat table.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to taskboard.toml (defaults to ./taskboard.toml, then the user config dir)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// GraphQL endpoint override
    #[arg(long, global = true, env = "TASKBOARD_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Upstream token id
    #[arg(long, global = true, env = "TASKBOARD_TOKEN_ID", hide_env_values = true)]
    pub token_id: Option<String>,

    /// Upstream token secret
    #[arg(long, global = true, env = "TASKBOARD_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show each tracked assignee's highest-priority tasks
    Board {
        #[command(flatten)]
        pages: PageArgs,
    },

    /// Show one row per task and assignee, filtered and sorted
    Table {
        #[command(flatten)]
        pages: PageArgs,

        /// Case-insensitive substring match on the title
        #[arg(long)]
        search: Option<String>,

        /// Only rows in this stage
        #[arg(long)]
        stage: Option<String>,

        /// Sort column
        #[arg(long, value_enum, default_value = "priority")]
        sort: SortKey,

        /// Sort ascending
        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending (default)
        #[arg(long)]
        desc: bool,

        /// Keep completed tasks
        #[arg(long, conflicts_with = "exclude_done")]
        include_done: bool,

        /// Drop completed tasks
        #[arg(long)]
        exclude_done: bool,
    },

    /// Open the interactive dashboard
    View,

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// How many pages a one-shot command loads
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Number of pages to load
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Load every available page
    #[arg(long, conflicts_with = "pages")]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default taskboard.toml
    Init {
        /// Destination (defaults to ./taskboard.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub credentials: Credentials,
    pub output: OutputOptions,
}

impl GlobalOptions {
    /// Discover the config file and apply command-line overrides.
    pub fn load_config(&self) -> Result<(Config, Option<PathBuf>)> {
        let (mut config, path) = Config::discover(self.config.as_deref())?;
        if let Some(endpoint) = self.endpoint.as_deref() {
            config.upstream.endpoint = endpoint.trim().to_string();
            config.validate()?;
        }
        Ok((config, path))
    }

    pub fn client(&self, config: &Config) -> Result<UpstreamClient> {
        UpstreamClient::new(&config.upstream, self.credentials.clone())
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = GlobalOptions {
            config: self.config,
            endpoint: self.endpoint,
            credentials: Credentials {
                token_id: self.token_id.filter(|value| !value.trim().is_empty()),
                token_secret: self.token_secret.filter(|value| !value.trim().is_empty()),
            },
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        };

        match self.command {
            Commands::Board { pages } => board::run(board::BoardOptions {
                pages: pages.into(),
                global,
            }),
            Commands::Table {
                pages,
                search,
                stage,
                sort,
                asc,
                desc: _,
                include_done,
                exclude_done,
            } => table::run(table::TableOptions {
                pages: pages.into(),
                search,
                stage,
                sort,
                ascending: asc,
                exclude_done: if include_done {
                    Some(false)
                } else if exclude_done {
                    Some(true)
                } else {
                    None
                },
                global,
            }),
            Commands::View => view::run(view::ViewOptions { global }),
            Commands::Config(cmd) => match cmd {
                ConfigCommands::Show => config::run_show(config::ShowOptions { global }),
                ConfigCommands::Init { path, force } => {
                    config::run_init(config::InitOptions { path, force, global })
                }
            },
        }
    }
}

impl From<PageArgs> for load::PageLimit {
    fn from(args: PageArgs) -> Self {
        if args.all {
            load::PageLimit::All
        } else {
            load::PageLimit::Pages(args.pages as usize)
        }
    }
}
