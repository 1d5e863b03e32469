// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line interface for `snip`.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use snip_core::{Outcome, Snippet};
use tracing::{info, warn};

use crate::cache::{FileSnapshotCache, SnapshotCache};
use crate::config::{Configuration, EngineConfig};
use crate::error::{Error, Result};
use crate::handle::SyncBuilder;
use crate::orchestrator::SyncOutcome;

#[derive(Parser, Debug)]
#[command(name = "snip")]
#[command(about = "Keep a live, reconciled view of remotely configured snippets")]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load snippets and print every outcome as it arrives
    Watch(WatchArgs),

    /// Manage the snapshot cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["org", "share"])))]
pub struct WatchArgs {
    /// Organization owning the project
    #[arg(long, requires = "project")]
    pub org: Option<String>,

    /// Project to sync
    #[arg(long, requires = "org")]
    pub project: Option<String>,

    /// Share token of a single snippet
    #[arg(long, conflicts_with_all = ["org", "project"])]
    pub share: Option<String>,
}

impl WatchArgs {
    pub fn configuration(&self) -> Option<Configuration> {
        match (&self.org, &self.project, &self.share) {
            (Some(org), Some(project), None) => Some(Configuration::project(org, project)),
            (None, None, Some(token)) => Some(Configuration::shared(token)),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Remove every cached snapshot
    Clear,
}

/// Executes a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Watch(args) => {
            let configuration = args.configuration().ok_or_else(|| {
                Error::Config("pass either --org and --project, or --share".to_string())
            })?;
            watch(configuration, config).await
        }
        Command::Cache {
            command: CacheCommand::Clear,
        } => {
            let cache = FileSnapshotCache::new(config.cache_dir());
            cache.clear()?;
            println!("Cleared snapshots in {}", cache.dir().display());
            Ok(())
        }
    }
}

async fn watch(configuration: Configuration, config: EngineConfig) -> Result<()> {
    let sync = SyncBuilder::new(configuration)
        .config(config)
        .on_unauthorized(|| warn!("real-time channel refused credentials"))
        .build()?;
    sync.register()?;

    let mut outcomes = sync.outcomes();
    loop {
        tokio::select! {
            outcome = outcomes.next() => match outcome {
                Some(outcome) => println!("{}", format_outcome(&outcome)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// One line per outcome: state, snippet ids and, for errors, the cause.
pub fn format_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        Outcome::Progress { data } => format!("progress {}", describe(data.as_deref())),
        Outcome::Success { data } => format!("success {}", describe(Some(data.as_slice()))),
        Outcome::Error { cause, data } => {
            format!("error {}: {}", describe(data.as_deref()), cause)
        }
    }
}

fn describe(list: Option<&[Snippet]>) -> String {
    match list {
        None => "-".to_string(),
        Some(list) => {
            let ids: Vec<&str> = list.iter().map(|s| s.id.as_str()).collect();
            format!("[{}]", ids.join(", "))
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
