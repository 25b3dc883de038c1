//! Command line arguments.

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "trellis")]
#[command(version, about = "Resolve and cache content hierarchies")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (toml, yaml or json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report what would change without writing to the cache
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete cache entries by key, folder or route
    Invalidate(InvalidateArgs),

    /// Evict stale and rarely used cache entries
    Cleanup(CleanupArgs),

    /// Manage route mappings
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },

    /// Resolve a local directory tree through the cache
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["key", "folder", "route_type"])))]
pub struct InvalidateArgs {
    /// Exact cache key
    #[arg(long)]
    pub key: Option<String>,

    /// Every entry built from this folder id
    #[arg(long)]
    pub folder: Option<String>,

    /// Every entry of every mapping with this route type
    #[arg(long)]
    pub route_type: Option<String>,

    /// Narrow --route-type to a single mapping
    #[arg(long, requires = "route_type", conflicts_with_all = ["key", "folder"])]
    pub route_subtype: Option<String>,
}

/// Unset values fall back to the `[cleanup]` config section.
#[derive(Debug, Args)]
pub struct CleanupArgs {
    #[arg(long)]
    pub max_age_days: Option<u32>,

    #[arg(long)]
    pub low_usage_threshold: Option<u32>,

    #[arg(long)]
    pub low_usage_age_days: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum MappingCommand {
    /// Map a route to a provider folder, replacing any existing mapping
    Add {
        route_type: String,
        route_subtype: String,
        folder_id: String,
    },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Folder id relative to --dir ("." for the directory itself)
    pub root_id: String,

    /// Directory served as the provider
    #[arg(long)]
    pub dir: PathBuf,

    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Rebuild even if a cached copy exists
    #[arg(long)]
    pub refresh: bool,
}
