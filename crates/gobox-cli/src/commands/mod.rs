//! CLI command definitions and dispatch.

pub mod init;
pub mod release;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gobox_common::config::HierarchyConfig;
use gobox_common::constants::CGROUP_ROOT_ENV;

/// gobox-cgroup — cgroup v1 resource limits for gobox containers.
#[derive(Parser, Debug)]
#[command(name = "gobox-cgroup", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON file describing the controller roots.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `cpu`, `pids` and `memory` controller roots.
    #[arg(long, global = true, env = CGROUP_ROOT_ENV)]
    pub cgroup_root: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach a process to a container's cgroups and apply its limits.
    Init(init::InitArgs),
    /// Remove a container's cgroup directories.
    Release(release::ReleaseArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = hierarchy_config(&cli)?;
    match cli.command {
        Command::Init(args) => init::execute(args, config),
        Command::Release(args) => release::execute(&args, config),
    }
}

/// Resolves the controller roots: `--config`, then `--cgroup-root`, then
/// the host defaults.
fn hierarchy_config(cli: &Cli) -> anyhow::Result<HierarchyConfig> {
    if let Some(path) = &cli.config {
        return Ok(HierarchyConfig::load(path)?);
    }
    Ok(cli
        .cgroup_root
        .as_deref()
        .map_or_else(HierarchyConfig::default, HierarchyConfig::under))
}
