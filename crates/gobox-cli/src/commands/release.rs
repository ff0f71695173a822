//! `gobox-cgroup release` — Remove a container's cgroup directories.

use clap::Args;
use gobox_common::config::HierarchyConfig;
use gobox_common::types::ContainerId;
use gobox_core::cgroup::CgroupManager;

/// Arguments for the `release` command.
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Container identifier passed to `init`.
    #[arg(long)]
    pub id: String,
}

/// Executes the `release` command.
///
/// # Errors
///
/// Returns an error if a directory exists but cannot be removed, for
/// example because processes are still attached to it.
pub fn execute(args: &ReleaseArgs, config: HierarchyConfig) -> anyhow::Result<()> {
    let id = ContainerId::new(args.id.as_str());
    CgroupManager::from_config(config).release(&id)?;
    eprintln!("  Released cgroups of {id}");
    Ok(())
}
