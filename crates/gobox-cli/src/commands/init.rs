//! `gobox-cgroup init` — Attach a process and apply its resource limits.

use clap::Args;
use gobox_common::config::HierarchyConfig;
use gobox_common::types::{ContainerId, Controller, ProcessHandle, ResourceLimits};
use gobox_core::cgroup::CgroupManager;

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Process to constrain. Defaults to this process.
    #[arg(long)]
    pub pid: Option<String>,

    /// Container identifier, used as the cgroup directory name.
    /// A random one is generated when omitted.
    #[arg(long)]
    pub id: Option<String>,

    /// Maximum number of processes (`max` for no limit).
    #[arg(long, allow_hyphen_values = true)]
    pub pids_max: String,

    /// CFS quota in microseconds per period (`-1` for no limit).
    #[arg(long, allow_hyphen_values = true)]
    pub cpu_quota: String,

    /// Memory ceiling in megabytes.
    #[arg(long)]
    pub memory: String,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Executes the `init` command.
///
/// # Errors
///
/// Returns an error naming the failed step. Directories created before
/// the failure are left for `gobox-cgroup release`.
pub fn execute(args: InitArgs, config: HierarchyConfig) -> anyhow::Result<()> {
    let pid = args.pid.map_or_else(
        || ProcessHandle::from(nix::unistd::getpid().as_raw()),
        ProcessHandle::new,
    );
    let id = args.id.map_or_else(ContainerId::generate, ContainerId::new);
    let limits = ResourceLimits::new(args.pids_max, args.cpu_quota, args.memory);

    let manager = CgroupManager::from_config(config.clone());
    if let Err(e) = manager.init(&pid, &id, &limits) {
        eprintln!("  {RED}{BOLD}Failed{RESET} at step {BOLD}{}{RESET}", e.step);
        eprintln!("  {DIM}Run `gobox-cgroup release --id {id}` to remove partial state.{RESET}");
        return Err(e.into());
    }

    eprintln!("  {GREEN}{BOLD}Ready{RESET} container {BOLD}{id}{RESET} (pid {pid})");
    for controller in Controller::ALL {
        eprintln!(
            "    {GREEN}●{RESET} {controller:<6} {DIM}{}{RESET}",
            config.container_dir(controller, &id).display()
        );
    }
    Ok(())
}
