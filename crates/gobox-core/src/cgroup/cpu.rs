//! CPU bandwidth control via the cgroup v1 `cpu` controller.
//!
//! Manages `cpu.cfs_quota_us` and re-attaches the process through `tasks`.

use gobox_common::constants::{CPU_CFS_QUOTA_US, TASKS};
use gobox_common::error::Result;
use gobox_common::types::{Controller, ResourceLimits};

use super::Target;

/// Attaches the process to the CPU controller and sets its CFS quota.
///
/// The quota is written as given: `-1` leaves the group unbounded, any
/// other value is microseconds of CPU time per CFS period.
///
/// # Errors
///
/// Returns an error if writing `tasks` or `cpu.cfs_quota_us` fails. The
/// quota is not written when attaching fails.
pub fn configure(target: &Target<'_>, limits: &ResourceLimits) -> Result<()> {
    target.apply(Controller::Cpu, TASKS, target.pid().as_str())?;
    target.apply(Controller::Cpu, CPU_CFS_QUOTA_US, &limits.cpu_quota_us)?;
    tracing::debug!(quota_us = %limits.cpu_quota_us, "CPU quota set");
    Ok(())
}
