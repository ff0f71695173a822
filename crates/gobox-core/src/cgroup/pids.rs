//! Process-count control via the cgroup v1 `pids` controller.

use gobox_common::constants::PIDS_MAX;
use gobox_common::error::Result;
use gobox_common::types::{Controller, ResourceLimits};

use super::Target;

/// Sets `pids.max` for the container.
///
/// The ceiling is written verbatim, so the `max` sentinel keeps the group
/// unbounded.
///
/// # Errors
///
/// Returns an error if writing `pids.max` fails.
pub fn configure(target: &Target<'_>, limits: &ResourceLimits) -> Result<()> {
    target.apply(Controller::Pids, PIDS_MAX, &limits.pids_max)?;
    tracing::debug!(pids_max = %limits.pids_max, "process limit set");
    Ok(())
}
