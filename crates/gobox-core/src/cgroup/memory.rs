//! Memory control via the cgroup v1 `memory` controller.
//!
//! Manages `memory.kmem.limit_in_bytes`, `memory.limit_in_bytes`, and
//! re-attaches the process through `tasks`.

use gobox_common::constants::{KMEM_LIMIT_VALUE, MEMORY_KMEM_LIMIT, MEMORY_LIMIT, TASKS};
use gobox_common::error::Result;
use gobox_common::types::{Controller, ResourceLimits};

use super::Target;

/// Applies the fixed kernel-memory limit, attaches the process, and sets
/// the total memory limit to `<memory_mb>m`.
///
/// # Errors
///
/// Returns an error on the first write that fails; later writes are not
/// attempted.
pub fn configure(target: &Target<'_>, limits: &ResourceLimits) -> Result<()> {
    let limit = limits.memory_limit_value();
    target.apply(Controller::Memory, MEMORY_KMEM_LIMIT, KMEM_LIMIT_VALUE)?;
    target.apply(Controller::Memory, TASKS, target.pid().as_str())?;
    target.apply(Controller::Memory, MEMORY_LIMIT, &limit)?;
    tracing::debug!(limit = %limit, kmem = KMEM_LIMIT_VALUE, "memory limits set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use gobox_common::types::{ContainerId, ProcessHandle};

    use super::*;
    use crate::cgroup::event::TracingObserver;
    use crate::cgroup::hierarchy::{ControllerHierarchy, InMemoryHierarchy};

    fn prepared(id: &ContainerId) -> InMemoryHierarchy {
        let hierarchy = InMemoryHierarchy::new();
        hierarchy
            .ensure_container_dir(Controller::Memory, id)
            .expect("create");
        hierarchy
    }

    #[test]
    fn limit_gets_megabyte_suffix_and_kmem_is_fixed() {
        let id = ContainerId::new("c1");
        let pid = ProcessHandle::new("4321");
        let hierarchy = prepared(&id);
        let target = Target::new(&hierarchy, &TracingObserver, &pid, &id);

        configure(&target, &ResourceLimits::new("50", "20000", "512")).expect("configure");

        assert_eq!(
            hierarchy.file(Controller::Memory, &id, MEMORY_LIMIT).as_deref(),
            Some("512m")
        );
        assert_eq!(
            hierarchy.file(Controller::Memory, &id, MEMORY_KMEM_LIMIT).as_deref(),
            Some("64m")
        );
        assert_eq!(
            hierarchy.file(Controller::Memory, &id, TASKS).as_deref(),
            Some("4321")
        );
    }

    #[test]
    fn kmem_does_not_follow_requested_limit() {
        let id = ContainerId::new("c1");
        let pid = ProcessHandle::new("1");
        let hierarchy = prepared(&id);
        let target = Target::new(&hierarchy, &TracingObserver, &pid, &id);

        configure(&target, &ResourceLimits::new("50", "20000", "4096")).expect("configure");
        assert_eq!(
            hierarchy.file(Controller::Memory, &id, MEMORY_KMEM_LIMIT).as_deref(),
            Some("64m")
        );
    }

    #[test]
    fn failing_kmem_write_stops_remaining_writes() {
        let id = ContainerId::new("c1");
        let pid = ProcessHandle::new("1");
        let hierarchy = prepared(&id);
        hierarchy.fail_writes_to(Controller::Memory, MEMORY_KMEM_LIMIT);
        let target = Target::new(&hierarchy, &TracingObserver, &pid, &id);

        assert!(configure(&target, &ResourceLimits::new("50", "20000", "256")).is_err());
        assert!(hierarchy.writes().is_empty());
    }
}
