//! Progress events emitted while a container's cgroups are configured.
//!
//! The pipeline reports through a [`CgroupObserver`] instead of writing to
//! a stream. [`TracingObserver`] forwards events to `tracing`; any closure
//! taking a `&CgroupEvent` is an observer too.

use gobox_common::error::GoboxError;
use gobox_common::types::{ContainerId, Controller, ProcessHandle, ResourceLimits};

use super::{CgroupState, Step};

/// A cgroup initialization event.
#[derive(Debug)]
pub enum CgroupEvent<'a> {
    /// Initialization started.
    Started {
        /// Container being configured.
        container_id: &'a ContainerId,
        /// Process being constrained.
        pid: &'a ProcessHandle,
        /// Requested limits.
        limits: &'a ResourceLimits,
    },
    /// The container moved to a new state.
    Transition {
        /// Previous state.
        from: CgroupState,
        /// New state.
        to: CgroupState,
    },
    /// A control file was written.
    ControlFileWritten {
        /// Controller the file belongs to.
        controller: Controller,
        /// Control file name.
        file: &'a str,
        /// Value written.
        value: &'a str,
    },
    /// A control file was read back after a write.
    ControlFileRead {
        /// Controller the file belongs to.
        controller: Controller,
        /// Control file name.
        file: &'a str,
        /// Content as reported by the hierarchy.
        content: &'a str,
    },
    /// A step failed and initialization stopped.
    Failed {
        /// Step that failed.
        step: Step,
        /// Cause of the failure.
        error: &'a GoboxError,
    },
    /// Every step succeeded.
    Finished {
        /// Container that is now resource-isolated.
        container_id: &'a ContainerId,
    },
    /// The container's directories were removed.
    Released {
        /// Container that was torn down.
        container_id: &'a ContainerId,
    },
}

/// Receives [`CgroupEvent`]s.
pub trait CgroupObserver {
    /// Called once per event, synchronously, from the pipeline.
    fn on_event(&self, event: &CgroupEvent<'_>);
}

impl<F> CgroupObserver for F
where
    F: Fn(&CgroupEvent<'_>),
{
    fn on_event(&self, event: &CgroupEvent<'_>) {
        self(event);
    }
}

/// Observer that logs every event with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CgroupObserver for TracingObserver {
    fn on_event(&self, event: &CgroupEvent<'_>) {
        match event {
            CgroupEvent::Started {
                container_id,
                pid,
                limits,
            } => tracing::info!(
                container_id = %container_id,
                pid = %pid,
                pids_max = %limits.pids_max,
                cpu_quota_us = %limits.cpu_quota_us,
                memory_mb = %limits.memory_mb,
                "initializing cgroups"
            ),
            CgroupEvent::Transition { from, to } => {
                tracing::debug!(from = %from, to = %to, "cgroup state changed");
            }
            CgroupEvent::ControlFileWritten {
                controller,
                file,
                value,
            } => tracing::debug!(controller = %controller, file, value, "control file written"),
            CgroupEvent::ControlFileRead {
                controller,
                file,
                content,
            } => tracing::debug!(
                controller = %controller,
                file,
                content = content.trim_end(),
                "control file content"
            ),
            CgroupEvent::Failed { step, error } => {
                tracing::error!(step = %step, error = %error, "cgroup initialization failed");
            }
            CgroupEvent::Finished { container_id } => {
                tracing::info!(container_id = %container_id, "cgroups initialized");
            }
            CgroupEvent::Released { container_id } => {
                tracing::info!(container_id = %container_id, "cgroups released");
            }
        }
    }
}
