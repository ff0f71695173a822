//! Cgroup v1 resource management.
//!
//! A container gets one directory per controller, at
//! `<controller root>/gobox/<container id>`. Initialization runs as a fixed
//! pipeline of [`Step`]s: create the three directories, attach the process
//! to each, then apply the CPU, process-count and memory limits in that
//! order. The first failing step ends the run. Nothing is rolled back;
//! [`CgroupManager::release`] is the caller's teardown.

pub mod cpu;
pub mod event;
pub mod hierarchy;
pub mod memory;
pub mod pids;

use std::fmt;

use gobox_common::config::HierarchyConfig;
use gobox_common::constants::{CGROUP_PROCS, NOTIFY_ON_RELEASE};
use gobox_common::error::{GoboxError, Result};
use gobox_common::types::{ContainerId, Controller, ProcessHandle, ResourceLimits};
use thiserror::Error;

use self::event::{CgroupEvent, CgroupObserver, TracingObserver};
use self::hierarchy::{ControllerHierarchy, FsHierarchy};

/// Progress of a container through cgroup initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CgroupState {
    /// Nothing has been written yet.
    Uninitialized,
    /// All controller directories exist.
    DirectoriesCreated,
    /// The process is attached to every controller.
    ProcessAttached,
    /// The CPU quota is applied.
    CpuConfigured,
    /// The process-count ceiling is applied.
    PidConfigured,
    /// The memory limits are applied; the container is isolated.
    Ready,
    /// A step failed. Terminal.
    Failed,
}

impl fmt::Display for CgroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::DirectoriesCreated => "directories-created",
            Self::ProcessAttached => "process-attached",
            Self::CpuConfigured => "cpu-configured",
            Self::PidConfigured => "pid-configured",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One stage of the initialization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Create the container directory under every controller.
    CreateDirectories,
    /// Enable auto-release and attach the process under every controller.
    AttachProcess,
    /// Apply the CPU quota.
    Cpu,
    /// Apply the process-count ceiling.
    Pids,
    /// Apply the kernel-memory and total memory limits.
    Memory,
}

impl Step {
    /// The pipeline, in execution order.
    pub const PIPELINE: [Self; 5] = [
        Self::CreateDirectories,
        Self::AttachProcess,
        Self::Cpu,
        Self::Pids,
        Self::Memory,
    ];

    /// State reached once this step succeeds.
    #[must_use]
    pub const fn reached(self) -> CgroupState {
        match self {
            Self::CreateDirectories => CgroupState::DirectoriesCreated,
            Self::AttachProcess => CgroupState::ProcessAttached,
            Self::Cpu => CgroupState::CpuConfigured,
            Self::Pids => CgroupState::PidConfigured,
            Self::Memory => CgroupState::Ready,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateDirectories => "create-directories",
            Self::AttachProcess => "attach-process",
            Self::Cpu => "cpu",
            Self::Pids => "pids",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

/// Failure of one pipeline step.
#[derive(Debug, Error)]
#[error("cgroup step `{step}` failed: {source}")]
pub struct StepError {
    /// Step that failed.
    pub step: Step,
    /// Underlying error, naming the path and value involved.
    #[source]
    pub source: GoboxError,
}

/// Everything a configurator needs to touch one container's control files.
pub struct Target<'a> {
    hierarchy: &'a dyn ControllerHierarchy,
    observer: &'a dyn CgroupObserver,
    pid: &'a ProcessHandle,
    id: &'a ContainerId,
}

impl<'a> Target<'a> {
    /// Binds a hierarchy and observer to one process and container.
    #[must_use]
    pub fn new(
        hierarchy: &'a dyn ControllerHierarchy,
        observer: &'a dyn CgroupObserver,
        pid: &'a ProcessHandle,
        id: &'a ContainerId,
    ) -> Self {
        Self {
            hierarchy,
            observer,
            pid,
            id,
        }
    }

    /// Process being constrained.
    #[must_use]
    pub const fn pid(&self) -> &ProcessHandle {
        self.pid
    }

    /// Container being configured.
    #[must_use]
    pub const fn container_id(&self) -> &ContainerId {
        self.id
    }

    /// Writes a control file.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Write`] if the hierarchy refuses the write.
    pub fn write(&self, controller: Controller, file: &str, value: &str) -> Result<()> {
        self.hierarchy
            .write_control_file(controller, self.id, file, value)?;
        self.observer.on_event(&CgroupEvent::ControlFileWritten {
            controller,
            file,
            value,
        });
        Ok(())
    }

    /// Writes a control file and reports what the hierarchy reads back.
    ///
    /// The read-back only feeds the observer; an unreadable file is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Write`] if the hierarchy refuses the write.
    pub fn apply(&self, controller: Controller, file: &str, value: &str) -> Result<()> {
        self.write(controller, file, value)?;
        if let Some(content) = self.hierarchy.read_control_file(controller, self.id, file) {
            self.observer.on_event(&CgroupEvent::ControlFileRead {
                controller,
                file,
                content: &content,
            });
        }
        Ok(())
    }
}

/// Applies gobox resource limits through a [`ControllerHierarchy`].
pub struct CgroupManager<H> {
    hierarchy: H,
    observer: Box<dyn CgroupObserver + Send + Sync>,
}

impl<H: fmt::Debug> fmt::Debug for CgroupManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CgroupManager")
            .field("hierarchy", &self.hierarchy)
            .finish_non_exhaustive()
    }
}

impl CgroupManager<FsHierarchy> {
    /// Creates a manager for the hierarchy described by `config`.
    #[must_use]
    pub fn from_config(config: HierarchyConfig) -> Self {
        Self::new(FsHierarchy::new(config))
    }
}

impl<H: ControllerHierarchy> CgroupManager<H> {
    /// Creates a manager that logs progress with `tracing`.
    pub fn new(hierarchy: H) -> Self {
        Self {
            hierarchy,
            observer: Box::new(TracingObserver),
        }
    }

    /// Replaces the observer that receives progress events.
    #[must_use]
    pub fn with_observer(mut self, observer: impl CgroupObserver + Send + Sync + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Returns the underlying hierarchy.
    pub const fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// Places `pid` under the container's cgroups and applies `limits`.
    ///
    /// Returns [`CgroupState::Ready`] once every step has succeeded.
    ///
    /// # Errors
    ///
    /// Returns the first failing step with its cause. Directories and limits
    /// written before the failure stay in place. An invalid container ID
    /// fails [`Step::CreateDirectories`] before anything is created.
    pub fn init(
        &self,
        pid: &ProcessHandle,
        id: &ContainerId,
        limits: &ResourceLimits,
    ) -> std::result::Result<CgroupState, StepError> {
        self.observer.on_event(&CgroupEvent::Started {
            container_id: id,
            pid,
            limits,
        });

        let target = Target::new(&self.hierarchy, self.observer.as_ref(), pid, id);
        let mut state = CgroupState::Uninitialized;
        for step in Step::PIPELINE {
            if let Err(source) = self.run_step(step, &target, limits) {
                self.transition(&mut state, CgroupState::Failed);
                self.observer.on_event(&CgroupEvent::Failed {
                    step,
                    error: &source,
                });
                return Err(StepError { step, source });
            }
            self.transition(&mut state, step.reached());
        }

        self.observer
            .on_event(&CgroupEvent::Finished { container_id: id });
        Ok(state)
    }

    /// Removes the container's directory under every controller.
    ///
    /// Meant for the caller's teardown, including after a failed
    /// [`CgroupManager::init`]. Missing directories are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Config`] for an ID that does not name a single
    /// directory, or the first directory that could not be removed.
    pub fn release(&self, id: &ContainerId) -> Result<()> {
        id.validate()?;
        for controller in Controller::ALL {
            self.hierarchy.remove_container_dir(controller, id)?;
        }
        self.observer
            .on_event(&CgroupEvent::Released { container_id: id });
        Ok(())
    }

    fn run_step(&self, step: Step, target: &Target<'_>, limits: &ResourceLimits) -> Result<()> {
        match step {
            Step::CreateDirectories => {
                target.container_id().validate()?;
                Controller::ALL
                    .into_iter()
                    .try_for_each(|c| self.hierarchy.ensure_container_dir(c, target.container_id()))
            }
            Step::AttachProcess => Controller::ALL.into_iter().try_for_each(|c| {
                target.write(c, NOTIFY_ON_RELEASE, "1")?;
                target.write(c, CGROUP_PROCS, target.pid().as_str())
            }),
            Step::Cpu => cpu::configure(target, limits),
            Step::Pids => pids::configure(target, limits),
            Step::Memory => memory::configure(target, limits),
        }
    }

    fn transition(&self, state: &mut CgroupState, to: CgroupState) {
        let from = std::mem::replace(state, to);
        self.observer.on_event(&CgroupEvent::Transition { from, to });
    }
}

/// Initializes the cgroups of a container on the host's default hierarchy.
///
/// Takes every value as the text the control files receive.
///
/// # Errors
///
/// Returns the first failing step with its cause.
pub fn init_cgroups(
    pid: &str,
    container_id: &str,
    pids_max: &str,
    cpu_quota_us: &str,
    memory_mb: &str,
) -> std::result::Result<CgroupState, StepError> {
    CgroupManager::from_config(HierarchyConfig::default()).init(
        &ProcessHandle::new(pid),
        &ContainerId::new(container_id),
        &ResourceLimits::new(pids_max, cpu_quota_us, memory_mb),
    )
}
