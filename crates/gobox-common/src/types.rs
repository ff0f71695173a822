//! Domain primitive types used across the gobox workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GoboxError, Result};

/// Unique identifier for a container instance.
///
/// Used verbatim as a directory name under every controller root, so it
/// must be unique among containers running on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the ID names exactly one directory below the namespace.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Config`] for an empty ID, `.`, `..`, or an ID
    /// containing a path separator.
    pub fn validate(&self) -> Result<()> {
        let id = self.0.as_str();
        if id.is_empty() || id == "." || id == ".." {
            return Err(GoboxError::Config {
                message: format!("container id is not a directory name: {id:?}"),
            });
        }
        if id.contains('/') || id.contains(std::path::MAIN_SEPARATOR) || id.contains('\0') {
            return Err(GoboxError::Config {
                message: format!("container id must be a single path segment: {id:?}"),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Textual process id of the process being constrained.
///
/// Kept as text: the kernel is the only validator of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle(String);

impl ProcessHandle {
    /// Creates a process handle from its textual form.
    #[must_use]
    pub fn new(pid: impl Into<String>) -> Self {
        Self(pid.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i32> for ProcessHandle {
    fn from(pid: i32) -> Self {
        Self(pid.to_string())
    }
}

impl From<u32> for ProcessHandle {
    fn from(pid: u32) -> Self {
        Self(pid.to_string())
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource limits for a container, as the text each control file receives.
///
/// None of the values are parsed: sentinels such as `max` for `pids.max`
/// or `-1` for `cpu.cfs_quota_us` pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of processes (`pids.max`).
    pub pids_max: String,
    /// CFS quota in microseconds per period (`cpu.cfs_quota_us`).
    pub cpu_quota_us: String,
    /// Memory ceiling in megabytes, without unit suffix.
    pub memory_mb: String,
}

impl ResourceLimits {
    /// Creates a limit bundle from its three textual values.
    #[must_use]
    pub fn new(
        pids_max: impl Into<String>,
        cpu_quota_us: impl Into<String>,
        memory_mb: impl Into<String>,
    ) -> Self {
        Self {
            pids_max: pids_max.into(),
            cpu_quota_us: cpu_quota_us.into(),
            memory_mb: memory_mb.into(),
        }
    }

    /// Returns the value written to `memory.limit_in_bytes`, e.g. `"512m"`.
    #[must_use]
    pub fn memory_limit_value(&self) -> String {
        format!("{}{}", self.memory_mb, crate::constants::MEGABYTE_SUFFIX)
    }
}

/// A cgroup v1 resource controller managed by gobox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Controller {
    /// CPU bandwidth controller.
    Cpu,
    /// Process-count controller.
    Pids,
    /// Memory controller.
    Memory,
}

impl Controller {
    /// Every controller, in initialization order.
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Pids, Self::Memory];

    /// Kernel subsystem name of the controller.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Pids => "pids",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
