//! Location of the controller hierarchy.
//!
//! Each controller has its own root. Containers live at
//! `<root>/<namespace>/<container id>`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{GoboxError, Result};
use crate::types::{ContainerId, Controller};

/// Root table for the three controllers gobox configures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Mount point of the `cpu` controller.
    pub cpu_root: PathBuf,
    /// Mount point of the `pids` controller.
    pub pids_root: PathBuf,
    /// Mount point of the `memory` controller.
    pub memory_root: PathBuf,
    /// Segment between a controller root and container directories.
    pub namespace: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            cpu_root: PathBuf::from(constants::CGROUP_CPU_ROOT),
            pids_root: PathBuf::from(constants::CGROUP_PIDS_ROOT),
            memory_root: PathBuf::from(constants::CGROUP_MEMORY_ROOT),
            namespace: constants::CGROUP_NAMESPACE.to_owned(),
        }
    }
}

impl HierarchyConfig {
    /// Places all three controller roots under `base`, one subdirectory each.
    #[must_use]
    pub fn under(base: &Path) -> Self {
        Self {
            cpu_root: base.join(Controller::Cpu.name()),
            pids_root: base.join(Controller::Pids.name()),
            memory_root: base.join(Controller::Memory.name()),
            namespace: constants::CGROUP_NAMESPACE.to_owned(),
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// fails [`HierarchyConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| GoboxError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the namespace is a single, non-empty path segment.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Config`] when the namespace is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(GoboxError::Config {
                message: "cgroup namespace must not be empty".into(),
            });
        }
        if self.namespace.contains(std::path::MAIN_SEPARATOR) || self.namespace.contains('/') {
            return Err(GoboxError::Config {
                message: format!("cgroup namespace must be a single segment: {}", self.namespace),
            });
        }
        Ok(())
    }

    /// Returns the mount point of a controller.
    #[must_use]
    pub fn root(&self, controller: Controller) -> &Path {
        match controller {
            Controller::Cpu => &self.cpu_root,
            Controller::Pids => &self.pids_root,
            Controller::Memory => &self.memory_root,
        }
    }

    /// Returns the directory of a container under a controller.
    #[must_use]
    pub fn container_dir(&self, controller: Controller, id: &ContainerId) -> PathBuf {
        self.root(controller).join(&self.namespace).join(id.as_str())
    }
}
