//! Access to the per-container control directories.
//!
//! The configurators only talk to [`ControllerHierarchy`]. [`FsHierarchy`]
//! writes to the real cgroup mounts (or any directory tree configured in
//! their place); [`InMemoryHierarchy`] keeps everything in a map.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use gobox_common::config::HierarchyConfig;
use gobox_common::error::{GoboxError, Result};
use gobox_common::types::{ContainerId, Controller};

/// Operations the cgroup pipeline needs from a controller hierarchy.
pub trait ControllerHierarchy {
    /// Creates the container's directory under a controller, with any
    /// missing parents. An existing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::DirectoryCreation`] if the directory cannot be
    /// created.
    fn ensure_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()>;

    /// Writes `value` into a control file of the container's directory.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Write`] if the write is refused.
    fn write_control_file(
        &self,
        controller: Controller,
        id: &ContainerId,
        file: &str,
        value: &str,
    ) -> Result<()>;

    /// Reads a control file back. Any failure yields `None`.
    fn read_control_file(&self, controller: Controller, id: &ContainerId, file: &str)
    -> Option<String>;

    /// Removes the container's directory under a controller. A directory
    /// that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GoboxError::Io`] if the directory exists but cannot be
    /// removed.
    fn remove_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()>;
}

/// Hierarchy backed by directories on disk.
#[derive(Debug, Clone, Default)]
pub struct FsHierarchy {
    config: HierarchyConfig,
}

impl FsHierarchy {
    /// Creates a hierarchy rooted at the locations in `config`.
    #[must_use]
    pub const fn new(config: HierarchyConfig) -> Self {
        Self { config }
    }

    /// Returns the root table in use.
    #[must_use]
    pub const fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Returns the container's directory under a controller.
    #[must_use]
    pub fn container_dir(&self, controller: Controller, id: &ContainerId) -> PathBuf {
        self.config.container_dir(controller, id)
    }
}

impl ControllerHierarchy for FsHierarchy {
    fn ensure_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()> {
        let path = self.container_dir(controller, id);
        let mut builder = std::fs::DirBuilder::new();
        let _ = builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let _ = builder.mode(0o755);
        }
        builder
            .create(&path)
            .map_err(|e| GoboxError::DirectoryCreation { path, source: e })
    }

    fn write_control_file(
        &self,
        controller: Controller,
        id: &ContainerId,
        file: &str,
        value: &str,
    ) -> Result<()> {
        let path = self.container_dir(controller, id).join(file);
        std::fs::write(&path, value).map_err(|e| GoboxError::Write {
            path,
            value: value.to_owned(),
            source: e,
        })
    }

    fn read_control_file(
        &self,
        controller: Controller,
        id: &ContainerId,
        file: &str,
    ) -> Option<String> {
        std::fs::read_to_string(self.container_dir(controller, id).join(file)).ok()
    }

    fn remove_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()> {
        let path = self.container_dir(controller, id);
        // cgroupfs directories go away with rmdir even while their control
        // files are listed; a plain directory tree needs its files removed.
        let removed = match std::fs::remove_dir(&path) {
            Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
                std::fs::remove_dir_all(&path)
            }
            other => other,
        };
        match removed {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GoboxError::Io { path, source: e }),
        }
    }
}

/// A control-file write recorded by [`InMemoryHierarchy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Controller the file belongs to.
    pub controller: Controller,
    /// Container directory name.
    pub container: String,
    /// Control file name.
    pub file: String,
    /// Value written.
    pub value: String,
}

type FileKey = (Controller, String, String);

#[derive(Debug, Default)]
struct Store {
    dirs: BTreeSet<(Controller, String)>,
    files: BTreeMap<FileKey, String>,
    writes: Vec<WriteRecord>,
    failing_files: HashSet<(Controller, String)>,
    failing_dirs: HashSet<Controller>,
}

/// Hierarchy held in memory, for tests and dry runs.
///
/// Writes into a directory that was never created fail, as they do on the
/// kernel's filesystem. Failures can also be injected per control file or
/// per controller directory.
#[derive(Debug, Default)]
pub struct InMemoryHierarchy {
    store: Mutex<Store>,
}

impl InMemoryHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later write to `file` under `controller` fail.
    pub fn fail_writes_to(&self, controller: Controller, file: &str) {
        let _ = self.store().failing_files.insert((controller, file.to_owned()));
    }

    /// Makes directory creation under `controller` fail.
    pub fn fail_dirs_under(&self, controller: Controller) {
        let _ = self.store().failing_dirs.insert(controller);
    }

    /// Returns every successful write, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.store().writes.clone()
    }

    /// Returns the current content of a control file.
    #[must_use]
    pub fn file(&self, controller: Controller, id: &ContainerId, file: &str) -> Option<String> {
        self.store()
            .files
            .get(&(controller, id.as_str().to_owned(), file.to_owned()))
            .cloned()
    }

    /// Returns whether the container's directory exists under a controller.
    #[must_use]
    pub fn has_dir(&self, controller: Controller, id: &ContainerId) -> bool {
        self.store().dirs.contains(&(controller, id.as_str().to_owned()))
    }

    fn virtual_path(controller: Controller, id: &ContainerId, file: &str) -> PathBuf {
        PathBuf::from(controller.name()).join(id.as_str()).join(file)
    }
}

impl ControllerHierarchy for InMemoryHierarchy {
    fn ensure_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()> {
        let mut store = self.store();
        if store.failing_dirs.contains(&controller) {
            return Err(GoboxError::DirectoryCreation {
                path: Self::virtual_path(controller, id, ""),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"),
            });
        }
        let _ = store.dirs.insert((controller, id.as_str().to_owned()));
        Ok(())
    }

    fn write_control_file(
        &self,
        controller: Controller,
        id: &ContainerId,
        file: &str,
        value: &str,
    ) -> Result<()> {
        let mut store = self.store();
        let refusal = if store.failing_files.contains(&(controller, file.to_owned())) {
            Some(io::Error::new(io::ErrorKind::PermissionDenied, "injected failure"))
        } else if !store.dirs.contains(&(controller, id.as_str().to_owned())) {
            Some(io::Error::from(io::ErrorKind::NotFound))
        } else {
            None
        };
        if let Some(source) = refusal {
            return Err(GoboxError::Write {
                path: Self::virtual_path(controller, id, file),
                value: value.to_owned(),
                source,
            });
        }
        let _ = store.files.insert(
            (controller, id.as_str().to_owned(), file.to_owned()),
            value.to_owned(),
        );
        store.writes.push(WriteRecord {
            controller,
            container: id.as_str().to_owned(),
            file: file.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn read_control_file(
        &self,
        controller: Controller,
        id: &ContainerId,
        file: &str,
    ) -> Option<String> {
        self.file(controller, id, file)
    }

    fn remove_container_dir(&self, controller: Controller, id: &ContainerId) -> Result<()> {
        let mut store = self.store();
        let name = id.as_str().to_owned();
        let _ = store.dirs.remove(&(controller, name.clone()));
        store
            .files
            .retain(|(c, container, _), _| !(*c == controller && *container == name));
        Ok(())
    }
}
