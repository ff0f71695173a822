//! System-wide constants and default paths.

/// Default mount point of the cgroup v1 `cpu` controller.
pub const CGROUP_CPU_ROOT: &str = "/sys/fs/cgroup/cpu";

/// Default mount point of the cgroup v1 `pids` controller.
pub const CGROUP_PIDS_ROOT: &str = "/sys/fs/cgroup/pids";

/// Default mount point of the cgroup v1 `memory` controller.
pub const CGROUP_MEMORY_ROOT: &str = "/sys/fs/cgroup/memory";

/// Namespace segment placed between a controller root and the container id.
pub const CGROUP_NAMESPACE: &str = "gobox";

/// Environment variable that redirects all controller roots under one directory.
pub const CGROUP_ROOT_ENV: &str = "GOBOX_CGROUP_ROOT";

/// Auto-release flag file, present in every v1 controller directory.
pub const NOTIFY_ON_RELEASE: &str = "notify_on_release";

/// Process membership file.
pub const CGROUP_PROCS: &str = "cgroup.procs";

/// Thread membership file.
pub const TASKS: &str = "tasks";

/// CFS bandwidth quota, in microseconds per period.
pub const CPU_CFS_QUOTA_US: &str = "cpu.cfs_quota_us";

/// Maximum number of tasks under the `pids` controller.
pub const PIDS_MAX: &str = "pids.max";

/// Kernel memory limit file.
pub const MEMORY_KMEM_LIMIT: &str = "memory.kmem.limit_in_bytes";

/// Total memory limit file.
pub const MEMORY_LIMIT: &str = "memory.limit_in_bytes";

/// Kernel memory sub-limit written for every container. Not configurable.
pub const KMEM_LIMIT_VALUE: &str = "64m";

/// Unit suffix the memory controller accepts for megabytes.
pub const MEGABYTE_SUFFIX: &str = "m";

