//! # gobox-core
//!
//! Cgroup v1 resource control for a freshly created gobox container.
//!
//! This crate provides:
//! - **Hierarchy access**: the [`cgroup::hierarchy::ControllerHierarchy`]
//!   seam, with a filesystem implementation for the kernel's control files
//!   and an in-memory double for tests.
//! - **Limit configurators**: CPU quota, process count, and memory ceiling.
//! - **Initialization pipeline**: a fixed, fail-fast sequence of steps that
//!   attaches a process to all three controllers and applies its limits.

pub mod cgroup;

pub use cgroup::{CgroupManager, CgroupState, Step, StepError, init_cgroups};
