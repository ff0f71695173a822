//! Integration tests for cgroup initialization against a directory tree.
//!
//! Every test redirects the three controller roots into a temporary
//! directory, so the real `/sys/fs/cgroup` is never touched.
//!
//! Covered scenarios:
//! 1. Full initialization writes every control file
//! 2. Re-initialization of the same container succeeds
//! 3. A refused write stops the run and leaves a removable hierarchy
//! 4. Unbounded sentinels reach the control files untouched

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use gobox_common::config::HierarchyConfig;
use gobox_common::error::GoboxError;
use gobox_common::types::{ContainerId, ProcessHandle, ResourceLimits};
use gobox_core::cgroup::{CgroupManager, CgroupState, Step};

fn read(base: &Path, relative: &str) -> String {
    std::fs::read_to_string(base.join(relative)).expect(relative)
}

fn manager(base: &Path) -> CgroupManager<gobox_core::cgroup::hierarchy::FsHierarchy> {
    CgroupManager::from_config(HierarchyConfig::under(base))
}

// ── Full run ─────────────────────────────────────────────────────────

#[test]
fn init_writes_every_control_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();

    let state = manager(base)
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new("c1"),
            &ResourceLimits::new("50", "20000", "256"),
        )
        .expect("init");
    assert_eq!(state, CgroupState::Ready);

    assert_eq!(read(base, "pids/gobox/c1/pids.max"), "50");
    assert_eq!(read(base, "cpu/gobox/c1/cpu.cfs_quota_us"), "20000");
    assert_eq!(read(base, "memory/gobox/c1/memory.limit_in_bytes"), "256m");
    assert_eq!(read(base, "memory/gobox/c1/memory.kmem.limit_in_bytes"), "64m");

    for controller in ["cpu", "pids", "memory"] {
        assert_eq!(read(base, &format!("{controller}/gobox/c1/cgroup.procs")), "4321");
        assert_eq!(read(base, &format!("{controller}/gobox/c1/notify_on_release")), "1");
    }
    assert_eq!(read(base, "cpu/gobox/c1/tasks"), "4321");
    assert_eq!(read(base, "memory/gobox/c1/tasks"), "4321");
}

#[test]
fn containers_get_disjoint_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    let manager = manager(base);

    let _ = manager
        .init(
            &ProcessHandle::new("100"),
            &ContainerId::new("a"),
            &ResourceLimits::new("10", "10000", "64"),
        )
        .expect("init a");
    let _ = manager
        .init(
            &ProcessHandle::new("200"),
            &ContainerId::new("b"),
            &ResourceLimits::new("20", "20000", "128"),
        )
        .expect("init b");

    assert_eq!(read(base, "pids/gobox/a/pids.max"), "10");
    assert_eq!(read(base, "pids/gobox/b/pids.max"), "20");
    assert_eq!(read(base, "memory/gobox/a/memory.limit_in_bytes"), "64m");
    assert_eq!(read(base, "memory/gobox/b/memory.limit_in_bytes"), "128m");
}

// ── Idempotence ──────────────────────────────────────────────────────

#[test]
fn second_init_for_same_container_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    let manager = manager(base);
    let id = ContainerId::new("c1");
    let pid = ProcessHandle::new("4321");
    let limits = ResourceLimits::new("50", "20000", "256");

    let _ = manager.init(&pid, &id, &limits).expect("first init");
    let _ = manager.init(&pid, &id, &limits).expect("second init");

    assert!(base.join("cpu/gobox/c1").is_dir());
    assert_eq!(read(base, "pids/gobox/c1/pids.max"), "50");
}

// ── Fail-fast ────────────────────────────────────────────────────────

#[test]
fn refused_cpu_write_leaves_pids_and_memory_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    // A directory where the quota file should be makes the write fail,
    // even for root.
    std::fs::create_dir_all(base.join("cpu/gobox/c1/cpu.cfs_quota_us")).expect("mkdir");

    let err = manager(base)
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new("c1"),
            &ResourceLimits::new("50", "20000", "256"),
        )
        .unwrap_err();

    assert_eq!(err.step, Step::Cpu);
    match &err.source {
        GoboxError::Write { path, value, .. } => {
            assert!(path.ends_with("cpu/gobox/c1/cpu.cfs_quota_us"));
            assert_eq!(value, "20000");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!base.join("pids/gobox/c1/pids.max").exists());
    assert!(!base.join("memory/gobox/c1/memory.limit_in_bytes").exists());
}

#[test]
fn refused_memory_write_stops_configurator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    std::fs::create_dir_all(base.join("memory/gobox/c1/memory.kmem.limit_in_bytes"))
        .expect("mkdir");

    let err = manager(base)
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new("c1"),
            &ResourceLimits::new("50", "20000", "256"),
        )
        .unwrap_err();

    assert_eq!(err.step, Step::Memory);
    assert!(!base.join("memory/gobox/c1/tasks").exists());
    assert!(!base.join("memory/gobox/c1/memory.limit_in_bytes").exists());
    // Earlier steps stay applied.
    assert_eq!(read(base, "pids/gobox/c1/pids.max"), "50");
}

#[test]
fn partial_hierarchy_survives_failure_and_can_be_released() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    std::fs::create_dir_all(base.join("pids/gobox/c1/pids.max")).expect("mkdir");
    let manager = manager(base);
    let id = ContainerId::new("c1");

    let err = manager
        .init(
            &ProcessHandle::new("4321"),
            &id,
            &ResourceLimits::new("50", "20000", "256"),
        )
        .unwrap_err();
    assert_eq!(err.step, Step::Pids);
    for controller in ["cpu", "pids", "memory"] {
        assert!(base.join(controller).join("gobox/c1").is_dir());
    }

    manager.release(&id).expect("release");
    for controller in ["cpu", "pids", "memory"] {
        assert!(!base.join(controller).join("gobox/c1").exists());
    }
    assert!(base.join("cpu/gobox").is_dir());
}

#[test]
fn unusable_controller_root_fails_directory_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    std::fs::write(base.join("memory"), "not a directory").expect("write");

    let err = manager(base)
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new("c1"),
            &ResourceLimits::new("50", "20000", "256"),
        )
        .unwrap_err();
    assert_eq!(err.step, Step::CreateDirectories);
    assert!(matches!(err.source, GoboxError::DirectoryCreation { .. }));
    assert!(!base.join("cpu/gobox/c1/cgroup.procs").exists());
}

// ── Sentinels ────────────────────────────────────────────────────────

#[test]
fn unbounded_sentinels_are_written_verbatim() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();

    let _ = manager(base)
        .init(
            &ProcessHandle::new("1"),
            &ContainerId::new("c1"),
            &ResourceLimits::new("max", "-1", "1024"),
        )
        .expect("init");

    assert_eq!(read(base, "pids/gobox/c1/pids.max"), "max");
    assert_eq!(read(base, "cpu/gobox/c1/cpu.cfs_quota_us"), "-1");
    assert_eq!(read(base, "memory/gobox/c1/memory.limit_in_bytes"), "1024m");
}

// ── Container ids ────────────────────────────────────────────────────

#[test]
fn escaping_container_ids_never_touch_other_containers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path();
    let manager = manager(base);
    let _ = manager
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new("other"),
            &ResourceLimits::new("50", "20000", "256"),
        )
        .expect("init other");

    for bad in ["..", "", "."] {
        let err = manager.release(&ContainerId::new(bad)).unwrap_err();
        assert!(matches!(err, GoboxError::Config { .. }), "{bad:?}");
        assert!(base.join("pids/gobox/other").is_dir(), "{bad:?}");
    }

    let err = manager
        .init(
            &ProcessHandle::new("4321"),
            &ContainerId::new(""),
            &ResourceLimits::new("10", "10000", "64"),
        )
        .unwrap_err();
    assert_eq!(err.step, Step::CreateDirectories);
    assert!(!base.join("pids/gobox/pids.max").exists());
    assert_eq!(read(base, "pids/gobox/other/pids.max"), "50");
}
