//! # CPU topology probing.
//!
//! Used to size the pool when [`ClusterConfig::workers`](crate::ClusterConfig)
//! is left at `0`.
//!
//! - [`logical_cores`] OS-reported parallelism, clamped to `1..=255`.
//! - [`physical_cores`] distinct `(package, core)` pairs from sysfs; if those
//!   are unreadable, logical cores divided by the hyperthread sibling group size
//!   of `cpu0`.
//!
//! Probing never fails: missing or garbled sysfs entries degrade to
//! "no hyperthreading".

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default sysfs directory with per-CPU topology descriptors.
pub const SYSFS_CPU_ROOT: &str = "/sys/devices/system/cpu";

/// Returns the number of logical CPUs available to this process (`1..=255`).
pub fn logical_cores() -> u8 {
    let n = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    clamp_count(n)
}

/// Returns the number of physical cores on this host (at least 1).
pub fn physical_cores() -> u8 {
    Topology::system().physical_cores(logical_cores())
}

/// Topology reader rooted at a sysfs-like directory.
#[derive(Clone, Debug)]
pub struct Topology {
    root: PathBuf,
}

impl Topology {
    /// Reader over an arbitrary directory laid out like `/sys/devices/system/cpu`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reader over the real sysfs tree.
    pub fn system() -> Self {
        Self::new(SYSFS_CPU_ROOT)
    }

    /// Physical core count given `logical` online CPUs.
    pub fn physical_cores(&self, logical: u8) -> u8 {
        if logical == 0 {
            return 1;
        }
        if let Some(n) = self.distinct_cores(logical) {
            return clamp_count(n);
        }
        let siblings = self.sibling_group_size().unwrap_or(1);
        clamp_count(usize::from(logical) / siblings)
    }

    /// Counts distinct `(physical_package_id, core_id)` pairs over `cpu0..cpuN`.
    fn distinct_cores(&self, logical: u8) -> Option<usize> {
        let mut seen = HashSet::new();
        for cpu in 0..logical {
            let dir = self.root.join(format!("cpu{cpu}")).join("topology");
            let Some(core) = read_number(&dir.join("core_id")) else {
                continue;
            };
            let package = read_number(&dir.join("physical_package_id")).unwrap_or(0);
            seen.insert((package, core));
        }
        (!seen.is_empty()).then_some(seen.len())
    }

    /// Size of `cpu0`'s hyperthread sibling group.
    fn sibling_group_size(&self) -> Option<usize> {
        let path = self.root.join("cpu0/topology/thread_siblings_list");
        let raw = fs::read_to_string(path).ok()?;
        parse_cpu_list(raw.trim())
    }
}

/// Counts CPUs in a sysfs list such as `0`, `0,4`, `0-3` or `0-1,8-9`.
///
/// Returns `None` for empty or malformed input.
pub fn parse_cpu_list(list: &str) -> Option<usize> {
    if list.is_empty() {
        return None;
    }
    let mut count = 0usize;
    for item in list.split(',') {
        let item = item.trim();
        match item.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.parse().ok()?;
                let end: usize = end.parse().ok()?;
                if end < start {
                    return None;
                }
                count += end - start + 1;
            }
            None => {
                item.parse::<usize>().ok()?;
                count += 1;
            }
        }
    }
    (count > 0).then_some(count)
}

fn read_number(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn clamp_count(n: usize) -> u8 {
    n.clamp(1, usize::from(u8::MAX)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_cpu(root: &Path, cpu: u8, file: &str, contents: &str) {
        let dir = root.join(format!("cpu{cpu}/topology"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn cpu_list_forms() {
        assert_eq!(parse_cpu_list("0"), Some(1));
        assert_eq!(parse_cpu_list("0,4"), Some(2));
        assert_eq!(parse_cpu_list("0-3"), Some(4));
        assert_eq!(parse_cpu_list("0-1,8-9"), Some(4));
        assert_eq!(parse_cpu_list(""), None);
        assert_eq!(parse_cpu_list("3-1"), None);
        assert_eq!(parse_cpu_list("x"), None);
    }

    #[test]
    fn dedupes_hyperthread_core_ids() {
        let tmp = TempDir::new().unwrap();
        for cpu in 0..8u8 {
            write_cpu(tmp.path(), cpu, "core_id", &format!("{}\n", cpu % 4));
        }
        assert_eq!(Topology::new(tmp.path()).physical_cores(8), 4);
    }

    #[test]
    fn multi_socket_core_ids_are_not_merged() {
        let tmp = TempDir::new().unwrap();
        for cpu in 0..4u8 {
            write_cpu(tmp.path(), cpu, "core_id", &format!("{}\n", cpu % 2));
            write_cpu(tmp.path(), cpu, "physical_package_id", &format!("{}\n", cpu / 2));
        }
        assert_eq!(Topology::new(tmp.path()).physical_cores(4), 4);
    }

    #[test]
    fn falls_back_to_sibling_list() {
        let tmp = TempDir::new().unwrap();
        write_cpu(tmp.path(), 0, "thread_siblings_list", "0,8\n");
        assert_eq!(Topology::new(tmp.path()).physical_cores(16), 8);

        let tmp = TempDir::new().unwrap();
        write_cpu(tmp.path(), 0, "thread_siblings_list", "0-3\n");
        assert_eq!(Topology::new(tmp.path()).physical_cores(16), 4);
    }

    #[test]
    fn missing_sysfs_assumes_no_hyperthreading() {
        let tmp = TempDir::new().unwrap();
        let topo = Topology::new(tmp.path().join("absent"));
        assert_eq!(topo.physical_cores(6), 6);
        assert_eq!(topo.physical_cores(0), 1);
    }

    #[test]
    fn garbage_core_ids_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_cpu(tmp.path(), 0, "core_id", "zero\n");
        write_cpu(tmp.path(), 0, "thread_siblings_list", "0-1\n");
        assert_eq!(Topology::new(tmp.path()).physical_cores(2), 1);
    }

    #[test]
    fn logical_cores_is_at_least_one() {
        assert!(logical_cores() >= 1);
    }
}
