//! Process-table lookup by name (`sysinfo` backend)

use std::ffi::OsStr;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};

/// Guard against cycles in a corrupt parent chain.
const MAX_ANCESTRY_DEPTH: usize = 64;

/// One reading of a process's resource counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSnapshot {
    /// OS process id
    pub pid: u32,
    /// Resident set size in KiB
    pub memory_kib: f64,
    /// CPU utilization since the previous refresh, in percent
    pub cpu_percent: f64,
}

/// Capability: find a running process by its executable name.
///
/// The launched pid is a hint. When the command is a wrapper shell invoking
/// the real binary, the binary shows up as a descendant of the launched pid
/// under its own name.
pub trait ProcessLocator {
    /// Refresh the process table and return the best match for `name`.
    ///
    /// Preference order: a matching process inside the launched tree, then
    /// any matching process, then the launched process itself. `None` means
    /// nothing could be read (e.g. the process already exited).
    fn find_by_name(&mut self, name: &str, launched_pid: u32) -> Option<ProcessSnapshot>;
}

/// [`ProcessLocator`] backed by `sysinfo::System`.
pub struct SysinfoLocator {
    system: System,
    refresh_kind: ProcessRefreshKind,
}

impl Default for SysinfoLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoLocator")
            .field("tracked", &self.system.processes().len())
            .finish()
    }
}

impl SysinfoLocator {
    /// Create a locator that refreshes only memory and CPU counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: System::new(),
            refresh_kind: ProcessRefreshKind::new().with_memory().with_cpu(),
        }
    }

    fn descends_from(&self, pid: Pid, root: Pid) -> bool {
        let mut current = Some(pid);
        for _ in 0..MAX_ANCESTRY_DEPTH {
            match current {
                Some(p) if p == root => return true,
                Some(p) => current = self.system.process(p).and_then(Process::parent),
                None => return false,
            }
        }
        false
    }
}

impl ProcessLocator for SysinfoLocator {
    fn find_by_name(&mut self, name: &str, launched_pid: u32) -> Option<ProcessSnapshot> {
        // Remove dead entries so an exited child is not reported from a stale cache.
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, self.refresh_kind);

        let root = Pid::from_u32(launched_pid);
        let mut in_tree: Option<&Process> = None;
        let mut elsewhere: Option<&Process> = None;

        for process in self.system.processes_by_exact_name(OsStr::new(name)) {
            let slot = if self.descends_from(process.pid(), root) {
                &mut in_tree
            } else {
                &mut elsewhere
            };
            if slot.map_or(true, |best| process.memory() > best.memory()) {
                *slot = Some(process);
            }
        }

        in_tree
            .or(elsewhere)
            .or_else(|| self.system.process(root))
            .map(snapshot_of)
    }
}

#[allow(clippy::cast_precision_loss)]
fn snapshot_of(process: &Process) -> ProcessSnapshot {
    ProcessSnapshot {
        pid: process.pid().as_u32(),
        memory_kib: process.memory() as f64 / 1024.0,
        cpu_percent: f64::from(process.cpu_usage()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_current_process_by_pid_fallback() {
        let mut locator = SysinfoLocator::new();
        let own_pid = std::process::id();
        let snapshot = locator
            .find_by_name("no-such-process-name-for-sure", own_pid)
            .expect("own process is always in the table");
        assert_eq!(snapshot.pid, own_pid);
        assert!(snapshot.memory_kib > 0.0);
    }

    #[test]
    fn test_missing_pid_and_name_yields_none() {
        let mut locator = SysinfoLocator::new();
        // no live process has this pid
        assert!(locator
            .find_by_name("no-such-process-name-for-sure", u32::MAX - 7)
            .is_none());
    }

    /// Pid of a live child of `parent` named `name`, once it appears.
    #[cfg(unix)]
    fn wait_for_child(parent: u32, name: &str) -> Option<u32> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(3);
        let mut system = System::new();
        while std::time::Instant::now() < deadline {
            system.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::new(),
            );
            let found = system
                .processes_by_exact_name(OsStr::new(name))
                .find(|p| p.parent() == Some(Pid::from_u32(parent)))
                .map(|p| p.pid().as_u32());
            if found.is_some() {
                return found;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        None
    }

    #[cfg(unix)]
    #[test]
    fn test_prefers_named_child_of_launched_shell() {
        use std::process::{Command, Stdio};

        // A same-named process outside the launched tree.
        let mut outsider = Command::new("sleep").arg("3").spawn().unwrap();
        let mut shell = Command::new("sh")
            .args(["-c", "sleep 3; true"])
            .stdout(Stdio::null())
            .spawn()
            .unwrap();

        let inner = wait_for_child(shell.id(), "sleep").expect("shell never started sleep");
        let mut locator = SysinfoLocator::new();
        let snapshot = locator.find_by_name("sleep", shell.id()).unwrap();

        assert_eq!(snapshot.pid, inner);
        assert_ne!(snapshot.pid, shell.id());
        assert_ne!(snapshot.pid, outsider.id());

        for child in [&mut outsider, &mut shell] {
            child.kill().unwrap();
            child.wait().unwrap();
        }
        let _ = Command::new("kill").arg(inner.to_string()).status();
    }
}
