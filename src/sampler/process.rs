//! Subprocess launch, polling loop, and guaranteed reaping

use super::{ProcessLocator, ProcessSnapshot, ResourceSampler, SamplerConfig, SysinfoLocator};
use crate::metrics::MetricVector;
use crate::{Error, Result};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Granularity of exit detection inside one polling interval.
///
/// Keeps wall-clock resolution well below the polling interval without
/// refreshing the process table more often.
const EXIT_CHECK_STEP: Duration = Duration::from_millis(5);

/// POSIX shell exit codes for "found but not executable" and "not found".
const SHELL_NOT_EXECUTABLE: i32 = 126;
const SHELL_NOT_FOUND: i32 = 127;

/// Measures a command by polling the process table while it runs.
#[derive(Debug)]
pub struct ProcessSampler<L = SysinfoLocator> {
    locator: L,
    config: SamplerConfig,
}

impl ProcessSampler<SysinfoLocator> {
    /// Create a sampler over the system process table.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self::with_locator(SysinfoLocator::new(), config)
    }
}

impl<L: ProcessLocator> ProcessSampler<L> {
    /// Create a sampler with a custom process locator.
    #[must_use]
    pub const fn with_locator(locator: L, config: SamplerConfig) -> Self {
        Self { locator, config }
    }

    /// Sampler settings.
    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

impl<L: ProcessLocator> ResourceSampler for ProcessSampler<L> {
    fn sample(&mut self, command: &str, process_name: &str) -> Result<MetricVector> {
        if command.trim().is_empty() {
            return Err(Error::InvalidConfiguration("command is empty".to_string()));
        }

        let started = Instant::now();
        let mut child = ChildGuard::spawn(command, self.config.is_quiet())?;
        let pid = child.id();
        debug!(pid, command, process_name, "launched");

        let mut peak = Peak::default();
        let status = loop {
            if let Some(snapshot) = self.locator.find_by_name(process_name, pid) {
                peak.observe(&snapshot);
            }
            if let Some(status) = child.wait_timeout(self.config.poll_interval())? {
                break status;
            }
            if let Some(limit) = self.config.timeout() {
                if started.elapsed() >= limit {
                    child.kill();
                    warn!(pid, command, "trial timed out, child killed");
                    return Err(Error::Timeout {
                        command: command.to_string(),
                        timeout_secs: limit.as_secs_f64(),
                    });
                }
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        if matches!(status.code(), Some(SHELL_NOT_EXECUTABLE | SHELL_NOT_FOUND)) {
            return Err(Error::Launch {
                command: command.to_string(),
                reason: format!("shell reported {status} (command not found or not executable)"),
            });
        }
        if !status.success() {
            warn!(pid, command, %status, "command exited unsuccessfully");
        }
        if peak.samples == 0 {
            // Sampling gap: the process exited before the first poll found it.
            warn!(
                pid,
                process_name, "process never observed, reporting elapsed time only"
            );
        }

        debug!(
            pid,
            elapsed_secs = elapsed,
            peak_memory_kib = peak.memory_kib,
            peak_cpu_percent = peak.cpu_percent,
            samples = peak.samples,
            "trial finished"
        );
        Ok(MetricVector::new(elapsed, peak.memory_kib, peak.cpu_percent))
    }
}

#[derive(Debug, Default)]
struct Peak {
    memory_kib: f64,
    cpu_percent: f64,
    samples: usize,
}

impl Peak {
    fn observe(&mut self, snapshot: &ProcessSnapshot) {
        self.memory_kib = self.memory_kib.max(snapshot.memory_kib);
        self.cpu_percent = self.cpu_percent.max(snapshot.cpu_percent);
        self.samples += 1;
    }
}

/// Owns the child process and its process group.
///
/// On Unix the shell is started as the leader of a fresh process group, so
/// killing the group also reaches anything the shell forked. Dropping the
/// guard kills the group and reaps the shell, so no exit path leaves an
/// orphan or zombie behind.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn spawn(command: &str, quiet: bool) -> Result<Self> {
        let mut cmd = shell_command(command);
        cmd.stdin(Stdio::null());
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let child = cmd.spawn().map_err(|e| Error::Launch {
            command: command.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            child,
            reaped: false,
        })
    }

    fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block for at most `timeout` waiting for exit.
    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(EXIT_CHECK_STEP.min(deadline - now));
        }
    }

    /// Kill every process in the group, then reap the shell.
    fn kill(&mut self) {
        self.kill_group();
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            debug!(pid = self.child.id(), error = %e, "kill failed, child already gone");
        }
        if self.child.wait().is_ok() {
            self.reaped = true;
        }
    }

    #[cfg(unix)]
    fn kill_group(&self) {
        let Ok(pgid) = libc::pid_t::try_from(self.child.id()) else {
            return;
        };
        // SAFETY: killpg only sends a signal; ESRCH for an empty group is fine.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
