//! Host description printed before a benchmark session
//!
//! Benchmark numbers are meaningless without the machine they came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// CPU and operating-system facts about the benchmarking host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Physical cores, if the platform reports them
    pub physical_cores: Option<usize>,
    /// Logical cores (hardware threads)
    pub logical_cores: usize,
    /// Current frequency of the first CPU in MHz
    pub cpu_frequency_mhz: u64,
    /// CPU brand string
    pub cpu_brand: String,
    /// OS name (e.g. "Ubuntu")
    pub os_name: Option<String>,
    /// OS release
    pub os_version: Option<String>,
    /// Kernel version
    pub kernel_version: Option<String>,
    /// Machine architecture
    pub architecture: String,
    /// Host name
    pub host_name: Option<String>,
}

impl SystemInfo {
    /// Probe the current host.
    #[must_use]
    pub fn collect() -> Self {
        let system =
            System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::everything()));

        let cpus = system.cpus();
        let (cpu_frequency_mhz, cpu_brand) = cpus
            .first()
            .map(|cpu| (cpu.frequency(), cpu.brand().to_string()))
            .unwrap_or_default();

        Self {
            physical_cores: system.physical_core_count(),
            logical_cores: cpus.len(),
            cpu_frequency_mhz,
            cpu_brand,
            os_name: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            architecture: std::env::consts::ARCH.to_string(),
            host_name: System::host_name(),
        }
    }
}

fn or_unknown(value: Option<&String>) -> &str {
    value.map_or("unknown", String::as_str)
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(40);
        writeln!(f, "{rule} CPU Info {rule}")?;
        match self.physical_cores {
            Some(n) => writeln!(f, "Physical cores: {n}")?,
            None => writeln!(f, "Physical cores: unknown")?,
        }
        writeln!(f, "Total cores: {}", self.logical_cores)?;
        writeln!(f, "Current Frequency: {}Mhz", self.cpu_frequency_mhz)?;
        writeln!(f, "Brand: {}", self.cpu_brand)?;
        writeln!(f, "{rule} System Information {rule}")?;
        writeln!(f, "System: {}", or_unknown(self.os_name.as_ref()))?;
        writeln!(f, "Release: {}", or_unknown(self.kernel_version.as_ref()))?;
        writeln!(f, "Version: {}", or_unknown(self.os_version.as_ref()))?;
        writeln!(f, "Machine: {}", self.architecture)?;
        write!(f, "Host: {}", or_unknown(self.host_name.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_reports_cores() {
        let info = SystemInfo::collect();
        assert!(info.logical_cores >= 1);
        assert!(!info.architecture.is_empty());
    }

    #[test]
    fn test_display_sections() {
        let info = SystemInfo {
            physical_cores: None,
            logical_cores: 8,
            cpu_frequency_mhz: 3200,
            cpu_brand: "Test CPU".to_string(),
            os_name: Some("Linux".to_string()),
            os_version: None,
            kernel_version: Some("6.1".to_string()),
            architecture: "x86_64".to_string(),
            host_name: None,
        };
        let text = info.to_string();
        assert!(text.contains("CPU Info"));
        assert!(text.contains("Total cores: 8"));
        assert!(text.contains("Physical cores: unknown"));
        assert!(text.contains("System: Linux"));
        assert!(text.contains("Version: unknown"));
    }
}
