//! Host-level counters and gauges
//!
//! Network interface counters, load averages and disk usage come from
//! sysinfo; the active connection count comes from the kernel's conntrack
//! count file when the module is loaded.

use std::fs;
use std::path::PathBuf;

use sysinfo::{Disks, Networks, System};

use crate::errors::{Result, VpnMetricsError};

/// Cumulative counters of one network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetDevStats {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

/// Capacity of one mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskStats {
    pub mount: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Host statistics source.
pub trait HostStatsProvider {
    fn network(&self) -> Result<Vec<NetDevStats>>;
    fn load(&self) -> Result<LoadAvg>;
    fn disks(&self) -> Result<Vec<DiskStats>>;
    /// Tracked connection count; `None` when the kernel exposes no
    /// conntrack table.
    fn connections(&self) -> Result<Option<u64>>;
}

/// Production implementation backed by sysinfo and procfs.
pub struct SysinfoHost {
    conntrack_path: PathBuf,
}

impl SysinfoHost {
    pub fn new<P: Into<PathBuf>>(conntrack_path: P) -> Self {
        Self {
            conntrack_path: conntrack_path.into(),
        }
    }
}

impl HostStatsProvider for SysinfoHost {
    fn network(&self) -> Result<Vec<NetDevStats>> {
        let networks = Networks::new_with_refreshed_list();
        let mut stats: Vec<NetDevStats> = networks
            .list()
            .iter()
            .map(|(name, data)| NetDevStats {
                interface: name.clone(),
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
                rx_packets: data.total_packets_received(),
                tx_packets: data.total_packets_transmitted(),
            })
            .collect();
        stats.sort_by(|a, b| a.interface.cmp(&b.interface));
        Ok(stats)
    }

    fn load(&self) -> Result<LoadAvg> {
        let avg = System::load_average();
        Ok(LoadAvg {
            one: avg.one,
            five: avg.five,
            fifteen: avg.fifteen,
        })
    }

    fn disks(&self) -> Result<Vec<DiskStats>> {
        let disks = Disks::new_with_refreshed_list();
        let mut stats: Vec<DiskStats> = disks
            .list()
            .iter()
            .map(|disk| DiskStats {
                mount: disk.mount_point().to_string_lossy().to_string(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();
        stats.sort_by(|a, b| a.mount.cmp(&b.mount));
        stats.dedup_by(|a, b| a.mount == b.mount);
        Ok(stats)
    }

    fn connections(&self) -> Result<Option<u64>> {
        match fs::read_to_string(&self.conntrack_path) {
            Ok(content) => {
                let count = content.trim().parse::<u64>().map_err(|e| {
                    VpnMetricsError::parse(format!(
                        "Bad conntrack count in {}: {}",
                        self.conntrack_path.display(),
                        e
                    ))
                })?;
                Ok(Some(count))
            }
            // No conntrack module is a valid terminal state
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VpnMetricsError::file_operation(format!(
                "Failed to read {}: {}",
                self.conntrack_path.display(),
                e
            ))),
        }
    }
}
