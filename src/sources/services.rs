//! Service liveness probing via the service manager

use std::process::Command;

use crate::errors::{Result, VpnMetricsError};

/// Unit liveness source.
pub trait ServiceProber {
    /// Whether the unit is currently active. `Err` means the probe itself
    /// could not run (service manager unavailable), which callers treat as
    /// "down", not as a failed run.
    fn is_active(&self, unit: &str) -> Result<bool>;
}

/// Production implementation shelling out to `systemctl is-active`.
pub struct Systemctl {
    binary: String,
}

impl Systemctl {
    pub fn new() -> Self {
        Self {
            binary: "systemctl".to_string(),
        }
    }
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceProber for Systemctl {
    fn is_active(&self, unit: &str) -> Result<bool> {
        let status = Command::new(&self.binary)
            .args(["is-active", "--quiet", unit])
            .status()
            .map_err(|e| {
                VpnMetricsError::command_failed(format!("Failed to run {}: {}", self.binary, e))
            })?;
        // is-active exits 0 for active units, non-zero otherwise.
        Ok(status.success())
    }
}
