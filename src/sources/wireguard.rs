//! WireGuard tunnel statistics
//!
//! Queries per-peer counters with `wg show <interface> dump`. The dump
//! format is tab-separated: the first line describes the interface itself
//! (private key, public key, listen port, fwmark), every following line is
//! a peer record with eight columns (public key, preshared key, endpoint,
//! allowed ips, latest handshake epoch, rx bytes, tx bytes, keepalive).

use std::process::Command;

use tracing::warn;

use crate::errors::{Result, VpnMetricsError};

/// One peer row from `wg show dump`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WgPeer {
    pub public_key: String,
    /// Epoch seconds of the latest handshake; 0 means never.
    pub last_handshake: i64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl WgPeer {
    /// Label value for this peer: the first 8 characters of the public key.
    /// Enough to tell peers apart without leaking the full key into the
    /// metrics document.
    pub fn key_prefix(&self) -> &str {
        self.public_key.get(..8).unwrap_or(&self.public_key)
    }
}

/// Parsed dump of one tunnel interface.
#[derive(Debug, Clone, Default)]
pub struct TunnelSnapshot {
    pub peers: Vec<WgPeer>,
    /// Lines that did not match the expected dump format.
    pub malformed: u64,
}

/// Per-interface peer statistics source.
pub trait TunnelStatsProvider {
    fn peers(&self, interface: &str) -> Result<TunnelSnapshot>;
}

/// Production implementation backed by the `wg` binary.
pub struct WgCli {
    binary: String,
}

impl WgCli {
    pub fn new<T: Into<String>>(binary: T) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl TunnelStatsProvider for WgCli {
    fn peers(&self, interface: &str) -> Result<TunnelSnapshot> {
        let output = Command::new(&self.binary)
            .args(["show", interface, "dump"])
            .output()
            .map_err(|e| {
                VpnMetricsError::command_failed(format!("Failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            return Err(VpnMetricsError::command_failed(format!(
                "{} show {} dump exited with {}",
                self.binary, interface, output.status
            )));
        }

        Ok(parse_dump(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `wg show <interface> dump` output.
///
/// Malformed lines are skipped and counted, never fatal.
pub fn parse_dump(output: &str) -> TunnelSnapshot {
    let mut snapshot = TunnelSnapshot::default();

    for (index, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        // Interface record: private key, public key, listen port, fwmark.
        if index == 0 && fields.len() == 4 {
            continue;
        }

        if fields.len() != 8 {
            warn!(columns = fields.len(), "Skipping malformed wg dump line");
            snapshot.malformed += 1;
            continue;
        }

        let parsed = (
            fields[4].parse::<i64>(),
            fields[5].parse::<u64>(),
            fields[6].parse::<u64>(),
        );
        let (Ok(last_handshake), Ok(rx_bytes), Ok(tx_bytes)) = parsed else {
            warn!("Skipping wg dump line with non-numeric counters");
            snapshot.malformed += 1;
            continue;
        };

        snapshot.peers.push(WgPeer {
            public_key: fields[0].to_string(),
            last_handshake,
            rx_bytes,
            tx_bytes,
        });
    }

    snapshot
}
