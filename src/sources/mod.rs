//! Capability traits over external collaborators
//!
//! Each data source the collector consumes (the `wg` tool, the OpenVPN
//! status log, systemd, the certificate store, host counters) is wrapped
//! in a narrow trait with one production implementation. Parsing of tool
//! output lives in pure functions so it can be tested against recorded
//! samples without the real tool installed.

pub mod certs;
pub mod host;
pub mod openvpn;
pub mod services;
pub mod wireguard;

pub use certs::{CertExpiry, CertStore, LetsEncryptDir};
pub use host::{DiskStats, HostStatsProvider, LoadAvg, NetDevStats, SysinfoHost};
pub use openvpn::{OvpnClient, StatusFile, StatusSnapshot, VpnStatusProvider};
pub use services::{ServiceProber, Systemctl};
pub use wireguard::{TunnelSnapshot, TunnelStatsProvider, WgCli, WgPeer};
