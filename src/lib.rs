//! vpnmetrics - Textfile metrics exporter for a multi-protocol VPN fleet
//!
//! This library provides the core functionality for the vpnmetrics tool:
//! a run-once collector that snapshots WireGuard/OpenVPN tunnel state,
//! service liveness, certificate expiry and host counters, renders them as
//! Prometheus exposition text and atomically publishes a `.prom` file into
//! a textfile-collector directory.
//!
//! # Architecture
//! - `config`: Configuration loading and validation
//! - `sources`: Capability traits over external collaborators (wg, the
//!   OpenVPN status log, systemd, the certificate store, host counters)
//! - `registry`: Per-run metric registry and text export
//! - `collector`: Orchestration with per-source failure isolation
//! - `output`: Atomic publication of the rendered document
//! - `system`: Platform utilities (logging)

pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod output;
pub mod registry;
pub mod sources;
pub mod system;

pub use errors::{Result, VpnMetricsError};
