//! Collection orchestration
//!
//! Drives every configured data source against a fresh [`FleetMetrics`]
//! registry. Sources are isolated from each other: an unreadable tool,
//! file or unit records a liveness gauge of 0 and the run carries on. The
//! only fatal path is publication of the output file.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::CollectorConfig;
use crate::errors::Result;
use crate::output;
use crate::registry::FleetMetrics;
use crate::sources::{
    CertStore, HostStatsProvider, LetsEncryptDir, ServiceProber, StatusFile, SysinfoHost,
    Systemctl, TunnelStatsProvider, VpnStatusProvider, WgCli,
};

pub struct Collector {
    config: CollectorConfig,
    tunnels: Box<dyn TunnelStatsProvider>,
    vpn_status: Box<dyn VpnStatusProvider>,
    services: Box<dyn ServiceProber>,
    certs: Box<dyn CertStore>,
    host: Box<dyn HostStatsProvider>,
}

impl Collector {
    /// Wire up the production providers from the configuration.
    pub fn new(config: CollectorConfig) -> Self {
        let tunnels = Box::new(WgCli::new(config.wireguard.binary.clone()));
        let vpn_status = Box::new(StatusFile::new(config.openvpn.status_path.clone()));
        let services = Box::new(Systemctl::new());
        let certs = Box::new(LetsEncryptDir::new(
            config.certificates.live_dir.clone(),
            config.certificates.openssl_binary.clone(),
        ));
        let host = Box::new(SysinfoHost::new(config.host.conntrack_path.clone()));
        Self::with_providers(config, tunnels, vpn_status, services, certs, host)
    }

    /// Construct with explicit providers. This is the seam tests use to
    /// inject recorded source state.
    pub fn with_providers(
        config: CollectorConfig,
        tunnels: Box<dyn TunnelStatsProvider>,
        vpn_status: Box<dyn VpnStatusProvider>,
        services: Box<dyn ServiceProber>,
        certs: Box<dyn CertStore>,
        host: Box<dyn HostStatsProvider>,
    ) -> Self {
        Self {
            config,
            tunnels,
            vpn_status,
            services,
            certs,
            host,
        }
    }

    /// Run one collection and render the exposition document.
    pub fn collect(&self) -> Result<String> {
        self.collect_at(Utc::now())
    }

    /// Same as [`collect`](Self::collect) with an explicit snapshot time.
    pub fn collect_at(&self, now: DateTime<Utc>) -> Result<String> {
        let started = Instant::now();
        let metrics = FleetMetrics::new(&self.config.namespace);

        self.collect_wireguard(&metrics, now.timestamp());
        self.collect_openvpn(&metrics);
        self.collect_services(&metrics);
        self.collect_certificates(&metrics, now);
        self.collect_host(&metrics);

        metrics
            .duration_seconds
            .set(started.elapsed().as_secs_f64());
        metrics
            .last_run_timestamp_seconds
            .set(now.timestamp() as f64);

        metrics.export()
    }

    /// Collect and atomically publish into the textfile directory.
    pub fn run(&self) -> Result<PathBuf> {
        let document = self.collect()?;
        output::publish(
            &self.config.output.directory,
            &self.config.output.file_name,
            &document,
        )
    }

    fn collect_wireguard(&self, metrics: &FleetMetrics, now_ts: i64) {
        if !self.config.wireguard.enabled {
            return;
        }

        let mut healthy = true;
        for interface in &self.config.wireguard.interfaces {
            match self.tunnels.peers(interface) {
                Ok(snapshot) => {
                    metrics
                        .wireguard_interface_up
                        .with_label_values(&[interface.as_str()])
                        .set(1.0);
                    metrics
                        .wireguard_peers
                        .with_label_values(&[interface.as_str()])
                        .set(snapshot.peers.len() as f64);

                    for peer in &snapshot.peers {
                        let labels = [interface.as_str(), peer.key_prefix()];
                        metrics
                            .wireguard_peer_receive_bytes
                            .with_label_values(&labels)
                            .inc_by(peer.rx_bytes);
                        metrics
                            .wireguard_peer_transmit_bytes
                            .with_label_values(&labels)
                            .inc_by(peer.tx_bytes);
                        // 0 means the peer never completed a handshake
                        if peer.last_handshake > 0 {
                            metrics
                                .wireguard_peer_last_handshake_seconds
                                .with_label_values(&labels)
                                .set((now_ts - peer.last_handshake) as f64);
                        }
                    }

                    if snapshot.malformed > 0 {
                        metrics
                            .parse_errors
                            .with_label_values(&["wireguard"])
                            .inc_by(snapshot.malformed);
                    }
                }
                Err(e) => {
                    debug!(interface = %interface, error = %e, "WireGuard interface not queryable");
                    metrics
                        .wireguard_interface_up
                        .with_label_values(&[interface.as_str()])
                        .set(0.0);
                    healthy = false;
                }
            }
        }
        metrics
            .source_up
            .with_label_values(&["wireguard"])
            .set(bool_gauge(healthy));
    }

    fn collect_openvpn(&self, metrics: &FleetMetrics) {
        if !self.config.openvpn.enabled {
            return;
        }

        match self.vpn_status.status() {
            Ok(snapshot) => {
                metrics.openvpn_up.set(1.0);
                metrics.openvpn_clients.set(snapshot.clients.len() as f64);
                for client in &snapshot.clients {
                    metrics
                        .openvpn_client_receive_bytes
                        .with_label_values(&[client.common_name.as_str()])
                        .inc_by(client.rx_bytes);
                    metrics
                        .openvpn_client_transmit_bytes
                        .with_label_values(&[client.common_name.as_str()])
                        .inc_by(client.tx_bytes);
                }
                if snapshot.malformed > 0 {
                    metrics
                        .parse_errors
                        .with_label_values(&["openvpn"])
                        .inc_by(snapshot.malformed);
                }
                metrics.source_up.with_label_values(&["openvpn"]).set(1.0);
            }
            Err(e) => {
                debug!(error = %e, "OpenVPN status log not readable");
                metrics.openvpn_up.set(0.0);
                metrics.source_up.with_label_values(&["openvpn"]).set(0.0);
            }
        }
    }

    fn collect_services(&self, metrics: &FleetMetrics) {
        let mut healthy = true;
        for unit in &self.config.services.units {
            let active = match self.services.is_active(unit) {
                Ok(active) => active,
                Err(e) => {
                    warn!(unit = %unit, error = %e, "Service probe failed");
                    healthy = false;
                    false
                }
            };
            metrics
                .service_up
                .with_label_values(&[unit.as_str()])
                .set(bool_gauge(active));
        }
        metrics
            .source_up
            .with_label_values(&["services"])
            .set(bool_gauge(healthy));
    }

    fn collect_certificates(&self, metrics: &FleetMetrics, now: DateTime<Utc>) {
        if !self.config.certificates.enabled {
            return;
        }

        match self.certs.list() {
            Ok(certs) => {
                for cert in &certs {
                    let days = (cert.not_after - now).num_days();
                    metrics
                        .cert_expiry_days
                        .with_label_values(&[cert.domain.as_str()])
                        .set(days as f64);
                }
                metrics
                    .source_up
                    .with_label_values(&["certificates"])
                    .set(1.0);
            }
            Err(e) => {
                debug!(error = %e, "Certificate store not readable");
                metrics
                    .source_up
                    .with_label_values(&["certificates"])
                    .set(0.0);
            }
        }
    }

    fn collect_host(&self, metrics: &FleetMetrics) {
        let mut healthy = true;

        match self.host.network() {
            Ok(interfaces) => {
                for stats in interfaces
                    .iter()
                    .filter(|s| selected(&self.config.host.interfaces, &s.interface))
                {
                    let labels = [stats.interface.as_str()];
                    metrics
                        .network_receive_bytes
                        .with_label_values(&labels)
                        .inc_by(stats.rx_bytes);
                    metrics
                        .network_transmit_bytes
                        .with_label_values(&labels)
                        .inc_by(stats.tx_bytes);
                    metrics
                        .network_receive_packets
                        .with_label_values(&labels)
                        .inc_by(stats.rx_packets);
                    metrics
                        .network_transmit_packets
                        .with_label_values(&labels)
                        .inc_by(stats.tx_packets);
                }
            }
            Err(e) => {
                warn!(error = %e, "Network counters unavailable");
                healthy = false;
            }
        }

        match self.host.load() {
            Ok(load) => {
                metrics.load1.set(load.one);
                metrics.load5.set(load.five);
                metrics.load15.set(load.fifteen);
            }
            Err(e) => {
                warn!(error = %e, "Load average unavailable");
                healthy = false;
            }
        }

        match self.host.disks() {
            Ok(disks) => {
                for stats in disks
                    .iter()
                    .filter(|s| selected(&self.config.host.mounts, &s.mount))
                {
                    metrics
                        .disk_total_bytes
                        .with_label_values(&[stats.mount.as_str()])
                        .set(stats.total_bytes as i64);
                    metrics
                        .disk_available_bytes
                        .with_label_values(&[stats.mount.as_str()])
                        .set(stats.available_bytes as i64);
                }
            }
            Err(e) => {
                warn!(error = %e, "Disk usage unavailable");
                healthy = false;
            }
        }

        match self.host.connections() {
            Ok(Some(count)) => metrics.active_connections.set(count as i64),
            Ok(None) => debug!("No conntrack table exposed, skipping connection count"),
            Err(e) => {
                warn!(error = %e, "Connection count unavailable");
                healthy = false;
            }
        }

        metrics
            .source_up
            .with_label_values(&["host"])
            .set(bool_gauge(healthy));
    }
}

fn bool_gauge(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// An empty filter selects everything.
fn selected(filter: &[String], name: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| f == name)
}
