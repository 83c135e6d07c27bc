//! Per-run metric registry
//!
//! Defines every metric the collector can emit. A fresh [`FleetMetrics`]
//! is built for each run because byte counters are re-read monotonic
//! values from the sources, not values accumulated in this process.

use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, GaugeVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::errors::Result;

/// All metrics of one collection run, namespaced by the configured prefix.
pub struct FleetMetrics {
    registry: Registry,

    // ===== WireGuard =====
    /// Whether each tunnel interface could be queried
    pub wireguard_interface_up: GaugeVec,
    /// Number of configured peers per interface
    pub wireguard_peers: GaugeVec,
    /// Cumulative bytes received from each peer
    pub wireguard_peer_receive_bytes: IntCounterVec,
    /// Cumulative bytes sent to each peer
    pub wireguard_peer_transmit_bytes: IntCounterVec,
    /// Seconds since each peer's last completed handshake
    pub wireguard_peer_last_handshake_seconds: GaugeVec,

    // ===== OpenVPN =====
    /// Whether the daemon's status log was present and parseable
    pub openvpn_up: Gauge,
    /// Connected client count
    pub openvpn_clients: Gauge,
    pub openvpn_client_receive_bytes: IntCounterVec,
    pub openvpn_client_transmit_bytes: IntCounterVec,

    // ===== Services =====
    /// Unit liveness as reported by the service manager
    pub service_up: GaugeVec,

    // ===== Certificates =====
    /// Days until expiry; negative once a certificate has expired
    pub cert_expiry_days: GaugeVec,

    // ===== Host =====
    pub network_receive_bytes: IntCounterVec,
    pub network_transmit_bytes: IntCounterVec,
    pub network_receive_packets: IntCounterVec,
    pub network_transmit_packets: IntCounterVec,
    pub load1: Gauge,
    pub load5: Gauge,
    pub load15: Gauge,
    pub disk_total_bytes: IntGaugeVec,
    pub disk_available_bytes: IntGaugeVec,
    pub active_connections: IntGauge,

    // ===== Collector self-reporting =====
    /// Whether each data source was readable this run
    pub source_up: GaugeVec,
    /// Malformed lines skipped per source
    pub parse_errors: IntCounterVec,
    pub duration_seconds: Gauge,
    pub last_run_timestamp_seconds: Gauge,
}

impl FleetMetrics {
    pub fn new(namespace: &str) -> Self {
        let registry = Registry::new();
        let opts = |name: &str, help: &str| Opts::new(name, help).namespace(namespace);

        let wireguard_interface_up = GaugeVec::new(
            opts(
                "wireguard_interface_up",
                "Whether the WireGuard interface could be queried (1 = up)",
            ),
            &["interface"],
        )
        .expect("Failed to create wireguard_interface_up metric");

        let wireguard_peers = GaugeVec::new(
            opts("wireguard_peers", "Number of configured WireGuard peers"),
            &["interface"],
        )
        .expect("Failed to create wireguard_peers metric");

        let wireguard_peer_receive_bytes = IntCounterVec::new(
            opts(
                "wireguard_peer_receive_bytes_total",
                "Cumulative bytes received from the peer",
            ),
            &["interface", "peer"],
        )
        .expect("Failed to create wireguard_peer_receive_bytes_total metric");

        let wireguard_peer_transmit_bytes = IntCounterVec::new(
            opts(
                "wireguard_peer_transmit_bytes_total",
                "Cumulative bytes sent to the peer",
            ),
            &["interface", "peer"],
        )
        .expect("Failed to create wireguard_peer_transmit_bytes_total metric");

        let wireguard_peer_last_handshake_seconds = GaugeVec::new(
            opts(
                "wireguard_peer_last_handshake_seconds",
                "Seconds since the peer's last completed handshake",
            ),
            &["interface", "peer"],
        )
        .expect("Failed to create wireguard_peer_last_handshake_seconds metric");

        let openvpn_up = Gauge::with_opts(opts(
            "openvpn_up",
            "Whether the OpenVPN status log was present and parseable (1 = up)",
        ))
        .expect("Failed to create openvpn_up metric");

        let openvpn_clients = Gauge::with_opts(opts(
            "openvpn_clients",
            "Number of connected OpenVPN clients",
        ))
        .expect("Failed to create openvpn_clients metric");

        let openvpn_client_receive_bytes = IntCounterVec::new(
            opts(
                "openvpn_client_receive_bytes_total",
                "Cumulative bytes received from the client",
            ),
            &["common_name"],
        )
        .expect("Failed to create openvpn_client_receive_bytes_total metric");

        let openvpn_client_transmit_bytes = IntCounterVec::new(
            opts(
                "openvpn_client_transmit_bytes_total",
                "Cumulative bytes sent to the client",
            ),
            &["common_name"],
        )
        .expect("Failed to create openvpn_client_transmit_bytes_total metric");

        let service_up = GaugeVec::new(
            opts("service_up", "Whether the service unit is active (1 = up)"),
            &["service"],
        )
        .expect("Failed to create service_up metric");

        let cert_expiry_days = GaugeVec::new(
            opts(
                "cert_expiry_days",
                "Days until certificate expiry (negative once expired)",
            ),
            &["domain"],
        )
        .expect("Failed to create cert_expiry_days metric");

        let network_receive_bytes = IntCounterVec::new(
            opts(
                "network_receive_bytes_total",
                "Cumulative bytes received on the interface",
            ),
            &["interface"],
        )
        .expect("Failed to create network_receive_bytes_total metric");

        let network_transmit_bytes = IntCounterVec::new(
            opts(
                "network_transmit_bytes_total",
                "Cumulative bytes transmitted on the interface",
            ),
            &["interface"],
        )
        .expect("Failed to create network_transmit_bytes_total metric");

        let network_receive_packets = IntCounterVec::new(
            opts(
                "network_receive_packets_total",
                "Cumulative packets received on the interface",
            ),
            &["interface"],
        )
        .expect("Failed to create network_receive_packets_total metric");

        let network_transmit_packets = IntCounterVec::new(
            opts(
                "network_transmit_packets_total",
                "Cumulative packets transmitted on the interface",
            ),
            &["interface"],
        )
        .expect("Failed to create network_transmit_packets_total metric");

        let load1 = Gauge::with_opts(opts("load1", "1-minute load average"))
            .expect("Failed to create load1 metric");
        let load5 = Gauge::with_opts(opts("load5", "5-minute load average"))
            .expect("Failed to create load5 metric");
        let load15 = Gauge::with_opts(opts("load15", "15-minute load average"))
            .expect("Failed to create load15 metric");

        let disk_total_bytes = IntGaugeVec::new(
            opts("disk_total_bytes", "Filesystem size in bytes"),
            &["mount"],
        )
        .expect("Failed to create disk_total_bytes metric");

        let disk_available_bytes = IntGaugeVec::new(
            opts("disk_available_bytes", "Filesystem space available in bytes"),
            &["mount"],
        )
        .expect("Failed to create disk_available_bytes metric");

        let active_connections = IntGauge::with_opts(opts(
            "active_connections",
            "Connections currently tracked by the kernel",
        ))
        .expect("Failed to create active_connections metric");

        let source_up = GaugeVec::new(
            opts(
                "collector_source_up",
                "Whether the data source was readable this run (1 = up)",
            ),
            &["source"],
        )
        .expect("Failed to create collector_source_up metric");

        let parse_errors = IntCounterVec::new(
            opts(
                "collector_parse_errors",
                "Malformed lines skipped while parsing the source this run",
            ),
            &["source"],
        )
        .expect("Failed to create collector_parse_errors metric");

        let duration_seconds = Gauge::with_opts(opts(
            "collector_duration_seconds",
            "Wall-clock duration of the collection run",
        ))
        .expect("Failed to create collector_duration_seconds metric");

        let last_run_timestamp_seconds = Gauge::with_opts(opts(
            "collector_last_run_timestamp_seconds",
            "Epoch timestamp of the last collection run",
        ))
        .expect("Failed to create collector_last_run_timestamp_seconds metric");

        register(&registry, Box::new(wireguard_interface_up.clone()));
        register(&registry, Box::new(wireguard_peers.clone()));
        register(&registry, Box::new(wireguard_peer_receive_bytes.clone()));
        register(&registry, Box::new(wireguard_peer_transmit_bytes.clone()));
        register(
            &registry,
            Box::new(wireguard_peer_last_handshake_seconds.clone()),
        );
        register(&registry, Box::new(openvpn_up.clone()));
        register(&registry, Box::new(openvpn_clients.clone()));
        register(&registry, Box::new(openvpn_client_receive_bytes.clone()));
        register(&registry, Box::new(openvpn_client_transmit_bytes.clone()));
        register(&registry, Box::new(service_up.clone()));
        register(&registry, Box::new(cert_expiry_days.clone()));
        register(&registry, Box::new(network_receive_bytes.clone()));
        register(&registry, Box::new(network_transmit_bytes.clone()));
        register(&registry, Box::new(network_receive_packets.clone()));
        register(&registry, Box::new(network_transmit_packets.clone()));
        register(&registry, Box::new(load1.clone()));
        register(&registry, Box::new(load5.clone()));
        register(&registry, Box::new(load15.clone()));
        register(&registry, Box::new(disk_total_bytes.clone()));
        register(&registry, Box::new(disk_available_bytes.clone()));
        register(&registry, Box::new(active_connections.clone()));
        register(&registry, Box::new(source_up.clone()));
        register(&registry, Box::new(parse_errors.clone()));
        register(&registry, Box::new(duration_seconds.clone()));
        register(&registry, Box::new(last_run_timestamp_seconds.clone()));

        Self {
            registry,
            wireguard_interface_up,
            wireguard_peers,
            wireguard_peer_receive_bytes,
            wireguard_peer_transmit_bytes,
            wireguard_peer_last_handshake_seconds,
            openvpn_up,
            openvpn_clients,
            openvpn_client_receive_bytes,
            openvpn_client_transmit_bytes,
            service_up,
            cert_expiry_days,
            network_receive_bytes,
            network_transmit_bytes,
            network_receive_packets,
            network_transmit_packets,
            load1,
            load5,
            load15,
            disk_total_bytes,
            disk_available_bytes,
            active_connections,
            source_up,
            parse_errors,
            duration_seconds,
            last_run_timestamp_seconds,
        }
    }

    /// Render the run as exposition-format text. The encoder emits a HELP
    /// and TYPE line ahead of every sample family.
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::errors::VpnMetricsError::encode(e.to_string()))
    }
}

fn register(registry: &Registry, collector: Box<dyn Collector>) {
    registry
        .register(collector)
        .expect("Failed to register metric");
}
