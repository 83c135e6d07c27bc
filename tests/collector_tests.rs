//! End-to-end collection tests over mock providers
//!
//! These drive the full collection run with recorded source state and
//! assert on the rendered exposition document, so none of the real tools
//! need to be installed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use vpnmetrics::collector::Collector;
use vpnmetrics::config::CollectorConfig;
use vpnmetrics::errors::{Result, VpnMetricsError};
use vpnmetrics::sources::{
    CertExpiry, CertStore, DiskStats, HostStatsProvider, LoadAvg, NetDevStats, OvpnClient,
    ServiceProber, StatusSnapshot, TunnelSnapshot, TunnelStatsProvider, VpnStatusProvider, WgPeer,
};

// =============================================================================
// Mock providers
// =============================================================================

struct MockTunnels {
    /// Interfaces missing from the map behave as down.
    snapshots: HashMap<String, TunnelSnapshot>,
}

impl TunnelStatsProvider for MockTunnels {
    fn peers(&self, interface: &str) -> Result<TunnelSnapshot> {
        self.snapshots
            .get(interface)
            .cloned()
            .ok_or_else(|| VpnMetricsError::command_failed("interface down"))
    }
}

struct MockStatus(Result<StatusSnapshot>);

impl VpnStatusProvider for MockStatus {
    fn status(&self) -> Result<StatusSnapshot> {
        self.0.clone()
    }
}

struct MockServices {
    active: Vec<String>,
}

impl ServiceProber for MockServices {
    fn is_active(&self, unit: &str) -> Result<bool> {
        Ok(self.active.iter().any(|u| u == unit))
    }
}

struct MockCerts(Result<Vec<CertExpiry>>);

impl CertStore for MockCerts {
    fn list(&self) -> Result<Vec<CertExpiry>> {
        self.0.clone()
    }
}

struct MockHost;

impl HostStatsProvider for MockHost {
    fn network(&self) -> Result<Vec<NetDevStats>> {
        Ok(vec![NetDevStats {
            interface: "eth0".to_string(),
            rx_bytes: 1000,
            tx_bytes: 2000,
            rx_packets: 10,
            tx_packets: 20,
        }])
    }

    fn load(&self) -> Result<LoadAvg> {
        Ok(LoadAvg {
            one: 0.5,
            five: 0.25,
            fifteen: 0.1,
        })
    }

    fn disks(&self) -> Result<Vec<DiskStats>> {
        Ok(vec![DiskStats {
            mount: "/".to_string(),
            total_bytes: 100_000,
            available_bytes: 40_000,
        }])
    }

    fn connections(&self) -> Result<Option<u64>> {
        Ok(Some(77))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn test_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_800_000_000, 0).unwrap()
}

fn base_config() -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.wireguard.interfaces = vec!["wg0".to_string()];
    config.services.units = vec!["nginx".to_string(), "openvpn-server@server".to_string()];
    config
}

fn collector_with(
    config: CollectorConfig,
    tunnels: MockTunnels,
    status: MockStatus,
    services: MockServices,
    certs: MockCerts,
) -> Collector {
    Collector::with_providers(
        config,
        Box::new(tunnels),
        Box::new(status),
        Box::new(services),
        Box::new(certs),
        Box::new(MockHost),
    )
}

fn healthy_collector() -> Collector {
    let mut snapshots = HashMap::new();
    snapshots.insert(
        "wg0".to_string(),
        TunnelSnapshot {
            peers: vec![
                WgPeer {
                    public_key: "PeerOneKeyBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB=".to_string(),
                    last_handshake: test_now().timestamp() - 125,
                    rx_bytes: 123_456,
                    tx_bytes: 654_321,
                },
                WgPeer {
                    public_key: "PeerTwoKeyCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC=".to_string(),
                    last_handshake: 0,
                    rx_bytes: 0,
                    tx_bytes: 0,
                },
            ],
            malformed: 0,
        },
    );

    collector_with(
        base_config(),
        MockTunnels { snapshots },
        MockStatus(Ok(StatusSnapshot {
            clients: vec![OvpnClient {
                common_name: "alice".to_string(),
                rx_bytes: 3860,
                tx_bytes: 3688,
            }],
            malformed: 0,
        })),
        MockServices {
            active: vec!["nginx".to_string(), "openvpn-server@server".to_string()],
        },
        MockCerts(Ok(vec![CertExpiry {
            domain: "vpn.example.org".to_string(),
            not_after: test_now() + Duration::days(30),
        }])),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_healthy_run_emits_all_sections() {
    let output = healthy_collector().collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_wireguard_interface_up{interface=\"wg0\"} 1"));
    assert!(output.contains("vpn_wireguard_peers{interface=\"wg0\"} 2"));
    assert!(output.contains("vpn_openvpn_up 1"));
    assert!(output.contains("vpn_openvpn_clients 1"));
    assert!(output.contains("vpn_openvpn_client_receive_bytes_total{common_name=\"alice\"} 3860"));
    assert!(output.contains("vpn_service_up{service=\"nginx\"} 1"));
    assert!(output.contains("vpn_cert_expiry_days{domain=\"vpn.example.org\"} 30"));
    assert!(output.contains("vpn_network_receive_bytes_total{interface=\"eth0\"} 1000"));
    assert!(output.contains("vpn_load1 0.5"));
    assert!(output.contains("vpn_disk_available_bytes{mount=\"/\"} 40000"));
    assert!(output.contains("vpn_active_connections 77"));
    assert!(output.contains("vpn_collector_source_up{source=\"wireguard\"} 1"));
    assert!(output.contains("vpn_collector_last_run_timestamp_seconds 1800000000"));
}

#[test]
fn test_interface_down_emits_zero_and_no_peer_lines() {
    let collector = collector_with(
        base_config(),
        MockTunnels {
            snapshots: HashMap::new(),
        },
        MockStatus(Ok(StatusSnapshot::default())),
        MockServices { active: vec![] },
        MockCerts(Ok(vec![])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_wireguard_interface_up{interface=\"wg0\"} 0"));
    assert!(!output.contains("vpn_wireguard_peer_receive_bytes_total{"));
    assert!(!output.contains("vpn_wireguard_peer_transmit_bytes_total{"));
    assert!(!output.contains("vpn_wireguard_peer_last_handshake_seconds{"));
    assert!(output.contains("vpn_collector_source_up{source=\"wireguard\"} 0"));
}

#[test]
fn test_peer_recency_equals_now_minus_handshake() {
    let output = healthy_collector().collect_at(test_now()).unwrap();

    assert!(output.contains(
        "vpn_wireguard_peer_last_handshake_seconds{interface=\"wg0\",peer=\"PeerOneK\"} 125"
    ));
    // A peer that never completed a handshake has counters but no recency
    assert!(output.contains(
        "vpn_wireguard_peer_receive_bytes_total{interface=\"wg0\",peer=\"PeerTwoK\"} 0"
    ));
    assert!(
        !output.contains(
            "vpn_wireguard_peer_last_handshake_seconds{interface=\"wg0\",peer=\"PeerTwoK\"}"
        )
    );
}

#[test]
fn test_expired_certificate_days_are_negative() {
    let collector = collector_with(
        base_config(),
        MockTunnels {
            snapshots: HashMap::new(),
        },
        MockStatus(Ok(StatusSnapshot::default())),
        MockServices { active: vec![] },
        MockCerts(Ok(vec![CertExpiry {
            domain: "old.example.org".to_string(),
            not_after: test_now() - Duration::days(12),
        }])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_cert_expiry_days{domain=\"old.example.org\"} -12"));
}

#[test]
fn test_missing_status_log_is_up_zero_not_an_error() {
    let collector = collector_with(
        base_config(),
        MockTunnels {
            snapshots: HashMap::new(),
        },
        MockStatus(Err(VpnMetricsError::file_operation("no such file"))),
        MockServices { active: vec![] },
        MockCerts(Err(VpnMetricsError::file_operation("no live dir"))),
    );
    // The run itself must still succeed
    let output = collector.collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_openvpn_up 0"));
    assert!(!output.contains("vpn_openvpn_client_receive_bytes_total{"));
    assert!(output.contains("vpn_collector_source_up{source=\"openvpn\"} 0"));
    assert!(output.contains("vpn_collector_source_up{source=\"certificates\"} 0"));
    assert!(!output.contains("vpn_cert_expiry_days{"));
}

#[test]
fn test_inactive_services_read_zero() {
    let collector = collector_with(
        base_config(),
        MockTunnels {
            snapshots: HashMap::new(),
        },
        MockStatus(Ok(StatusSnapshot::default())),
        MockServices {
            active: vec!["nginx".to_string()],
        },
        MockCerts(Ok(vec![])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_service_up{service=\"nginx\"} 1"));
    assert!(output.contains("vpn_service_up{service=\"openvpn-server@server\"} 0"));
}

#[test]
fn test_parse_errors_are_surfaced_per_source() {
    let mut snapshots = HashMap::new();
    snapshots.insert(
        "wg0".to_string(),
        TunnelSnapshot {
            peers: vec![],
            malformed: 3,
        },
    );
    let collector = collector_with(
        base_config(),
        MockTunnels { snapshots },
        MockStatus(Ok(StatusSnapshot {
            clients: vec![],
            malformed: 1,
        })),
        MockServices { active: vec![] },
        MockCerts(Ok(vec![])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    assert!(output.contains("vpn_collector_parse_errors{source=\"wireguard\"} 3"));
    assert!(output.contains("vpn_collector_parse_errors{source=\"openvpn\"} 1"));
}

#[test]
fn test_disabled_sections_emit_nothing() {
    let mut config = base_config();
    config.wireguard.enabled = false;
    config.openvpn.enabled = false;
    config.certificates.enabled = false;

    let collector = collector_with(
        config,
        MockTunnels {
            snapshots: HashMap::new(),
        },
        MockStatus(Ok(StatusSnapshot::default())),
        MockServices { active: vec![] },
        MockCerts(Ok(vec![])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    assert!(!output.contains("vpn_wireguard_interface_up{"));
    assert!(!output.contains("vpn_collector_source_up{source=\"wireguard\"}"));
    assert!(!output.contains("vpn_collector_source_up{source=\"openvpn\"}"));
    // Services and host are always probed
    assert!(output.contains("vpn_collector_source_up{source=\"services\"} 1"));
    assert!(output.contains("vpn_collector_source_up{source=\"host\"} 1"));
}

#[test]
fn test_counter_values_are_idempotent_across_runs() {
    let collector = healthy_collector();
    let first = collector.collect_at(test_now()).unwrap();
    let second = collector.collect_at(test_now()).unwrap();

    let counters = |document: &str| -> Vec<String> {
        document
            .lines()
            .filter(|l| !l.starts_with('#') && l.contains("_total"))
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    assert_eq!(counters(&first), counters(&second));
    assert!(!counters(&first).is_empty());
}

#[test]
fn test_document_is_well_formed_exposition() {
    let output = healthy_collector().collect_at(test_now()).unwrap();
    assert!(!output.is_empty());

    for line in output.lines().filter(|l| !l.starts_with('#')) {
        let name = line
            .split(['{', ' '])
            .next()
            .expect("sample line has a metric name");
        assert!(
            output.contains(&format!("# HELP {name} ")),
            "missing HELP for {name}"
        );
        assert!(
            output.contains(&format!("# TYPE {name} ")),
            "missing TYPE for {name}"
        );
    }
}

#[test]
fn test_namespace_override_prefixes_every_sample() {
    let mut config = base_config();
    config.namespace = "fleet".to_string();
    let mut snapshots = HashMap::new();
    snapshots.insert("wg0".to_string(), TunnelSnapshot::default());
    let collector = collector_with(
        config,
        MockTunnels { snapshots },
        MockStatus(Ok(StatusSnapshot::default())),
        MockServices { active: vec![] },
        MockCerts(Ok(vec![])),
    );
    let output = collector.collect_at(test_now()).unwrap();

    for line in output.lines().filter(|l| !l.starts_with('#') && !l.is_empty()) {
        assert!(line.starts_with("fleet_"), "unprefixed sample: {line}");
    }
}
