//! Configuration loading and validation
//!
//! All knobs live in one [`CollectorConfig`] struct that is passed
//! explicitly into the collection routine; nothing reads the environment
//! after startup. Values come from an optional TOML file plus
//! `VPNMETRICS_`-prefixed environment variables (double underscore as the
//! section separator, e.g. `VPNMETRICS_OUTPUT__DIRECTORY`).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::{Result, VpnMetricsError};

/// Top-level collector configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Metric namespace prefix (`vpn` -> `vpn_wireguard_interface_up`).
    pub namespace: String,
    pub output: OutputConfig,
    pub wireguard: WireguardConfig,
    pub openvpn: OpenVpnConfig,
    pub services: ServicesConfig,
    pub certificates: CertificatesConfig,
    pub host: HostConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory scraped by the host metrics agent's textfile collector.
    pub directory: PathBuf,
    /// File name of the published document inside `directory`.
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WireguardConfig {
    pub enabled: bool,
    /// Path or name of the `wg` binary.
    pub binary: String,
    /// Tunnel interfaces to query.
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenVpnConfig {
    pub enabled: bool,
    /// Status log maintained by the OpenVPN daemon (`status` directive).
    pub status_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// systemd units probed for liveness.
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CertificatesConfig {
    pub enabled: bool,
    /// Let's Encrypt style directory: one subdirectory per domain, each
    /// containing a `fullchain.pem`.
    pub live_dir: PathBuf,
    /// Path or name of the `openssl` binary.
    pub openssl_binary: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Network interfaces to report; empty means all.
    pub interfaces: Vec<String>,
    /// Mount points to report disk usage for; empty means all.
    pub mounts: Vec<String>,
    /// Kernel conntrack count file; absence means the gauge is skipped.
    pub conntrack_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. `info` or `vpnmetrics=debug`.
    pub level: String,
    /// Log file path; empty or unset logs to stderr.
    pub file: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            namespace: "vpn".to_string(),
            output: OutputConfig::default(),
            wireguard: WireguardConfig::default(),
            openvpn: OpenVpnConfig::default(),
            services: ServicesConfig::default(),
            certificates: CertificatesConfig::default(),
            host: HostConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/lib/node_exporter/textfile_collector"),
            file_name: "vpnmetrics.prom".to_string(),
        }
    }
}

impl Default for WireguardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "wg".to_string(),
            interfaces: vec!["wg0".to_string()],
        }
    }
}

impl Default for OpenVpnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            status_path: PathBuf::from("/var/log/openvpn/status.log"),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            units: vec![
                "wg-quick@wg0".to_string(),
                "openvpn-server@server".to_string(),
                "nginx".to_string(),
                "node_exporter".to_string(),
            ],
        }
    }
}

impl Default for CertificatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            live_dir: PathBuf::from("/etc/letsencrypt/live"),
            openssl_binary: "openssl".to_string(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            mounts: Vec::new(),
            conntrack_path: PathBuf::from("/proc/sys/net/netfilter/nf_conntrack_count"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl CollectorConfig {
    /// Load configuration from an optional file plus the environment.
    ///
    /// A file passed explicitly must exist; the default `vpnmetrics.toml`
    /// lookup is best-effort.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("vpnmetrics").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("VPNMETRICS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("wireguard.interfaces")
                .with_list_parse_key("services.units")
                .with_list_parse_key("host.interfaces")
                .with_list_parse_key("host.mounts"),
        );

        let cfg: CollectorConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would produce an invalid exposition document or
    /// an unusable output path.
    pub fn validate(&self) -> Result<()> {
        validate_namespace(&self.namespace)?;

        if self.output.file_name.is_empty() || self.output.file_name.contains('/') {
            return Err(VpnMetricsError::validation(format!(
                "Invalid output file name: '{}'",
                self.output.file_name
            )));
        }

        Ok(())
    }
}

/// A namespace must be a legal metric-name prefix: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn validate_namespace(namespace: &str) -> Result<()> {
    let mut chars = namespace.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(VpnMetricsError::validation(format!(
            "Invalid metric namespace: '{}'",
            namespace
        )))
    }
}
