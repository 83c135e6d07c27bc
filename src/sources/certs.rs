//! Certificate expiry lookup
//!
//! Walks a Let's Encrypt style `live/` directory (one subdirectory per
//! domain) and asks `openssl x509 -enddate -noout` for each domain's
//! `fullchain.pem`. Only the notAfter timestamp is consumed; parsing and
//! renewal stay the CA tooling's business.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::errors::{Result, VpnMetricsError};

/// Expiry of one issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertExpiry {
    pub domain: String,
    pub not_after: DateTime<Utc>,
}

/// Certificate store source.
pub trait CertStore {
    fn list(&self) -> Result<Vec<CertExpiry>>;
}

/// Production implementation over a certbot `live/` directory.
pub struct LetsEncryptDir {
    live_dir: PathBuf,
    openssl: String,
}

impl LetsEncryptDir {
    pub fn new<P: Into<PathBuf>, T: Into<String>>(live_dir: P, openssl: T) -> Self {
        Self {
            live_dir: live_dir.into(),
            openssl: openssl.into(),
        }
    }
}

impl CertStore for LetsEncryptDir {
    fn list(&self) -> Result<Vec<CertExpiry>> {
        let entries = fs::read_dir(&self.live_dir).map_err(|e| {
            VpnMetricsError::file_operation(format!(
                "Failed to read {}: {}",
                self.live_dir.display(),
                e
            ))
        })?;

        let mut certs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            // certbot keeps a README next to the domain directories
            if !path.is_dir() {
                continue;
            }
            let fullchain = path.join("fullchain.pem");
            if !fullchain.is_file() {
                continue;
            }

            let domain = entry.file_name().to_string_lossy().to_string();
            let output = Command::new(&self.openssl)
                .args(["x509", "-enddate", "-noout", "-in"])
                .arg(&fullchain)
                .output()
                .map_err(|e| {
                    VpnMetricsError::command_failed(format!(
                        "Failed to run {}: {}",
                        self.openssl, e
                    ))
                })?;

            if !output.status.success() {
                warn!(domain = %domain, "openssl could not read certificate, skipping");
                continue;
            }

            match parse_not_after(&String::from_utf8_lossy(&output.stdout)) {
                Ok(not_after) => certs.push(CertExpiry { domain, not_after }),
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Unparseable certificate end date, skipping");
                }
            }
        }

        Ok(certs)
    }
}

/// Parse openssl's `notAfter=Dec 31 23:59:59 2026 GMT` line.
pub fn parse_not_after(line: &str) -> Result<DateTime<Utc>> {
    let rest = line
        .trim()
        .strip_prefix("notAfter=")
        .ok_or_else(|| VpnMetricsError::date_parse(format!("Unexpected enddate line: {line:?}")))?;

    // openssl pads single-digit days with a space ("Jan  1 ..."), so go
    // through split_whitespace instead of a fixed-width format.
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(VpnMetricsError::date_parse(format!(
            "Unexpected enddate line: {line:?}"
        )));
    }

    let normalized = format!("{} {} {} {}", parts[0], parts[1], parts[2], parts[3]);
    let naive = NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y")?;
    Ok(naive.and_utc())
}
