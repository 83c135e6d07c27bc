//! OpenVPN status log parsing
//!
//! The daemon's `status` file comes in three historical layouts:
//! status-version 1 (sectioned, comma separated, `Common Name,...` header),
//! status-version 2 (`HEADER,CLIENT_LIST,...` + `CLIENT_LIST,...` rows) and
//! status-version 3 (same as 2 but tab separated). Column positions are
//! taken from the header actually present in the file instead of being
//! assumed, so a daemon with a different column order still parses.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::errors::{Result, VpnMetricsError};

/// One connected client from the status log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvpnClient {
    pub common_name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Parsed client list.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub clients: Vec<OvpnClient>,
    /// Rows that did not match the header arity or carried non-numeric
    /// byte counters.
    pub malformed: u64,
}

/// Client statistics source.
pub trait VpnStatusProvider {
    fn status(&self) -> Result<StatusSnapshot>;
}

/// Production implementation reading the daemon's status file.
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl VpnStatusProvider for StatusFile {
    fn status(&self) -> Result<StatusSnapshot> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            VpnMetricsError::file_operation(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        parse_status(&content)
    }
}

/// Column indices resolved from a header line.
struct ClientColumns {
    common_name: usize,
    rx_bytes: usize,
    tx_bytes: usize,
}

impl ClientColumns {
    fn resolve(columns: &[&str]) -> Option<Self> {
        let find = |name: &str| columns.iter().position(|c| c.trim() == name);
        Some(Self {
            common_name: find("Common Name")?,
            rx_bytes: find("Bytes Received")?,
            tx_bytes: find("Bytes Sent")?,
        })
    }

    fn max_index(&self) -> usize {
        self.common_name.max(self.rx_bytes).max(self.tx_bytes)
    }

    fn extract(&self, values: &[&str], snapshot: &mut StatusSnapshot) {
        if values.len() <= self.max_index() {
            warn!(columns = values.len(), "Skipping short status log row");
            snapshot.malformed += 1;
            return;
        }
        let counters = (
            values[self.rx_bytes].trim().parse::<u64>(),
            values[self.tx_bytes].trim().parse::<u64>(),
        );
        let (Ok(rx_bytes), Ok(tx_bytes)) = counters else {
            warn!("Skipping status log row with non-numeric byte counters");
            snapshot.malformed += 1;
            return;
        };
        snapshot.clients.push(OvpnClient {
            common_name: values[self.common_name].trim().to_string(),
            rx_bytes,
            tx_bytes,
        });
    }
}

/// Parse an OpenVPN status document of any supported status-version.
///
/// Fails only when no client-list header can be located at all; individual
/// bad rows are skipped and counted.
pub fn parse_status(content: &str) -> Result<StatusSnapshot> {
    // status-version 2/3: explicit HEADER,CLIENT_LIST line
    for delimiter in [',', '\t'] {
        if let Some(snapshot) = parse_tagged(content, delimiter) {
            return Ok(snapshot);
        }
    }

    // status-version 1: sectioned layout
    if let Some(snapshot) = parse_sectioned(content) {
        return Ok(snapshot);
    }

    Err(VpnMetricsError::parse(
        "No client list header found in status log",
    ))
}

fn parse_tagged(content: &str, delimiter: char) -> Option<StatusSnapshot> {
    let header = content.lines().find_map(|line| {
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() > 2 && fields[0] == "HEADER" && fields[1] == "CLIENT_LIST" {
            ClientColumns::resolve(&fields[2..])
        } else {
            None
        }
    })?;

    let mut snapshot = StatusSnapshot::default();
    for line in content.lines() {
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.first() == Some(&"CLIENT_LIST") {
            header.extract(&fields[1..], &mut snapshot);
        }
    }
    Some(snapshot)
}

fn parse_sectioned(content: &str) -> Option<StatusSnapshot> {
    let mut lines = content.lines();
    let header = lines.by_ref().find_map(|line| {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.first() == Some(&"Common Name") {
            ClientColumns::resolve(&fields)
        } else {
            None
        }
    })?;

    let mut snapshot = StatusSnapshot::default();
    for line in lines {
        // Client rows run until the next section marker.
        if matches!(line.trim(), "ROUTING TABLE" | "GLOBAL STATS" | "END") {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        header.extract(&fields, &mut snapshot);
    }
    Some(snapshot)
}
