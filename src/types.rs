use crate::ports::PortRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use time::OffsetDateTime;

/// Banner recorded for an open port that sent nothing usable.
pub const UNKNOWN_SERVICE: &str = "Unknown Service";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Open,
    ClosedOrFiltered,
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Open => write!(f, "open"),
            PortStatus::ClosedOrFiltered => write!(f, "closed|filtered"),
            PortStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of probing one port.
///
/// `banner` is only set for open ports and is never empty; `error` is only set
/// when the status is [`PortStatus::Error`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    pub status: PortStatus,
    pub banner: Option<String>,
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl PortResult {
    pub fn open(port: u16, banner: String, latency: Duration) -> Self {
        Self {
            port,
            status: PortStatus::Open,
            banner: Some(banner),
            error: None,
            latency_ms: latency.as_millis() as u64,
        }
    }

    pub fn closed(port: u16, latency: Duration) -> Self {
        Self {
            port,
            status: PortStatus::ClosedOrFiltered,
            banner: None,
            error: None,
            latency_ms: latency.as_millis() as u64,
        }
    }

    pub fn error(port: u16, detail: String, latency: Duration) -> Self {
        Self {
            port,
            status: PortStatus::Error,
            banner: None,
            error: Some(detail),
            latency_ms: latency.as_millis() as u64,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// Aggregate over every result of a finished session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanSummary {
    pub target: IpAddr,
    pub port_range: PortRange,
    /// Open ports in completion order, not numeric order.
    pub open_ports: Vec<u16>,
    pub open_count: usize,
    /// Open-port results (with banners), same order as `open_ports`.
    pub entries: Vec<PortResult>,
    /// Number of results consumed; equals `port_range.len()` for a full scan.
    pub scanned: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub elapsed: Duration,
}
