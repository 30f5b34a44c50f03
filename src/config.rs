use crate::ports::PortRange;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const MAX_CONCURRENCY: usize = 5_000;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_READ_BUFFER: usize = 1024;

/// How connect faults other than "refused" and "timed out" are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Every fault reads as closed/filtered.
    #[default]
    Normalize,
    /// Unexpected faults (unreachable, permission denied, ...) become `Error` results.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub read_buffer: usize,
    pub fault_policy: FaultPolicy,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_buffer: DEFAULT_READ_BUFFER,
            fault_policy: FaultPolicy::Normalize,
        }
    }
}

/// Settings for one scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub port_range: PortRange,
    pub concurrency: usize,
    pub probe: ProbeOptions,
}

impl ScanConfig {
    /// Concurrency actually used by the coordinator.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port_range: PortRange::default(),
            concurrency: DEFAULT_CONCURRENCY,
            probe: ProbeOptions::default(),
        }
    }
}
