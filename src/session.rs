//! Top-level orchestration of one scan: resolve, probe, summarise.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::report::ScanObserver;
use crate::resolve::Resolver;
use crate::scanner::scan_ports;
use crate::types::{PortStatus, ScanSummary};
use time::OffsetDateTime;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct ScanSession<R> {
    resolver: R,
    config: ScanConfig,
}

impl<R: Resolver> ScanSession<R> {
    pub fn new(resolver: R, config: ScanConfig) -> Self {
        Self { resolver, config }
    }

    /// Resolve `target_input`, scan the configured range and return the summary.
    ///
    /// Open ports are forwarded to `observer` as they are found. Resolution
    /// failure returns before any probe is dispatched. Cancelling `cancel`
    /// stops the scan and yields [`ScanError::Interrupted`].
    pub async fn run<O: ScanObserver>(
        &self,
        target_input: &str,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> Result<ScanSummary> {
        let target = self.resolver.resolve(target_input).await?;
        let range = self.config.port_range;

        let started_at = OffsetDateTime::now_utc();
        let clock = Instant::now();
        tracing::info!(%target, %range, concurrency = self.config.effective_concurrency(), "scan started");
        observer.on_scan_started(target, started_at, range);

        let mut stream = scan_ports(
            target,
            range,
            self.config.concurrency,
            self.config.probe,
            cancel,
        );

        let mut scanned = 0usize;
        let mut open_ports = Vec::new();
        let mut entries = Vec::new();
        while let Some(result) = stream.next().await {
            scanned += 1;
            match result.status {
                PortStatus::Open => {
                    observer.on_open_port(&result);
                    open_ports.push(result.port);
                    entries.push(result);
                }
                PortStatus::Error => {
                    tracing::warn!(port = result.port, error = ?result.error, "probe fault");
                }
                PortStatus::ClosedOrFiltered => {}
            }
        }

        if stream.is_cancelled() && scanned < stream.total() {
            tracing::warn!(
                completed = scanned,
                dispatched = stream.dispatched(),
                "scan interrupted"
            );
            return Err(ScanError::Interrupted {
                completed: scanned,
                open: open_ports.len(),
            });
        }

        let elapsed = clock.elapsed();
        let finished_at = OffsetDateTime::now_utc();
        let summary = ScanSummary {
            target,
            port_range: range,
            open_count: open_ports.len(),
            open_ports,
            entries,
            scanned,
            started_at,
            finished_at,
            elapsed,
        };
        tracing::info!(
            open = summary.open_count,
            scanned,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );
        observer.on_scan_finished(&summary);
        Ok(summary)
    }
}
