use crate::config::{ProbeOptions, MAX_CONCURRENCY};
use crate::ports::PortRange;
use crate::probe::probe;
use crate::types::PortResult;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Completion-ordered results of one scan, consumed with [`ScanStream::next`].
///
/// Yields exactly one [`PortResult`] per port of the range and then `None`,
/// unless the scan is cancelled, in which case it yields `None` right away and
/// outstanding results are discarded. Dropping the stream cancels the scan.
pub struct ScanStream {
    rx: mpsc::Receiver<PortResult>,
    cancel: CancellationToken,
    dispatched: Arc<AtomicUsize>,
    total: usize,
    _guard: DropGuard,
}

impl ScanStream {
    /// Next finished probe, in completion order.
    pub async fn next(&mut self) -> Option<PortResult> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            res = self.rx.recv() => res,
        }
    }

    /// Number of probes handed to the worker pool so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Acquire)
    }

    /// Number of ports this scan covers.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain the stream into a vector.
    pub async fn collect(mut self) -> Vec<PortResult> {
        let mut out = Vec::with_capacity(self.total);
        while let Some(r) = self.next().await {
            out.push(r);
        }
        out
    }
}

/// Start probing every port of `range` on `target` with at most `concurrency`
/// probes in flight.
///
/// Dispatch happens on a background task; results arrive on the returned
/// stream as soon as each probe finishes. Cancelling `cancel` (or dropping the
/// stream) stops dispatch and aborts in-flight probes. Must be called from
/// within a Tokio runtime.
pub fn scan_ports(
    target: IpAddr,
    range: PortRange,
    concurrency: usize,
    opts: ProbeOptions,
    cancel: &CancellationToken,
) -> ScanStream {
    let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
    let cancel = cancel.child_token();
    let (tx, rx) = mpsc::channel(concurrency);
    let dispatched = Arc::new(AtomicUsize::new(0));

    tokio::spawn(dispatch(
        target,
        range,
        concurrency,
        opts,
        tx,
        cancel.clone(),
        dispatched.clone(),
    ));

    ScanStream {
        rx,
        cancel: cancel.clone(),
        dispatched,
        total: range.len(),
        _guard: cancel.drop_guard(),
    }
}

async fn dispatch(
    target: IpAddr,
    range: PortRange,
    concurrency: usize,
    opts: ProbeOptions,
    tx: mpsc::Sender<PortResult>,
    cancel: CancellationToken,
    dispatched: Arc<AtomicUsize>,
) {
    let sem = Arc::new(Semaphore::new(concurrency));
    let mut set = JoinSet::new();
    tracing::debug!(%target, %range, concurrency, "dispatching probes");

    for port in range.iter() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = sem.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
        };
        // Reap finished tasks so the set stays bounded by the pool size.
        while set.try_join_next().is_some() {}

        dispatched.fetch_add(1, Ordering::AcqRel);
        let tx = tx.clone();
        set.spawn(async move {
            let _permit = permit; // held until the result is handed off
            let result = probe(target, port, &opts).await;
            let _ = tx.send(result).await;
        });
    }
    drop(tx);

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = drain(&mut set) => return,
    }

    tracing::debug!(
        dispatched = dispatched.load(Ordering::Acquire),
        in_flight = set.len(),
        "scan cancelled, abandoning in-flight probes"
    );
    set.abort_all();
    drain(&mut set).await;
}

async fn drain(set: &mut JoinSet<()>) {
    while set.join_next().await.is_some() {}
}
