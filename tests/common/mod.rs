#![allow(dead_code)]

use portprobe_rs::error::Result;
use portprobe_rs::ports::PortRange;
use portprobe_rs::report::ScanObserver;
use portprobe_rs::resolve::Resolver;
use portprobe_rs::types::{PortResult, ScanSummary};
use portprobe_rs::ScanError;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Listener that accepts connections and never writes.
pub async fn silent_listener() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    port
}

/// Listener that greets every connection with `banner`.
pub async fn banner_listener(banner: &'static [u8]) -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = sock.write_all(banner).await;
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            });
        }
    });
    port
}

/// A port that was just bound and released, so connections are refused.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Range of `len` ports containing `port`, kept inside 1..=65535.
pub fn range_around(port: u16, len: u16) -> PortRange {
    let start = port.saturating_sub(len / 2).max(1);
    let end = start.saturating_add(len - 1);
    let start = end - (len - 1);
    PortRange::new(start, end).unwrap()
}

/// Resolves every input to a fixed address and counts calls.
#[derive(Clone, Default)]
pub struct FixedResolver {
    pub calls: Arc<AtomicUsize>,
}

impl Resolver for FixedResolver {
    async fn resolve(&self, _input: &str) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LOCALHOST)
    }
}

/// Always fails like an unknown hostname.
pub struct FailingResolver;

impl Resolver for FailingResolver {
    async fn resolve(&self, input: &str) -> Result<IpAddr> {
        Err(ScanError::resolution(input, "Name or service not known"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(IpAddr, PortRange),
    Open(u16, String),
    Finished(usize),
}

/// Records events; optionally cancels the session on the first open port.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub cancel_on_open: Option<CancellationToken>,
}

impl ScanObserver for Recorder {
    fn on_scan_started(&mut self, target: IpAddr, _: time::OffsetDateTime, range: PortRange) {
        self.events.push(Event::Started(target, range));
    }

    fn on_open_port(&mut self, result: &PortResult) {
        self.events.push(Event::Open(
            result.port,
            result.banner.clone().unwrap_or_default(),
        ));
        if let Some(c) = &self.cancel_on_open {
            c.cancel();
        }
    }

    fn on_scan_finished(&mut self, summary: &ScanSummary) {
        self.events.push(Event::Finished(summary.open_count));
    }
}

/// Binds `n` silent listeners on consecutive ports below the ephemeral range
/// (and clear of the ranges other tests scan) and counts accepted
/// connections across all of them.
pub async fn consecutive_silent_listeners(n: u16) -> (PortRange, Arc<AtomicUsize>) {
    let accepted = Arc::new(AtomicUsize::new(0));
    for base in (22_000u16..32_000).step_by(263) {
        let mut listeners = Vec::with_capacity(usize::from(n));
        for port in base..base + n {
            match TcpListener::bind((LOCALHOST, port)).await {
                Ok(l) => listeners.push(l),
                Err(_) => break,
            }
        }
        if listeners.len() != usize::from(n) {
            continue;
        }
        for listener in listeners {
            let accepted = accepted.clone();
            tokio::spawn(async move {
                let mut held = Vec::new();
                while let Ok((sock, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    held.push(sock);
                }
            });
        }
        return (PortRange::new(base, base + n - 1).unwrap(), accepted);
    }
    panic!("no block of {n} free consecutive ports");
}
