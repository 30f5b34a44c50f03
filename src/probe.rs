use crate::config::{FaultPolicy, ProbeOptions};
use crate::types::{PortResult, UNKNOWN_SERVICE};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

/// Probe a single port: bounded TCP connect, then a bounded passive banner read.
///
/// Never fails. Connect faults become a closed/filtered result (or an error
/// result under [`FaultPolicy::Surface`]), read faults become the
/// [`UNKNOWN_SERVICE`] banner. The socket is closed before returning.
pub async fn probe(target: IpAddr, port: u16, opts: &ProbeOptions) -> PortResult {
    let addr = SocketAddr::new(target, port);
    let start = Instant::now();
    let connect_res = time::timeout(opts.connect_timeout, TcpStream::connect(addr)).await;
    let latency = start.elapsed();

    match connect_res {
        Ok(Ok(mut stream)) => {
            let banner = read_banner(&mut stream, opts).await;
            tracing::trace!(%addr, ?latency, "open");
            PortResult::open(port, banner, latency)
        }
        Ok(Err(e)) => classify_fault(port, e, opts.fault_policy, latency),
        Err(_) => {
            tracing::trace!(%addr, "connect timed out");
            PortResult::closed(port, latency)
        }
    }
}

fn classify_fault(
    port: u16,
    err: io::Error,
    policy: FaultPolicy,
    latency: std::time::Duration,
) -> PortResult {
    tracing::trace!(port, error = %err, "connect failed");
    let expected = matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut | io::ErrorKind::ConnectionReset
    );
    match policy {
        FaultPolicy::Surface if !expected => PortResult::error(port, err.to_string(), latency),
        _ => PortResult::closed(port, latency),
    }
}

/// Read up to `read_buffer` bytes within `read_timeout` and decode them as the banner.
async fn read_banner(stream: &mut TcpStream, opts: &ProbeOptions) -> String {
    let mut buf = vec![0u8; opts.read_buffer.max(1)];
    match time::timeout(opts.read_timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => decode_banner(&buf[..n]),
        _ => UNKNOWN_SERVICE.to_string(),
    }
}

/// Strict UTF-8 decode and trim; anything unusable maps to the sentinel.
pub fn decode_banner(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes).map(str::trim) {
        Ok(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN_SERVICE.to_string(),
    }
}
