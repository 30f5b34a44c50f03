use crate::error::{Result, ScanError};
use std::future::Future;
use std::net::IpAddr;

/// Turns user input (hostname or IP literal) into the address to scan.
pub trait Resolver {
    fn resolve(&self, input: &str) -> impl Future<Output = Result<IpAddr>> + Send;
}

/// Resolver backed by the operating system's name lookup.
///
/// IP literals are returned as-is. For hostnames an IPv4 address is preferred
/// when the lookup yields both families.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    async fn resolve(&self, input: &str) -> Result<IpAddr> {
        let host = input.trim();
        if host.is_empty() {
            return Err(ScanError::resolution(input, "empty target"));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| ScanError::resolution(host, e))?
            .map(|sa| sa.ip())
            .collect();
        tracing::debug!(host, ?addrs, "resolved");

        pick_address(&addrs).ok_or_else(|| ScanError::resolution(host, "no addresses found"))
    }
}

fn pick_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}
