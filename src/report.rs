use crate::ports::PortRange;
use crate::types::{PortResult, ScanSummary, UNKNOWN_SERVICE};
use std::io::{self, Write};
use std::net::IpAddr;
use time::OffsetDateTime;

/// Receives session events as they happen.
///
/// Order is always: one `on_scan_started`, zero or more `on_open_port` in
/// completion order, then `on_scan_finished` (omitted if the scan is
/// interrupted or never starts).
pub trait ScanObserver {
    fn on_scan_started(&mut self, target: IpAddr, started_at: OffsetDateTime, range: PortRange);
    fn on_open_port(&mut self, result: &PortResult);
    fn on_scan_finished(&mut self, summary: &ScanSummary);
}

const RULE: &str = "--------------------------------------------------";
const BANNER_MAX: usize = 60;

/// Human-readable progress lines written to any `Write` (stdout by default).
pub struct ConsoleReporter<W: Write = std::io::Stdout> {
    out: W,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_started(
        &mut self,
        target: IpAddr,
        started_at: OffsetDateTime,
        range: PortRange,
    ) -> io::Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Scanning Target: {target}")?;
        writeln!(self.out, "Time Started:    {}", format_time(started_at))?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Scanning ports {range}... please wait.\n")?;
        self.out.flush()
    }

    fn write_open(&mut self, result: &PortResult) -> io::Result<()> {
        let banner = banner_snippet(result.banner.as_deref().unwrap_or(UNKNOWN_SERVICE));
        writeln!(self.out, "[+] Port {:<5} is OPEN  :  {}", result.port, banner)?;
        self.out.flush()
    }

    fn write_finished(&mut self, summary: &ScanSummary) -> io::Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(
            self.out,
            "Scan completed in {:.2} seconds.",
            summary.elapsed.as_secs_f64()
        )?;
        writeln!(self.out, "Total Open Ports: {}", summary.open_count)?;
        writeln!(self.out, "{RULE}")?;
        self.out.flush()
    }
}

impl<W: Write> ScanObserver for ConsoleReporter<W> {
    fn on_scan_started(&mut self, target: IpAddr, started_at: OffsetDateTime, range: PortRange) {
        if let Err(e) = self.write_started(target, started_at, range) {
            tracing::warn!(error = %e, "failed to write scan header");
        }
    }

    fn on_open_port(&mut self, result: &PortResult) {
        if let Err(e) = self.write_open(result) {
            tracing::warn!(port = result.port, error = %e, "failed to write open port");
        }
    }

    fn on_scan_finished(&mut self, summary: &ScanSummary) {
        if let Err(e) = self.write_finished(summary) {
            tracing::warn!(error = %e, "failed to write scan summary");
        }
    }
}

/// Prints only the final summary as pretty JSON.
pub struct JsonReporter<W: Write = std::io::Stdout> {
    out: W,
}

impl JsonReporter {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ScanObserver for JsonReporter<W> {
    fn on_scan_started(&mut self, _: IpAddr, _: OffsetDateTime, _: PortRange) {}

    fn on_open_port(&mut self, _: &PortResult) {}

    fn on_scan_finished(&mut self, summary: &ScanSummary) {
        let res = serde_json::to_writer_pretty(&mut self.out, summary)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = res {
            tracing::error!(error = %e, "failed to write JSON summary");
        }
    }
}

/// Cap the banner at `BANNER_MAX` characters, then escape control characters.
fn banner_snippet(banner: &str) -> String {
    let mut s: String = banner
        .chars()
        .take(BANNER_MAX)
        .flat_map(char::escape_debug)
        .collect();
    if banner.chars().nth(BANNER_MAX).is_some() {
        s.push_str("...");
    }
    s
}

fn format_time(t: OffsetDateTime) -> String {
    t.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn summary() -> ScanSummary {
        let now = OffsetDateTime::UNIX_EPOCH;
        ScanSummary {
            target: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port_range: PortRange::default(),
            open_ports: vec![80],
            open_count: 1,
            entries: vec![PortResult::open(80, UNKNOWN_SERVICE.into(), Duration::ZERO)],
            scanned: 1024,
            started_at: now,
            finished_at: now + Duration::from_millis(1500),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn snippet_escapes_and_truncates() {
        assert_eq!(banner_snippet("220 ready\r\nok"), "220 ready\\r\\nok");
        let long = "x".repeat(100);
        assert_eq!(banner_snippet(&long).len(), BANNER_MAX + 3);
    }

    #[test]
    fn snippet_never_splits_an_escape() {
        let banner = format!("{}\u{1b}[0m tail", "a".repeat(BANNER_MAX - 1));
        let snip = banner_snippet(&banner);
        assert_eq!(snip, format!("{}\\u{{1b}}...", "a".repeat(BANNER_MAX - 1)));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn write_failures_are_reported_not_fatal() {
        let s = summary();
        let mut rep = ConsoleReporter::new(BrokenPipe);
        assert!(rep.write_started(s.target, s.started_at, s.port_range).is_err());
        assert!(rep.write_open(&s.entries[0]).is_err());
        rep.on_scan_started(s.target, s.started_at, s.port_range);
        rep.on_open_port(&s.entries[0]);
        rep.on_scan_finished(&s);

        let mut json = JsonReporter::new(BrokenPipe);
        json.on_scan_finished(&s);
    }

    #[test]
    fn console_layout() {
        let mut rep = ConsoleReporter::new(Vec::new());
        let s = summary();
        rep.on_scan_started(s.target, s.started_at, s.port_range);
        rep.on_open_port(&s.entries[0]);
        rep.on_scan_finished(&s);
        let text = String::from_utf8(rep.into_inner()).unwrap();
        assert!(text.contains("Scanning Target: 127.0.0.1"));
        assert!(text.contains("Time Started:    1970-01-01T00:00:00Z"));
        assert!(text.contains("[+] Port 80    is OPEN  :  Unknown Service"));
        assert!(text.contains("Scan completed in 1.50 seconds."));
        assert!(text.contains("Total Open Ports: 1"));
    }

    #[test]
    fn json_summary_parses_back() {
        let mut rep = JsonReporter::new(Vec::new());
        let s = summary();
        rep.on_open_port(&s.entries[0]);
        rep.on_scan_finished(&s);
        let text = String::from_utf8(rep.into_inner()).unwrap();
        let back: ScanSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
        assert!(text.contains("\"started_at\": \"1970-01-01T00:00:00Z\""));
    }
}
