use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use portprobe_rs::config::{FaultPolicy, ProbeOptions, ScanConfig, DEFAULT_READ_BUFFER};
use portprobe_rs::ports::PortRange;
use portprobe_rs::report::{ConsoleReporter, JsonReporter, ScanObserver};
use portprobe_rs::resolve::SystemResolver;
use portprobe_rs::{ScanError, ScanSession};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// portprobe-rs — concurrent TCP connect scanner that captures service banners.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portprobe-rs",
    version,
    about = "Concurrent TCP connect scanner that captures service banners.",
    long_about = None
)]
struct Cli {
    /// Hostname or IP to scan. Prompted for interactively if omitted.
    target: Option<String>,

    /// Inclusive port range (`start-end`) or a single port.
    #[arg(long, default_value = "1-1024")]
    ports: PortRange,

    /// Max concurrent probes in flight.
    #[arg(long, default_value_t = 100)]
    concurrency: usize,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Banner read timeout in milliseconds (defaults to the connect timeout).
    #[arg(long = "read-timeout-ms")]
    read_timeout_ms: Option<u64>,

    /// Report unexpected connect faults as errors instead of closed ports.
    #[arg(long = "report-errors", default_value_t = false)]
    report_errors: bool,

    /// Print the final summary as JSON instead of progress lines.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        let connect_timeout = Duration::from_millis(self.timeout_ms);
        ScanConfig {
            port_range: self.ports,
            concurrency: self.concurrency,
            probe: ProbeOptions {
                connect_timeout,
                read_timeout: self
                    .read_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(connect_timeout),
                read_buffer: DEFAULT_READ_BUFFER,
                fault_policy: if self.report_errors {
                    FaultPolicy::Surface
                } else {
                    FaultPolicy::Normalize
                },
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let target = match cli.target.clone() {
        Some(t) => t,
        None => tokio::task::spawn_blocking(prompt_target)
            .await
            .context("target prompt task failed")??,
    };

    let session = ScanSession::new(SystemResolver, cli.scan_config());

    // Ctrl-C cancels the scan.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    let outcome = if cli.json {
        run(&session, &target, &mut JsonReporter::stdout(), &cancel).await
    } else {
        run(&session, &target, &mut ConsoleReporter::stdout(), &cancel).await
    };
    Ok(outcome)
}

async fn run<O: ScanObserver>(
    session: &ScanSession<SystemResolver>,
    target: &str,
    observer: &mut O,
    cancel: &CancellationToken,
) -> ExitCode {
    match session.run(target, observer, cancel).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(ScanError::Resolution { reason, .. }) => {
            tracing::debug!(%reason, "resolution failed");
            eprintln!("\n[!] Error: Hostname could not be resolved.");
            ExitCode::FAILURE
        }
        Err(ScanError::Interrupted { .. }) => {
            eprintln!("\n\n[!] User interrupted the scan. Exiting...");
            ExitCode::from(130)
        }
    }
}

fn prompt_target() -> Result<String> {
    print!("Enter target IP or URL (e.g., scanme.nmap.org): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read target from stdin")?;
    Ok(line.trim().to_string())
}
