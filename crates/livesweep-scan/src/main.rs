//! CLI entry point for the livesweep range scanner.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use livesweep_core::{build_targets, SamplingPolicy};
use livesweep_scan::config::{load_sweep_config, SweepConfig};
use livesweep_scan::input::load_ranges;
use livesweep_scan::prober::PingProber;
use livesweep_scan::progress::LogReporter;
use livesweep_scan::sink::FileSink;
use livesweep_scan::{ScanOrchestrator, ScanReport, ScanSettings, Termination};

#[derive(Parser)]
#[command(name = "livesweep")]
#[command(about = "Ping sweep over IPv4 address ranges, saving partial results on interrupt")]
struct Cli {
    /// Range file: one `start end` address pair (or CIDR) per line.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sampling policy: edge_only, sample, full.
    #[arg(short, long)]
    policy: Option<SamplingPolicy>,

    /// Stride between sampled addresses for the `sample` policy.
    #[arg(long)]
    step: Option<u32>,

    /// Number of concurrent probes.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-probe timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Tab-delimited output file.
    #[arg(long)]
    out_txt: Option<PathBuf>,

    /// CSV output file.
    #[arg(long)]
    out_csv: Option<PathBuf>,

    /// Path to the ping binary.
    #[arg(long)]
    ping: Option<String>,

    /// Config file prefix (default: livesweep).
    #[arg(short, long, default_value = "livesweep")]
    config: String,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Flags given on the command line win over file and environment values.
    fn apply(&self, config: &mut SweepConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(step) = self.step {
            config.sample_step = step;
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.probe_timeout_ms = timeout_ms;
        }
        if let Some(path) = &self.out_txt {
            config.output_txt = path.clone();
        }
        if let Some(path) = &self.out_csv {
            config.output_csv = path.clone();
        }
        if let Some(ping) = &self.ping {
            config.ping_path = ping.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut sweep = load_sweep_config(&cli.config)?;
    cli.apply(&mut sweep);
    sweep.validate()?;

    let ranges = load_ranges(&sweep.input)?;
    let targets = build_targets(&ranges, sweep.policy, sweep.sample_step);

    tracing::info!(
        policy = %sweep.policy,
        ranges = ranges.len(),
        candidates = targets.len(),
        workers = sweep.max_workers,
        timeout_ms = sweep.probe_timeout_ms,
        "Candidate addresses ready"
    );

    let sink = FileSink::new(&sweep.output_txt, &sweep.output_csv);
    let orchestrator = ScanOrchestrator::new(
        ScanSettings::from(&sweep),
        Arc::new(PingProber::new(&sweep.ping_path)),
        Arc::new(sink.clone()),
    );

    let report = orchestrator
        .run(targets, &mut LogReporter, interrupted())
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &sink);
    }

    if let Termination::Failed(reason) = &report.termination {
        anyhow::bail!("Sweep aborted: {reason}");
    }

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the sweep simply
/// runs to completion.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("Interrupt received, stopping workers and saving partial results");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

fn print_summary(report: &ScanReport, sink: &FileSink) {
    let txt = sink.txt_path().display();
    let csv = sink.csv_path().display();
    let live = report.live.len();

    match &report.termination {
        Termination::Completed => {
            println!("\nFinished. Live hosts found: {live}");
            println!("Results saved to {txt} and {csv}");
        }
        Termination::Cancelled => {
            println!(
                "Saved partial {live} live entries to {txt} and {csv} ({}/{} processed)",
                report.processed, report.total
            );
        }
        Termination::Failed(_) => {
            println!("Saved {live} live entries found before the failure to {txt} and {csv}");
        }
    }
}
