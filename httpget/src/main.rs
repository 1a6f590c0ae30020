use anyhow::{Context, Result};
use clap::Parser;
use httpget_core::TargetReader;
use plaintext_check::{Classifier, HttpFetcher};
use results_files::ReportFiles;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod run;

use run::Finish;

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Debug, Parser)]
#[command(
    name = "httpget",
    version,
    about = "Separate genuinely plaintext HTTP services from ones that redirect to HTTPS with HSTS"
)]
struct Cli {
    /// File with one host:port per line
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,
    /// Directory for the output files (default: current directory)
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", env = "HTTPGET_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// Optional config file (YAML). If omitted, loads ./httpget.yaml if present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Timeout per request in milliseconds (default 5000)
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Targets probed at once; 1 keeps the scan strictly sequential
    #[arg(long)]
    concurrency: Option<usize>,
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no handler could be installed; never interrupt
        std::future::pending::<()>().await;
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let loaded_cfg = config::load_config(cli.config.as_deref())?;
    let overrides = config::Overrides {
        output_dir: cli.output_dir,
        timeout_ms: cli.timeout_ms,
        concurrency: cli.concurrency,
    };
    let settings = config::Settings::resolve(overrides, loaded_cfg.as_ref())?;

    info!("Target file is {}", cli.input.display());
    let input = File::open(&cli.input).with_context(|| format!("cannot open input {}", cli.input.display()))?;
    let report = ReportFiles::open_or_create(&settings.output_dir)?;
    info!("Writing results to {}", settings.output_dir.display());

    let classifier =
        Classifier::new(HttpFetcher::new(&settings.fetch)?).with_min_max_age(settings.min_hsts_max_age);
    let started_at = now_rfc3339();
    let rt = tokio::runtime::Runtime::new()?;
    let finish = rt.block_on(run::run_audit(
        TargetReader::new(BufReader::new(input)),
        &classifier,
        report,
        settings.concurrency,
        ctrl_c(),
    ))?;
    let ended_at = now_rfc3339();

    match finish {
        Finish::Completed(tally) => {
            info!(%started_at, %ended_at, "Finished testing all hosts! {}", tally);
        }
        Finish::Interrupted(tally) => {
            warn!(%started_at, %ended_at, "Interrupted, output files flushed. {}", tally);
            drop(rt);
            std::process::exit(130);
        }
    }
    Ok(())
}
