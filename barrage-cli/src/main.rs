use anyhow::Context;
use barrage::prelude::*;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_FILTER: &str = "barrage=info";

/// Send a fixed number of requests with bounded concurrency and report latency statistics.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// JSON run configuration
    #[arg(short('f'), long)]
    config: PathBuf,

    /// Override the configured concurrency limit
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Override the configured total number of requests
    #[arg(short('n'), long)]
    requests: Option<u64>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also list every successful request
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, mut config: RunConfig) -> Result<RunConfig, ConfigError> {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(requests) = self.requests {
            config.requests = requests;
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RunConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = cli.apply(config)?;

    let transport = match config.timeout {
        Some(timeout) => HttpTransport::with_timeout(timeout)?,
        None => HttpTransport::new(),
    };
    let barrage = Barrage::from_config(&config, transport)?;

    let results = match &config.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report file {}", path.display()))?;
            let reporter = TextReporter::new(BufWriter::new(file)).verbose(cli.verbose);
            barrage.reporter(reporter).await?
        }
        None => {
            let reporter = TextReporter::stdout().verbose(cli.verbose);
            barrage.reporter(reporter).await?
        }
    };

    info!(
        "{} requests: {} succeeded, {} failed",
        results.total(),
        results.successes.len(),
        results.failures.len()
    );

    Ok(())
}
