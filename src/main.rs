// src/main.rs

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use depslist::encode::{self, create_output};
use depslist::{read_batch, DepslistConfig, ResolutionContext, SchedulePolicy};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "gendepslist")]
#[command(author, version, about = "Compute package dependency lists and install order", long_about = None)]
struct Cli {
    /// Write the depslist to FILE and the ordered depslist to FILE.ordered
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write an HTML dependency report
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Write the packages nothing depends on
    #[arg(long, value_name = "FILE")]
    leaves: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scheduling policy: batch-sequential or global-priority
    #[arg(long, value_parser = parse_policy)]
    policy: Option<SchedulePolicy>,

    /// Abort after this many unresolved requirements (0 disables)
    #[arg(long, value_name = "N")]
    max_unresolved: Option<usize>,

    /// More logging (repeat for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// RPM files, directories of RPM files or TOML catalogs; each one is a batch
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,
}

fn parse_policy(s: &str) -> std::result::Result<SchedulePolicy, String> {
    SchedulePolicy::parse(s).ok_or_else(|| format!("unknown policy '{}'", s))
}

/// Output sinks, opened before any processing
struct Sinks {
    unordered: Box<dyn Write>,
    ordered: Option<BufWriter<File>>,
    html: Option<BufWriter<File>>,
    leaves: Option<BufWriter<File>>,
}

impl Sinks {
    fn open(cli: &Cli) -> Result<Self> {
        let (unordered, ordered) = match &cli.output {
            Some(path) => (
                Box::new(create_output(path)?) as Box<dyn Write>,
                Some(create_output(&ordered_path(path))?),
            ),
            None => (
                Box::new(BufWriter::new(io::stdout().lock())) as Box<dyn Write>,
                None,
            ),
        };

        Ok(Self {
            unordered,
            ordered,
            html: cli.html.as_deref().map(create_output).transpose()?,
            leaves: cli.leaves.as_deref().map(create_output).transpose()?,
        })
    }
}

fn ordered_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".ordered");
    PathBuf::from(name)
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<DepslistConfig> {
    let mut config = match &cli.config {
        Some(path) => DepslistConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DepslistConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(limit) = cli.max_unresolved {
        config.max_unresolved = limit;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;
    let mut sinks = Sinks::open(&cli)?;

    let mut ctx = ResolutionContext::new(config);
    for input in &cli.inputs {
        let records = read_batch(input)
            .with_context(|| format!("Failed to read packages from {}", input.display()))?;
        ctx.add_batch(&records);
    }
    info!(
        "Loaded {} packages in {} batches (policy {})",
        ctx.packages().len(),
        ctx.batch_count(),
        ctx.config().policy
    );

    let resolution = ctx.run()?;

    encode::write_unordered(&mut sinks.unordered, &ctx, &resolution)?;
    sinks.unordered.flush()?;

    if let Some(out) = sinks.ordered.as_mut() {
        encode::write_ordered(out, &ctx, &resolution)?;
        out.flush()?;
    }
    if let Some(out) = sinks.html.as_mut() {
        encode::write_html(out, &ctx, &resolution)?;
        out.flush()?;
    }
    if let Some(out) = sinks.leaves.as_mut() {
        encode::write_leaves(out, &resolution)?;
        out.flush()?;
    }

    let exceptions = resolution.order.exceptions().len();
    if exceptions > 0 {
        info!("{} ordering exceptions", exceptions);
    }
    Ok(())
}
