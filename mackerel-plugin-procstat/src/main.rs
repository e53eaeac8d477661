//! mackerel-plugin-procstat - kernel activity plugin for the mackerel agent.
//!
//! Reports CPU time, context switches, forks, interrupts, process counts
//! and load averages from the proc filesystem.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mackerel_plugin::MackerelPlugin;
use tracing_subscriber::EnvFilter;

mod procstat;

use procstat::ProcStat;

/// Kernel activity plugin for the mackerel agent.
#[derive(Parser, Debug)]
#[command(name = "mackerel-plugin-procstat", about, version)]
struct Args {
    /// Prefix for every graph key and metric name.
    #[arg(long, default_value = "procstat")]
    metric_key_prefix: String,

    /// State file path (defaults to one derived from the command line).
    #[arg(long)]
    tempfile: Option<PathBuf>,

    /// Path to the proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_root: PathBuf,
}

fn init_logging() {
    // stdout belongs to the agent protocol
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut builder = MackerelPlugin::builder(ProcStat::new(args.proc_root, args.metric_key_prefix));
    if let Some(path) = args.tempfile {
        builder = builder.tempfile(path);
    }

    builder.build().run()?;
    Ok(())
}
