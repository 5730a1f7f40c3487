use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use trace_simulator::runner::{self, RunConfig};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Trace-driven simulator for a two-tier DRAM + flash object cache.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trace files, replayed in sorted lexicographic order
    #[arg(short, long = "file", value_name = "PATHS", num_args = 1.., required = true)]
    file: Vec<PathBuf>,

    /// DRAM tier capacity in bytes
    #[arg(long)]
    dramsize: u64,

    /// Flash FIFO tier capacity in bytes
    #[arg(long)]
    fifosize: u64,

    /// Periodic statistics CSV
    #[arg(short, long, default_value = "./test.log")]
    output: PathBuf,

    /// Record stream of entries overwritten by FIFO rotation
    #[arg(long, default_value = "./overwritten.log")]
    overwritten_log: PathBuf,

    /// Record stream of accesses to overwritten entries
    #[arg(long, default_value = "./overwritten-acc.log")]
    overwritten_acc_log: PathBuf,
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        Self {
            files: args.file,
            dram_size: args.dramsize,
            fifo_size: args.fifosize,
            output: args.output,
            overwritten_log: args.overwritten_log,
            overwritten_acc_log: args.overwritten_acc_log,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::from(1),
            };
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match runner::run(&args.into()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(1)
        }
    }
}
