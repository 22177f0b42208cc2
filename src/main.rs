use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use trackstation::app;
use trackstation::config::Config;
use trackstation::util::logging;

#[derive(Parser, Debug)]
#[command(name = "trackstation", about = "Live performance playback console")]
struct Args {
    /// Path to the configuration file.
    #[arg(default_value = "configuration.json")]
    config: PathBuf,

    /// Show debug logs.
    #[arg(short, long)]
    verbose: bool,

    /// Write a default configuration file to the given path and exit.
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = logging::init_logging(args.verbose) {
        eprintln!("can't initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.write_default_config {
        Config::default().save_to(&args.config)?;
        println!("default configuration written to {}", args.config.display());
        return Ok(());
    }

    let config = Config::load_from(&args.config)?;
    app::run(config)
}
