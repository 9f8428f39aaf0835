mod cmd_episodes;
mod cmd_latency;
mod cmd_report;
mod display;
mod input;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ringback",
    version,
    about = "Missed-call recovery analysis for call-centre exports"
)]
struct Cli {
    /// Engine config file (JSON). Built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging and a full list of rejected rows
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recovery rates, second-attempt rate and volume breakdowns
    Report {
        /// Call export: a JSON array of rows or JSON Lines
        file: PathBuf,
        #[command(flatten)]
        filter: input::FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List missed-call episodes and their outcomes
    Episodes {
        /// Call export: a JSON array of rows or JSON Lines
        file: PathBuf,
        #[command(flatten)]
        filter: input::FilterArgs,
        /// Which missed calls anchor an episode
        #[arg(long, value_enum, default_value = "first-miss")]
        mode: cmd_episodes::ModeArg,
        /// Only episodes of this caller
        #[arg(long)]
        caller: Option<String>,
        /// Output as JSON Lines
        #[arg(long)]
        json: bool,
    },
    /// Time between attempts and time to recovery
    Latency {
        /// Call export: a JSON array of rows or JSON Lines
        file: PathBuf,
        #[command(flatten)]
        filter: input::FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = input::load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Report { file, filter, json } => {
            let records = input::load_records(&file, &cfg, &filter.to_filter(), cli.verbose)?;
            cmd_report::execute(&records, &cfg, json)
        }
        Command::Episodes {
            file,
            filter,
            mode,
            caller,
            json,
        } => {
            let records = input::load_records(&file, &cfg, &filter.to_filter(), cli.verbose)?;
            cmd_episodes::execute(&records, &cfg, mode.into(), caller.as_deref(), json)
        }
        Command::Latency { file, filter, json } => {
            let records = input::load_records(&file, &cfg, &filter.to_filter(), cli.verbose)?;
            cmd_latency::execute(&records, &cfg, json)
        }
    }
}
