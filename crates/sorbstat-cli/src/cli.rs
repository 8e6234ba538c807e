use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "sorbstat CLI - Running averages, fluctuation properties and sorption statistics for Monte Carlo sorption simulations.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for the lockstep worker phase.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded snapshot stream through the aggregation engine and print the averages.
    Replay(ReplayArgs),
    /// Print the averages stored in a root checkpoint.
    Report(ReportArgs),
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    // --- Core Arguments ---
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to the CSV snapshot stream to replay.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    // --- Checkpointing ---
    /// Resume from a previously written root checkpoint.
    #[arg(long, value_name = "PATH")]
    pub checkpoint_in: Option<PathBuf>,

    /// Write the final root state to this checkpoint file.
    #[arg(long, value_name = "PATH")]
    pub checkpoint_out: Option<PathBuf>,

    // --- Overrides ---
    /// Override the number of leading equilibration steps discarded from the averages.
    #[arg(short, long = "equilibration", value_name = "INT")]
    pub equilibration_steps: Option<u64>,

    /// Override the thermostat temperature (K) from the config file.
    #[arg(short = 'T', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the number of workers in the collective.
    #[arg(short, long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Number of decimals printed for each value.
    #[arg(long, value_name = "INT")]
    pub precision: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.pressure=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `report` subcommand.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to the root checkpoint to report.
    #[arg(long, required = true, value_name = "PATH")]
    pub checkpoint: PathBuf,

    /// Number of decimals printed for each value.
    #[arg(long, value_name = "INT")]
    pub precision: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
