use crate::cli::ReplayArgs;
use crate::config::{Overrides, build_config};
use crate::error::Result;
use crate::output;
use crate::utils::progress::CliProgressHandler;
use sorbstat::{
    core::io::snapshots::SnapshotCsv,
    engine::{checkpoint::Checkpoint, progress::ProgressReporter},
    workflows::replay::{self, ReplayOptions},
};
use tracing::info;

pub fn run(args: ReplayArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args.config, &Overrides::from(&args))?;

    info!("Loading snapshot stream from {:?}", &args.input);
    let records = SnapshotCsv::read_from_path(&args.input, &config.params.species)?;

    let resume_from = match &args.checkpoint_in {
        Some(path) => {
            info!("Loading root checkpoint from {:?}", path);
            Some(Checkpoint::load(path)?)
        }
        None => None,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Replaying {} snapshot(s) across {} worker(s)...",
        records.len(),
        config.params.workers
    );
    let options = ReplayOptions {
        equilibration_steps: config.equilibration_steps,
        resume_from,
    };
    let outcome = replay::run(records, &config.params, options, &reporter)?;

    info!(
        "Workflow finished after folding {} step(s).",
        outcome.steps_folded
    );

    if let Some(path) = &config.checkpoint_out {
        outcome.root.checkpoint().store(path)?;
        println!("✓ Root checkpoint written to: {}", path.display());
    }

    for line in output::format_report(&outcome.report, &config.params, config.precision) {
        println!("{}", line);
    }

    Ok(())
}
