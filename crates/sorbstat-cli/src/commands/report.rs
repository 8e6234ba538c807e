use crate::cli::ReportArgs;
use crate::config::{Overrides, build_config};
use crate::error::Result;
use crate::output;
use sorbstat::engine::{checkpoint::Checkpoint, protocol::RootAggregator};
use tracing::info;

pub fn run(args: ReportArgs) -> Result<()> {
    let config = build_config(&args.config, &Overrides::from(&args))?;

    info!("Loading root checkpoint from {:?}", &args.checkpoint);
    let checkpoint = Checkpoint::load(&args.checkpoint)?;
    let root = RootAggregator::restore(config.params.clone(), checkpoint)?;

    match root.last_step() {
        Some(step) => println!(
            "Averages at step {} ({} sample(s)):",
            step,
            root.averages().count()
        ),
        None => println!("Checkpoint holds no folded steps."),
    }

    for line in output::format_report(&root.report(), &config.params, config.precision) {
        println!("{}", line);
    }

    Ok(())
}
