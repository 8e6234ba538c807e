use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::{ReplayArgs, ReportArgs};
use crate::error::{CliError, Result};
use sorbstat::core::models::ensemble::Ensemble;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub temperature: Option<f64>,
    pub workers: Option<usize>,
    pub equilibration_steps: Option<u64>,
    pub checkpoint_out: Option<PathBuf>,
    pub precision: Option<usize>,
    pub set_values: Vec<String>,
}

impl From<&ReplayArgs> for Overrides {
    fn from(args: &ReplayArgs) -> Self {
        Self {
            temperature: args.temperature,
            workers: args.workers,
            equilibration_steps: args.equilibration_steps,
            checkpoint_out: args.checkpoint_out.clone(),
            precision: args.precision,
            set_values: args.set_values.clone(),
        }
    }
}

impl From<&ReportArgs> for Overrides {
    fn from(args: &ReportArgs) -> Self {
        Self {
            precision: args.precision,
            set_values: args.set_values.clone(),
            ..Self::default()
        }
    }
}

/// Resolves the run configuration: command-line flags first, then `--set`
/// values and the file, then built-in defaults.
pub fn build_config(config_path: &Path, overrides: &Overrides) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_file(config_path)?;
    let file_config = apply_set_values(file_config, &overrides.set_values)?;

    let mut simulation = file_config.simulation;
    if let Some(temperature) = overrides.temperature {
        simulation.temperature = Some(temperature);
    }
    if let Some(workers) = overrides.workers {
        simulation.workers = Some(workers);
    }
    let params = simulation
        .into_builder()
        .and_then(|builder| builder.build())
        .map_err(|e| CliError::Config(e.to_string()))?;

    let replay = file_config.replay.unwrap_or_default();
    let output = file_config.output.unwrap_or_default();

    Ok(AppConfig {
        params,
        equilibration_steps: overrides
            .equilibration_steps
            .or(replay.equilibration_steps)
            .unwrap_or(defaults.equilibration_steps),
        checkpoint_out: overrides.checkpoint_out.clone().or(replay.checkpoint_out),
        precision: overrides
            .precision
            .or(output.precision)
            .unwrap_or(defaults.precision),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let sim = &mut config.simulation;

        match key {
            "simulation.temperature" => {
                sim.temperature = Some(parse_value(key, value_str, "float")?);
            }
            "simulation.pressure" => {
                sim.pressure = Some(parse_value(key, value_str, "float")?);
            }
            "simulation.free_volume" => {
                sim.free_volume = Some(parse_value(key, value_str, "float")?);
            }
            "simulation.particle_mass" => {
                sim.particle_mass = Some(parse_value(key, value_str, "float")?);
            }
            "simulation.eos_fugacity" => {
                sim.eos_fugacity = Some(parse_value(key, value_str, "float")?);
            }
            "simulation.corrtime" => {
                sim.corrtime = Some(parse_value(key, value_str, "integer")?);
            }
            "simulation.workers" => {
                sim.workers = Some(parse_value(key, value_str, "integer")?);
            }
            "simulation.ensemble" => {
                let ensemble = Ensemble::from_str(value_str)
                    .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))?;
                sim.ensemble = Some(ensemble);
            }
            "replay.equilibration_steps" => {
                config
                    .replay
                    .get_or_insert_with(Default::default)
                    .equilibration_steps = Some(parse_value(key, value_str, "integer")?);
            }
            "replay.checkpoint_out" => {
                config
                    .replay
                    .get_or_insert_with(Default::default)
                    .checkpoint_out = Some(PathBuf::from(value_str.trim()));
            }
            "output.precision" => {
                config
                    .output
                    .get_or_insert_with(Default::default)
                    .precision = Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
