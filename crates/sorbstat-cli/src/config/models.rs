use sorbstat::engine::config::SimulationParameters;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub params: SimulationParameters,
    pub equilibration_steps: u64,
    pub checkpoint_out: Option<PathBuf>,
    /// Decimals printed per value in the averages block.
    pub precision: usize,
}
