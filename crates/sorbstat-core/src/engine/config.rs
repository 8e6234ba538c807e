use crate::core::models::ensemble::Ensemble;
use crate::core::models::sorbate::SorbateSpecies;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameters in '{path}': {source}")]
    Invalid { path: String, source: ConfigError },
}

/// Where the bulk-phase pressure used by the excess-sorption formulas comes from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum FugacitySource {
    /// The configured bulk pressure, in atm.
    #[default]
    Pressure,
    /// A single fugacity from an equation of state, shared by every species.
    EquationOfState(f64),
    /// A user-supplied fugacity table, one entry per species.
    PerSpecies(Vec<f64>),
}

impl FugacitySource {
    /// The value the whole-system excess ratio uses: the first fugacity when
    /// any fugacity is known, otherwise the bulk pressure.
    pub fn bulk(&self, pressure: f64) -> f64 {
        match self {
            FugacitySource::Pressure => pressure,
            FugacitySource::EquationOfState(f) => *f,
            FugacitySource::PerSpecies(table) => table.first().copied().unwrap_or(pressure),
        }
    }

    pub fn for_species(&self, index: usize, pressure: f64) -> f64 {
        match self {
            FugacitySource::Pressure => pressure,
            FugacitySource::EquationOfState(f) => *f,
            FugacitySource::PerSpecies(table) => table.get(index).copied().unwrap_or(pressure),
        }
    }
}

/// Static parameters of a run, fixed at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Thermostat temperature in K.
    pub temperature: f64,
    pub ensemble: Ensemble,
    /// Bulk pressure in atm.
    pub pressure: f64,
    /// Accessible (free) volume in A^3; non-positive when unknown.
    pub free_volume: f64,
    pub fugacity: FugacitySource,
    pub species: Vec<SorbateSpecies>,
    /// Mass of the representative mobile particle used by the single-sorbate
    /// density formulas, in g/mol.
    pub particle_mass: f64,
    /// Correlation time in steps, used for the node-statistics errors.
    pub corrtime: u64,
    /// Number of workers in the collective.
    pub workers: usize,
}

impl SimulationParameters {
    pub fn builder() -> SimulationParametersBuilder {
        SimulationParametersBuilder::new()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ParameterFile = toml::from_str(content)?;
        // Validation errors are surfaced through `from_file`; here they are
        // mapped onto a TOML error so callers deal with a single error type.
        file.into_builder()
            .and_then(SimulationParametersBuilder::build)
            .map_err(|e| <toml::de::Error as serde::de::Error>::custom(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ParamLoadError> {
        let file = ParameterFile::load(path)?;
        file.into_builder()
            .and_then(SimulationParametersBuilder::build)
            .map_err(|e| ParamLoadError::Invalid {
                path: path.to_string_lossy().to_string(),
                source: e,
            })
    }
}

#[derive(Default)]
pub struct SimulationParametersBuilder {
    temperature: Option<f64>,
    ensemble: Option<Ensemble>,
    pressure: Option<f64>,
    free_volume: Option<f64>,
    fugacity: Option<FugacitySource>,
    species: Vec<SorbateSpecies>,
    particle_mass: Option<f64>,
    corrtime: Option<u64>,
    workers: Option<usize>,
}

impl SimulationParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn ensemble(mut self, ensemble: Ensemble) -> Self {
        self.ensemble = Some(ensemble);
        self
    }
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }
    pub fn free_volume(mut self, free_volume: f64) -> Self {
        self.free_volume = Some(free_volume);
        self
    }
    pub fn fugacity(mut self, fugacity: FugacitySource) -> Self {
        self.fugacity = Some(fugacity);
        self
    }
    pub fn species(mut self, species: SorbateSpecies) -> Self {
        self.species.push(species);
        self
    }
    pub fn particle_mass(mut self, mass: f64) -> Self {
        self.particle_mass = Some(mass);
        self
    }
    pub fn corrtime(mut self, corrtime: u64) -> Self {
        self.corrtime = Some(corrtime);
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn build(self) -> Result<SimulationParameters, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !(temperature > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be positive, got {}", temperature),
            });
        }

        let workers = self.workers.unwrap_or(1);
        if workers == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "workers",
                reason: "the collective needs at least one worker".to_string(),
            });
        }

        let corrtime = self.corrtime.unwrap_or(1);
        if corrtime == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "corrtime",
                reason: "must be at least one step".to_string(),
            });
        }

        let fugacity = self.fugacity.unwrap_or_default();
        if let FugacitySource::PerSpecies(table) = &fugacity {
            if !self.species.is_empty() && table.len() != self.species.len() {
                return Err(ConfigError::InvalidParameter {
                    name: "fugacities",
                    reason: format!(
                        "{} values given for {} sorbate species",
                        table.len(),
                        self.species.len()
                    ),
                });
            }
        }

        // Single-sorbate formulas use the last declared mobile species.
        let particle_mass = self
            .particle_mass
            .or_else(|| self.species.last().map(|s| s.mass))
            .unwrap_or(0.0);

        Ok(SimulationParameters {
            temperature,
            ensemble: self
                .ensemble
                .ok_or(ConfigError::MissingParameter("ensemble"))?,
            pressure: self.pressure.unwrap_or(0.0),
            free_volume: self.free_volume.unwrap_or(0.0),
            fugacity,
            species: self.species,
            particle_mass,
            corrtime,
            workers,
        })
    }
}

/// On-disk form of [`SimulationParameters`].
///
/// ```toml
/// temperature = 77.0
/// ensemble = "uvt"
/// pressure = 1.0
/// free_volume = 8500.0
/// workers = 4
/// fugacities = [0.98]
///
/// [[sorbates]]
/// id = "H2"
/// mass = 2.016
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterFile {
    pub temperature: Option<f64>,
    pub ensemble: Option<Ensemble>,
    pub pressure: Option<f64>,
    pub free_volume: Option<f64>,
    pub fugacities: Option<Vec<f64>>,
    pub eos_fugacity: Option<f64>,
    pub particle_mass: Option<f64>,
    pub corrtime: Option<u64>,
    pub workers: Option<usize>,
    #[serde(default)]
    pub sorbates: Vec<SorbateSpecies>,
}

impl ParameterFile {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Seeds a builder with every value present in the file.
    pub fn into_builder(self) -> Result<SimulationParametersBuilder, ConfigError> {
        let mut builder = SimulationParametersBuilder::new();
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(e) = self.ensemble {
            builder = builder.ensemble(e);
        }
        if let Some(p) = self.pressure {
            builder = builder.pressure(p);
        }
        if let Some(v) = self.free_volume {
            builder = builder.free_volume(v);
        }
        if let Some(m) = self.particle_mass {
            builder = builder.particle_mass(m);
        }
        if let Some(c) = self.corrtime {
            builder = builder.corrtime(c);
        }
        if let Some(w) = self.workers {
            builder = builder.workers(w);
        }
        match (self.fugacities, self.eos_fugacity) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidParameter {
                    name: "fugacities",
                    reason: "give either a fugacity table or an equation-of-state fugacity, not both"
                        .to_string(),
                });
            }
            (Some(table), None) => builder = builder.fugacity(FugacitySource::PerSpecies(table)),
            (None, Some(f)) => builder = builder.fugacity(FugacitySource::EquationOfState(f)),
            (None, None) => {}
        }
        for species in self.sorbates {
            builder = builder.species(species);
        }
        Ok(builder)
    }
}
