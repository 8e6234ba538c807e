use crate::core::models::nodestats::{MoveCounter, MoveKind, NodeStats};
use crate::core::models::snapshot::ObservableSnapshot;
use crate::core::models::sorbate::SorbateSpecies;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// One row of a recorded snapshot stream: what one worker reported at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    pub step: u64,
    pub worker: usize,
    pub snapshot: ObservableSnapshot,
    pub node_stats: NodeStats,
}

#[derive(Debug, Error)]
pub enum SnapshotReadError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Invalid value '{value}' in column '{column}' on line {line}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
}

const REQUIRED_COLUMNS: [&str; 4] = ["step", "worker", "energy", "n"];
const SPECIES_COLUMN_PREFIX: &str = "n:";

/// Reader for CSV snapshot streams.
///
/// The first row is a header. `step`, `worker`, `energy` and `n` are required;
/// every other recognised column (`coulombic`, `rd`, `polar`, `vdw`,
/// `three_body`, `kinetic`, `temperature`, `volume`, `spin_ratio`,
/// `dipole_rrms`, `frozen_mass`, `total_mass`, `nu`, the three node
/// diagnostics, `accept_<kind>` / `reject_<kind>`) defaults to zero when
/// absent, except `nu`, which defaults to `energy * n`. Each declared species
/// needs an `n:<id>` population column.
pub struct SnapshotCsv;

impl SnapshotCsv {
    pub fn read_from(
        reader: impl Read,
        species: &[SorbateSpecies],
    ) -> Result<Vec<SnapshotRecord>, SnapshotReadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns = ColumnMap::new(&headers, species)?;

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            records.push(columns.parse_row(&row, line)?);
        }
        Ok(records)
    }

    pub fn read_from_path(
        path: &Path,
        species: &[SorbateSpecies],
    ) -> Result<Vec<SnapshotRecord>, SnapshotReadError> {
        let file = File::open(path).map_err(|e| SnapshotReadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::read_from(io::BufReader::new(file), species)
    }
}

struct ColumnMap {
    index: HashMap<String, usize>,
    species: Vec<(String, usize)>,
}

impl ColumnMap {
    fn new(
        headers: &csv::StringRecord,
        species: &[SorbateSpecies],
    ) -> Result<Self, SnapshotReadError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        for required in REQUIRED_COLUMNS {
            if !index.contains_key(required) {
                return Err(SnapshotReadError::MissingColumn(required.to_string()));
            }
        }

        let species = species
            .iter()
            .map(|s| {
                let column = format!("{}{}", SPECIES_COLUMN_PREFIX, s.id.to_lowercase());
                index
                    .get(&column)
                    .map(|&i| (column.clone(), i))
                    .ok_or(SnapshotReadError::MissingColumn(column))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { index, species })
    }

    fn parse_row(
        &self,
        row: &csv::StringRecord,
        line: u64,
    ) -> Result<SnapshotRecord, SnapshotReadError> {
        let float = |name: &str| self.float(row, name, line);
        let counter = |name: &str| self.count(row, name, line);

        let energy = float("energy")?;
        let n = float("n")?;
        let nu = if self.index.contains_key("nu") {
            float("nu")?
        } else {
            energy * n
        };

        let sorbate_counts = self
            .species
            .iter()
            .map(|(column, i)| parse_cell::<f64>(row.get(*i), column, line))
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot = ObservableSnapshot {
            energy,
            coulombic_energy: float("coulombic")?,
            rd_energy: float("rd")?,
            polarization_energy: float("polar")?,
            vdw_energy: float("vdw")?,
            three_body_energy: float("three_body")?,
            kinetic_energy: float("kinetic")?,
            temperature: float("temperature")?,
            n,
            volume: float("volume")?,
            spin_ratio: float("spin_ratio")?,
            dipole_rrms: float("dipole_rrms")?,
            frozen_mass: float("frozen_mass")?,
            total_mass: float("total_mass")?,
            nu,
            sorbate_counts,
        };

        let mut node_stats = NodeStats {
            boltzmann_factor: float("boltzmann_factor")?,
            cavity_bias_probability: float("cavity_bias_probability")?,
            polarization_iterations: float("polarization_iterations")?,
            ..NodeStats::default()
        };
        for kind in MoveKind::ALL {
            let counts = MoveCounter::new(
                counter(&format!("accept_{}", kind.name()))?,
                counter(&format!("reject_{}", kind.name()))?,
            );
            *node_stats.moves.get_mut(kind) = counts;
            node_stats.total.accept += counts.accept;
            node_stats.total.reject += counts.reject;
        }

        Ok(SnapshotRecord {
            step: self.count(row, "step", line)?,
            worker: self.count(row, "worker", line)? as usize,
            snapshot,
            node_stats,
        })
    }

    fn float(&self, row: &csv::StringRecord, name: &str, line: u64) -> Result<f64, SnapshotReadError> {
        match self.index.get(name) {
            Some(&i) => parse_cell(row.get(i), name, line),
            None => Ok(0.0),
        }
    }

    fn count(&self, row: &csv::StringRecord, name: &str, line: u64) -> Result<u64, SnapshotReadError> {
        match self.index.get(name) {
            Some(&i) => parse_cell(row.get(i), name, line),
            None => Ok(0),
        }
    }
}

fn parse_cell<T>(cell: Option<&str>, column: &str, line: u64) -> Result<T, SnapshotReadError>
where
    T: std::str::FromStr + Default,
{
    match cell {
        None | Some("") => Ok(T::default()),
        Some(value) => value.parse().map_err(|_| SnapshotReadError::InvalidValue {
            line,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}
