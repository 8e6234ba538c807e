use serde::{Deserialize, Serialize};

/// A sorbate species declared at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SorbateSpecies {
    pub id: String,
    /// Molecular mass in g/mol.
    pub mass: f64,
}

impl SorbateSpecies {
    pub fn new(id: &str, mass: f64) -> Self {
        Self {
            id: id.to_string(),
            mass,
        }
    }
}

/// Current (single-step) values for one species.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SorbateInfo {
    pub current_n: f64,
    pub percent_wt: f64,
    pub percent_wt_me: f64,
    pub excess_ratio: f64,
    pub density: f64,
    pub pore_density: f64,
}
