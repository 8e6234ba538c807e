use serde::{Deserialize, Serialize};

/// One worker's measurement of the physical observables at one step.
///
/// Energies are in Kelvin, volume in A^3 and masses in g/mol. Snapshots are
/// produced by the move engine and handed to the aggregation layer by
/// reference; nothing in this crate mutates one after it is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservableSnapshot {
    pub energy: f64,
    pub coulombic_energy: f64,
    pub rd_energy: f64,
    pub polarization_energy: f64,
    pub vdw_energy: f64,
    pub three_body_energy: f64,
    pub kinetic_energy: f64,
    pub temperature: f64,
    pub n: f64,
    pub volume: f64,
    pub spin_ratio: f64,
    pub dipole_rrms: f64,
    pub frozen_mass: f64,
    pub total_mass: f64,
    /// Instantaneous energy * N, the correlation term behind the isosteric heat.
    pub nu: f64,
    /// Population of each declared sorbate species, in declaration order.
    pub sorbate_counts: Vec<f64>,
}

impl ObservableSnapshot {
    pub fn new(energy: f64, n: f64, volume: f64) -> Self {
        Self {
            energy,
            n,
            volume,
            nu: energy * n,
            ..Self::default()
        }
    }

    pub fn with_sorbate_counts(mut self, counts: Vec<f64>) -> Self {
        self.sorbate_counts = counts;
        self
    }

    pub fn with_masses(mut self, frozen_mass: f64, total_mass: f64) -> Self {
        self.frozen_mass = frozen_mass;
        self.total_mass = total_mass;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[inline]
    pub fn species_count(&self) -> usize {
        self.sorbate_counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_core_fields_and_correlation_term() {
        let snapshot = ObservableSnapshot::new(-120.0, 4.0, 1000.0);
        assert_eq!(snapshot.energy, -120.0);
        assert_eq!(snapshot.n, 4.0);
        assert_eq!(snapshot.volume, 1000.0);
        assert_eq!(snapshot.nu, -480.0);
        assert_eq!(snapshot.coulombic_energy, 0.0);
        assert!(snapshot.sorbate_counts.is_empty());
    }

    #[test]
    fn builder_methods_fill_optional_fields() {
        let snapshot = ObservableSnapshot::new(0.0, 3.0, 10.0)
            .with_sorbate_counts(vec![1.0, 2.0])
            .with_masses(500.0, 560.0)
            .with_temperature(77.0);
        assert_eq!(snapshot.species_count(), 2);
        assert_eq!(snapshot.frozen_mass, 500.0);
        assert_eq!(snapshot.total_mass, 560.0);
        assert_eq!(snapshot.temperature, 77.0);
    }
}
