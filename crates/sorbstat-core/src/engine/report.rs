use super::averages::{GlobalAverages, Observable};
use super::derived::DerivedProperties;
use super::nodestats::RootNodeStatsReport;
use super::sorbates::SorbateGlobal;
use crate::core::stats::moments::Estimate;

/// Reporter-ready view of the root state after a fold.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub step: u64,
    /// Snapshots folded since the last clear.
    pub samples: u64,
    pub energy: Estimate,
    pub energy_sq: Estimate,
    pub coulombic_energy: Estimate,
    pub rd_energy: Estimate,
    pub polarization_energy: Estimate,
    pub vdw_energy: Estimate,
    pub three_body_energy: Estimate,
    pub kinetic_energy: Estimate,
    pub temperature: Estimate,
    pub volume: Estimate,
    pub n: Estimate,
    pub spin_ratio: Estimate,
    pub dipole_rrms: Estimate,
    pub density: Estimate,
    pub derived: DerivedProperties,
    pub sorbates: Vec<SorbateGlobal>,
    pub node_stats: RootNodeStatsReport,
}

impl Report {
    pub fn new(
        step: u64,
        averages: &GlobalAverages,
        sorbates: Vec<SorbateGlobal>,
        node_stats: RootNodeStatsReport,
    ) -> Self {
        Self {
            step,
            samples: averages.count(),
            energy: averages.estimate(Observable::Energy),
            energy_sq: averages.energy_sq(),
            coulombic_energy: averages.estimate(Observable::CoulombicEnergy),
            rd_energy: averages.estimate(Observable::RepulsionDispersionEnergy),
            polarization_energy: averages.estimate(Observable::PolarizationEnergy),
            vdw_energy: averages.estimate(Observable::VdwEnergy),
            three_body_energy: averages.estimate(Observable::ThreeBodyEnergy),
            kinetic_energy: averages.estimate(Observable::KineticEnergy),
            temperature: averages.estimate(Observable::Temperature),
            volume: averages.estimate(Observable::Volume),
            n: averages.estimate(Observable::N),
            spin_ratio: averages.estimate(Observable::SpinRatio),
            dipole_rrms: averages.estimate(Observable::DipoleRrms),
            density: averages.estimate(Observable::Density),
            derived: *averages.derived(),
            sorbates,
            node_stats,
        }
    }
}
