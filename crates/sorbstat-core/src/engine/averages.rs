use super::config::SimulationParameters;
use super::derived::{DerivedProperties, DerivedPropertyCalculator};
use crate::core::constants::{A3_TO_CM3, AVOGADRO};
use crate::core::models::snapshot::ObservableSnapshot;
use crate::core::stats::moments::{Estimate, MomentAccumulator};
use serde::{Deserialize, Serialize};

/// Observables averaged by [`GlobalAverages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observable {
    Energy,
    CoulombicEnergy,
    RepulsionDispersionEnergy,
    PolarizationEnergy,
    VdwEnergy,
    ThreeBodyEnergy,
    KineticEnergy,
    Temperature,
    Volume,
    N,
    SpinRatio,
    DipoleRrms,
    Density,
}

impl Observable {
    pub const ALL: [Observable; 13] = [
        Observable::Energy,
        Observable::CoulombicEnergy,
        Observable::RepulsionDispersionEnergy,
        Observable::PolarizationEnergy,
        Observable::VdwEnergy,
        Observable::ThreeBodyEnergy,
        Observable::KineticEnergy,
        Observable::Temperature,
        Observable::Volume,
        Observable::N,
        Observable::SpinRatio,
        Observable::DipoleRrms,
        Observable::Density,
    ];
}

/// Root-owned running averages of every physical observable.
///
/// The energy accumulator also tracks the fourth moment so the error of
/// `<E^2>` is available. The derived properties are a cache over the
/// accumulators; they are not serialized and must be refreshed after a
/// restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAverages {
    energy: MomentAccumulator,
    coulombic_energy: MomentAccumulator,
    rd_energy: MomentAccumulator,
    polarization_energy: MomentAccumulator,
    vdw_energy: MomentAccumulator,
    three_body_energy: MomentAccumulator,
    kinetic_energy: MomentAccumulator,
    temperature: MomentAccumulator,
    volume: MomentAccumulator,
    n: MomentAccumulator,
    spin_ratio: MomentAccumulator,
    dipole_rrms: MomentAccumulator,
    density: MomentAccumulator,
    nu: MomentAccumulator,
    cell_volume: f64,
    current_density: f64,
    frozen_mass: f64,
    #[serde(skip)]
    derived: DerivedProperties,
}

impl Default for GlobalAverages {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalAverages {
    pub fn new() -> Self {
        Self {
            energy: MomentAccumulator::with_fourth_moment(),
            coulombic_energy: MomentAccumulator::new(),
            rd_energy: MomentAccumulator::new(),
            polarization_energy: MomentAccumulator::new(),
            vdw_energy: MomentAccumulator::new(),
            three_body_energy: MomentAccumulator::new(),
            kinetic_energy: MomentAccumulator::new(),
            temperature: MomentAccumulator::new(),
            volume: MomentAccumulator::new(),
            n: MomentAccumulator::new(),
            spin_ratio: MomentAccumulator::new(),
            dipole_rrms: MomentAccumulator::new(),
            density: MomentAccumulator::new(),
            nu: MomentAccumulator::new(),
            cell_volume: 0.0,
            current_density: 0.0,
            frozen_mass: 0.0,
            derived: DerivedProperties::default(),
        }
    }

    /// Folds one snapshot into every accumulator and recomputes the derived
    /// properties.
    pub fn ingest(
        &mut self,
        snapshot: &ObservableSnapshot,
        params: &SimulationParameters,
        calculator: &DerivedPropertyCalculator,
    ) {
        self.energy.update(snapshot.energy);
        self.coulombic_energy.update(snapshot.coulombic_energy);
        self.rd_energy.update(snapshot.rd_energy);
        self.polarization_energy.update(snapshot.polarization_energy);
        self.vdw_energy.update(snapshot.vdw_energy);
        self.three_body_energy.update(snapshot.three_body_energy);
        self.kinetic_energy.update(snapshot.kinetic_energy);
        self.temperature.update(snapshot.temperature);
        self.volume.update(snapshot.volume);
        self.n.update(snapshot.n);
        self.spin_ratio.update(snapshot.spin_ratio);
        self.dipole_rrms.update(snapshot.dipole_rrms);
        self.nu.update(snapshot.nu);

        self.cell_volume = snapshot.volume;
        self.frozen_mass = snapshot.frozen_mass;
        self.current_density = instantaneous_density(snapshot.n, params.particle_mass, snapshot.volume);
        self.density.update(self.current_density);

        self.refresh_derived(params, calculator);
    }

    pub fn refresh_derived(
        &mut self,
        params: &SimulationParameters,
        calculator: &DerivedPropertyCalculator,
    ) {
        self.derived = calculator.compute(self, params);
    }

    /// Forgets every sample, as at an equilibration boundary.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn accumulator(&self, observable: Observable) -> &MomentAccumulator {
        match observable {
            Observable::Energy => &self.energy,
            Observable::CoulombicEnergy => &self.coulombic_energy,
            Observable::RepulsionDispersionEnergy => &self.rd_energy,
            Observable::PolarizationEnergy => &self.polarization_energy,
            Observable::VdwEnergy => &self.vdw_energy,
            Observable::ThreeBodyEnergy => &self.three_body_energy,
            Observable::KineticEnergy => &self.kinetic_energy,
            Observable::Temperature => &self.temperature,
            Observable::Volume => &self.volume,
            Observable::N => &self.n,
            Observable::SpinRatio => &self.spin_ratio,
            Observable::DipoleRrms => &self.dipole_rrms,
            Observable::Density => &self.density,
        }
    }

    #[inline]
    pub fn estimate(&self, observable: Observable) -> Estimate {
        self.accumulator(observable).estimate()
    }

    /// Mean and error of `<E^2>`.
    pub fn energy_sq(&self) -> Estimate {
        Estimate::new(
            self.energy.mean_sq(),
            self.energy.square_error().unwrap_or(0.0),
        )
    }

    /// Running mean of the `E * N` correlation term.
    #[inline]
    pub fn nu(&self) -> f64 {
        self.nu.mean()
    }

    /// Number of snapshots folded since the last clear.
    #[inline]
    pub fn count(&self) -> u64 {
        self.energy.count()
    }

    #[inline]
    pub fn cell_volume(&self) -> f64 {
        self.cell_volume
    }

    /// Density of the most recent snapshot, in g/cm^3.
    #[inline]
    pub fn current_density(&self) -> f64 {
        self.current_density
    }

    #[inline]
    pub fn frozen_mass(&self) -> f64 {
        self.frozen_mass
    }

    #[inline]
    pub fn derived(&self) -> &DerivedProperties {
        &self.derived
    }
}

/// `N * m / (V * NA * 1e-24)` in g/cm^3; zero for a non-positive volume.
fn instantaneous_density(n: f64, particle_mass: f64, volume: f64) -> f64 {
    if volume > 0.0 {
        n * particle_mass / (volume * AVOGADRO * A3_TO_CM3)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ensemble::Ensemble;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    fn params() -> SimulationParameters {
        SimulationParameters::builder()
            .temperature(300.0)
            .ensemble(Ensemble::Uvt)
            .particle_mass(2.016)
            .build()
            .unwrap()
    }

    #[test]
    fn new_averages_are_empty_and_energy_tracks_fourth_moment() {
        let averages = GlobalAverages::new();
        assert_eq!(averages.count(), 0);
        assert!(averages.accumulator(Observable::Energy).mean_fourth().is_some());
        assert!(averages.accumulator(Observable::N).mean_fourth().is_none());
        assert_eq!(averages.derived(), &DerivedProperties::default());
    }

    #[test]
    fn ingest_updates_every_observable() {
        let params = params();
        let calculator = DerivedPropertyCalculator::default();
        let mut averages = GlobalAverages::new();

        let mut snapshot = ObservableSnapshot::new(-100.0, 4.0, 1000.0).with_temperature(301.0);
        snapshot.coulombic_energy = -10.0;
        snapshot.rd_energy = -80.0;
        snapshot.polarization_energy = -5.0;
        snapshot.vdw_energy = -3.0;
        snapshot.three_body_energy = -2.0;
        snapshot.kinetic_energy = 12.0;
        snapshot.spin_ratio = 0.25;
        snapshot.dipole_rrms = 1e-4;
        averages.ingest(&snapshot, &params, &calculator);

        assert_eq!(averages.count(), 1);
        assert_eq!(averages.estimate(Observable::Energy).value, -100.0);
        assert_eq!(averages.estimate(Observable::CoulombicEnergy).value, -10.0);
        assert_eq!(averages.estimate(Observable::RepulsionDispersionEnergy).value, -80.0);
        assert_eq!(averages.estimate(Observable::PolarizationEnergy).value, -5.0);
        assert_eq!(averages.estimate(Observable::VdwEnergy).value, -3.0);
        assert_eq!(averages.estimate(Observable::ThreeBodyEnergy).value, -2.0);
        assert_eq!(averages.estimate(Observable::KineticEnergy).value, 12.0);
        assert_eq!(averages.estimate(Observable::Temperature).value, 301.0);
        assert_eq!(averages.estimate(Observable::Volume).value, 1000.0);
        assert_eq!(averages.estimate(Observable::N).value, 4.0);
        assert_eq!(averages.estimate(Observable::SpinRatio).value, 0.25);
        assert_eq!(averages.estimate(Observable::DipoleRrms).value, 1e-4);
        assert_eq!(averages.nu(), -400.0);
        assert_eq!(averages.energy_sq().value, 10000.0);
        assert_eq!(averages.cell_volume(), 1000.0);
    }

    #[test]
    fn density_uses_representative_particle_mass() {
        let params = params();
        let calculator = DerivedPropertyCalculator::default();
        let mut averages = GlobalAverages::new();
        averages.ingest(&ObservableSnapshot::new(0.0, 10.0, 1000.0), &params, &calculator);

        let expected = 10.0 * 2.016 / (1000.0 * AVOGADRO * A3_TO_CM3);
        assert!(f64_approx_equal(averages.current_density(), expected));
        assert!(f64_approx_equal(averages.estimate(Observable::Density).value, expected));
    }

    #[test]
    fn zero_volume_snapshot_has_zero_density() {
        assert_eq!(instantaneous_density(5.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn ingest_refreshes_cached_derived_properties() {
        let params = params();
        let calculator = DerivedPropertyCalculator::default();
        let mut averages = GlobalAverages::new();
        for e in [-10.0, -12.0, -11.0] {
            averages.ingest(&ObservableSnapshot::new(e, 1.0, 100.0), &params, &calculator);
        }
        let recomputed = calculator.compute(&averages, &params);
        assert_eq!(averages.derived().heat_capacity, recomputed.heat_capacity);
        assert!(averages.derived().heat_capacity.value > 0.0);
    }

    #[test]
    fn clear_forgets_samples() {
        let params = params();
        let calculator = DerivedPropertyCalculator::default();
        let mut averages = GlobalAverages::new();
        averages.ingest(&ObservableSnapshot::new(-1.0, 1.0, 1.0), &params, &calculator);
        averages.clear();
        assert_eq!(averages, GlobalAverages::new());
    }
}
