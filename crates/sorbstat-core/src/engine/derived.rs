use super::averages::{GlobalAverages, Observable};
use super::config::SimulationParameters;
use crate::core::constants::{
    A3_TO_CM3, ATM_TO_PASCALS, ATM_TO_REDUCED, AVOGADRO, KB, KELVIN_TO_KJ_PER_MOL,
    METER_TO_ANGSTROM,
};
use crate::core::models::ensemble::Ensemble;
use crate::core::stats::bias::{GammaRatioFn, stirling_gamma_ratio};
use crate::core::stats::moments::{Estimate, sdom};

const PASCALS_TO_GIGAPASCALS: f64 = 1.0e-9;

/// Secondary thermodynamic quantities derived from the running averages.
///
/// Fields that need a frozen phase (and, for the excess ratio and pore
/// density, a known free volume) are `None` when those inputs are absent.
/// Physically undefined values are NaN rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedProperties {
    /// kJ/(mol K)
    pub heat_capacity: Estimate,
    /// 1/atm
    pub compressibility: Estimate,
    /// GPa
    pub bulk_modulus: Estimate,
    /// Isosteric heat of adsorption, kJ/mol.
    pub qst: Option<f64>,
    pub percent_wt: Option<Estimate>,
    pub percent_wt_me: Option<Estimate>,
    /// mg/g
    pub excess_ratio: Option<Estimate>,
    /// g/cm^3
    pub pore_density: Option<Estimate>,
}

#[derive(Debug, Clone, Copy)]
pub struct DerivedPropertyCalculator {
    pub gamma_ratio: GammaRatioFn,
}

impl Default for DerivedPropertyCalculator {
    fn default() -> Self {
        Self {
            gamma_ratio: stirling_gamma_ratio,
        }
    }
}

impl DerivedPropertyCalculator {
    pub fn new(gamma_ratio: GammaRatioFn) -> Self {
        Self { gamma_ratio }
    }

    pub fn compute(
        &self,
        averages: &GlobalAverages,
        params: &SimulationParameters,
    ) -> DerivedProperties {
        let count = averages.count();
        let sdom = sdom(count);
        let g = (self.gamma_ratio)(count as f64);
        let temperature = params.temperature;

        let energy = averages.accumulator(Observable::Energy);
        let heat_capacity = KELVIN_TO_KJ_PER_MOL * energy.variance() / (temperature * temperature);
        let heat_capacity = Estimate::new(heat_capacity, sdom * 2.0 * g * heat_capacity);

        let compressibility = self.compressibility(averages, params);
        let compressibility = Estimate::new(compressibility, sdom * 2.0 * g * compressibility);
        let bulk_modulus = bulk_modulus(compressibility);

        let mut derived = DerivedProperties {
            heat_capacity,
            compressibility,
            bulk_modulus,
            ..DerivedProperties::default()
        };

        let frozen_mass = averages.frozen_mass();
        if frozen_mass > 0.0 {
            let particle_mass = params.particle_mass;
            let n = averages.accumulator(Observable::N);
            let n_mean = n.mean();
            let n_err = n.standard_error();

            derived.percent_wt = Some(Estimate::new(
                100.0 * n_mean * particle_mass / (frozen_mass + n_mean * particle_mass),
                sdom * 100.0 * n_err * particle_mass / (frozen_mass + n_err * particle_mass),
            ));
            derived.percent_wt_me = Some(Estimate::new(
                100.0 * n_mean * particle_mass / frozen_mass,
                sdom * 100.0 * n_err * particle_mass / frozen_mass,
            ));

            let fluctuation = ratio(averages.nu() - n_mean * energy.mean(), n.variance());
            derived.qst = Some((-fluctuation + temperature) * KELVIN_TO_KJ_PER_MOL);

            let free_volume = params.free_volume;
            if free_volume > 0.0 {
                let bulk_pressure = params.fugacity.bulk(params.pressure);
                let bulk_uptake =
                    particle_mass * free_volume * bulk_pressure * ATM_TO_REDUCED / temperature;
                derived.excess_ratio = Some(Estimate::new(
                    1000.0 * (n_mean * particle_mass - bulk_uptake) / frozen_mass,
                    sdom * 1000.0 * n_err * particle_mass / frozen_mass,
                ));
                // Only meaningful for a pure sorbate in a constant-volume cell.
                derived.pore_density = Some(Estimate::new(
                    averages.current_density() * averages.cell_volume() / free_volume,
                    sdom * n_err * particle_mass / (free_volume * AVOGADRO * A3_TO_CM3),
                ));
            }
        }

        derived
    }

    /// Isothermal compressibility in 1/atm.
    ///
    /// Isobaric runs use volume fluctuations; every other ensemble uses
    /// particle-number fluctuations at the current cell volume.
    fn compressibility(&self, averages: &GlobalAverages, params: &SimulationParameters) -> f64 {
        let kt = KB * params.temperature;
        match params.ensemble {
            Ensemble::Npt => {
                let volume = averages.accumulator(Observable::Volume);
                ratio(
                    ATM_TO_PASCALS * METER_TO_ANGSTROM.powi(-3) * volume.variance(),
                    kt * volume.mean(),
                )
            }
            Ensemble::Nvt
            | Ensemble::Uvt
            | Ensemble::Nve
            | Ensemble::NvtGibbs
            | Ensemble::PathIntegralNvt
            | Ensemble::Replay
            | Ensemble::TotalEnergy
            | Ensemble::Surface
            | Ensemble::SurfaceFit => {
                let n = averages.accumulator(Observable::N);
                let cell = averages.cell_volume() / METER_TO_ANGSTROM.powi(3);
                ratio(
                    ATM_TO_PASCALS * cell * n.variance(),
                    kt * n.mean() * n.mean(),
                )
            }
        }
    }
}

fn bulk_modulus(compressibility: Estimate) -> Estimate {
    let kappa = compressibility.value;
    Estimate::new(
        ratio(ATM_TO_PASCALS * PASCALS_TO_GIGAPASCALS, kappa),
        ratio(
            ATM_TO_PASCALS * PASCALS_TO_GIGAPASCALS * compressibility.error,
            kappa * kappa,
        ),
    )
}

/// `numerator / denominator`, NaN when the denominator is zero.
#[inline]
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}
