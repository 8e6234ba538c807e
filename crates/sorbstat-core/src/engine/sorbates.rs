use super::config::SimulationParameters;
use super::derived::ratio;
use crate::core::constants::{A3_TO_CM3, ATM_TO_REDUCED, AVOGADRO};
use crate::core::models::snapshot::ObservableSnapshot;
use crate::core::models::sorbate::{SorbateInfo, SorbateSpecies};
use crate::core::stats::moments::{Estimate, MomentAccumulator};
use serde::{Deserialize, Serialize};

/// Current values of every declared species for one snapshot.
///
/// Terms whose static denominator (total mass, frozen mass, cell volume or
/// free volume) is not positive are zero.
pub fn compute_info(
    species: &[SorbateSpecies],
    snapshot: &ObservableSnapshot,
    params: &SimulationParameters,
) -> Vec<SorbateInfo> {
    species
        .iter()
        .enumerate()
        .map(|(i, sorbate)| {
            let current_n = snapshot.sorbate_counts.get(i).copied().unwrap_or(0.0);
            let pressure = params.fugacity.for_species(i, params.pressure);
            let sorbed_mass = current_n * sorbate.mass;

            let percent_wt = if snapshot.total_mass > 0.0 {
                100.0 * sorbed_mass / snapshot.total_mass
            } else {
                0.0
            };
            let percent_wt_me = if snapshot.frozen_mass > 0.0 {
                100.0 * sorbed_mass / snapshot.frozen_mass
            } else {
                0.0
            };
            // The bulk-phase correction needs the free volume.
            let excess_ratio = if snapshot.frozen_mass > 0.0 && params.free_volume > 0.0 {
                let bulk_n =
                    sorbate.mass * params.free_volume * pressure * ATM_TO_REDUCED / params.temperature;
                1000.0 * sorbate.mass * (current_n - bulk_n) / snapshot.frozen_mass
            } else {
                0.0
            };
            let density = if snapshot.volume > 0.0 {
                sorbed_mass / (snapshot.volume * AVOGADRO * A3_TO_CM3)
            } else {
                0.0
            };
            let pore_density = if params.free_volume > 0.0 {
                sorbed_mass / (params.free_volume * AVOGADRO * A3_TO_CM3)
            } else {
                0.0
            };

            SorbateInfo {
                current_n,
                percent_wt,
                percent_wt_me,
                excess_ratio,
                density,
                pore_density,
            }
        })
        .collect()
}

/// Which static denominators were available at the latest update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Denominators {
    pub total_mass: bool,
    pub frozen_mass: bool,
    pub volume: bool,
    pub free_volume: bool,
}

impl Denominators {
    pub fn of(snapshot: &ObservableSnapshot, params: &SimulationParameters) -> Self {
        Self {
            total_mass: snapshot.total_mass > 0.0,
            frozen_mass: snapshot.frozen_mass > 0.0,
            volume: snapshot.volume > 0.0,
            free_volume: params.free_volume > 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct SorbateAccumulators {
    n: MomentAccumulator,
    percent_wt: MomentAccumulator,
    percent_wt_me: MomentAccumulator,
    excess_ratio: MomentAccumulator,
    density: MomentAccumulator,
    pore_density: MomentAccumulator,
}

impl SorbateAccumulators {
    fn update(&mut self, info: &SorbateInfo) {
        self.n.update(info.current_n);
        self.percent_wt.update(info.percent_wt);
        self.percent_wt_me.update(info.percent_wt_me);
        self.excess_ratio.update(info.excess_ratio);
        self.density.update(info.density);
        self.pore_density.update(info.pore_density);
    }
}

/// Running averages of one species, with its selectivity against the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SorbateGlobal {
    pub id: String,
    pub n: Estimate,
    pub percent_wt: Option<Estimate>,
    pub percent_wt_me: Option<Estimate>,
    pub excess_ratio: Option<Estimate>,
    pub density: Option<Estimate>,
    pub pore_density: Option<Estimate>,
    /// `None` unless more than one species is declared.
    pub selectivity: Option<Estimate>,
}

/// Root-owned per-species running averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SorbateAggregator {
    species: Vec<SorbateSpecies>,
    stats: Vec<SorbateAccumulators>,
    denominators: Denominators,
}

impl SorbateAggregator {
    pub fn new(species: Vec<SorbateSpecies>) -> Self {
        let stats = vec![SorbateAccumulators::default(); species.len()];
        Self {
            species,
            stats,
            denominators: Denominators::default(),
        }
    }

    #[inline]
    pub fn species(&self) -> &[SorbateSpecies] {
        &self.species
    }

    /// Computes the current per-species values of `snapshot` and folds them in.
    pub fn update(&mut self, snapshot: &ObservableSnapshot, params: &SimulationParameters) {
        let infos = compute_info(&self.species, snapshot, params);
        self.denominators = Denominators::of(snapshot, params);
        self.ingest(&infos);
    }

    /// Folds one set of current values, one entry per declared species.
    pub fn ingest(&mut self, infos: &[SorbateInfo]) {
        for (stats, info) in self.stats.iter_mut().zip(infos) {
            stats.update(info);
        }
    }

    pub fn clear(&mut self) {
        for stats in &mut self.stats {
            *stats = SorbateAccumulators::default();
        }
    }

    pub fn globals(&self) -> Vec<SorbateGlobal> {
        let populations: Vec<Estimate> = self.stats.iter().map(|s| s.n.estimate()).collect();
        let selectivities = selectivity(&populations);
        let d = self.denominators;
        let when = |available: bool, acc: &MomentAccumulator| available.then(|| acc.estimate());

        self.species
            .iter()
            .zip(&self.stats)
            .zip(selectivities)
            .map(|((sorbate, stats), selectivity)| SorbateGlobal {
                id: sorbate.id.clone(),
                n: stats.n.estimate(),
                percent_wt: when(d.total_mass, &stats.percent_wt),
                percent_wt_me: when(d.frozen_mass, &stats.percent_wt_me),
                excess_ratio: when(d.frozen_mass && d.free_volume, &stats.excess_ratio),
                density: when(d.volume, &stats.density),
                pore_density: when(d.free_volume, &stats.pore_density),
                selectivity,
            })
            .collect()
    }
}

/// `S_i = <N_i> / sum_{j != i} <N_j>` with the relative errors of every
/// population added in quadrature. Cross-species correlation is ignored.
pub fn selectivity(populations: &[Estimate]) -> Vec<Option<Estimate>> {
    if populations.len() < 2 {
        return vec![None; populations.len()];
    }

    let relative_sq: f64 = populations
        .iter()
        .map(|p| (p.error * p.error) / (p.value * p.value))
        .sum();
    let total: f64 = populations.iter().map(|p| p.value).sum();

    populations
        .iter()
        .map(|p| {
            let others = total - p.value;
            let value = ratio(p.value, others);
            Some(Estimate::new(value, value * relative_sq.sqrt()))
        })
        .collect()
}
