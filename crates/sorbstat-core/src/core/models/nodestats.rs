use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Insert,
    Remove,
    Displace,
    Adiabatic,
    SpinFlip,
    Volume,
    ParallelTempering,
}

impl MoveKind {
    pub const ALL: [MoveKind; 7] = [
        MoveKind::Insert,
        MoveKind::Remove,
        MoveKind::Displace,
        MoveKind::Adiabatic,
        MoveKind::SpinFlip,
        MoveKind::Volume,
        MoveKind::ParallelTempering,
    ];

    /// Column-friendly name used by the snapshot stream (`accept_<name>`).
    pub fn name(self) -> &'static str {
        match self {
            MoveKind::Insert => "insert",
            MoveKind::Remove => "remove",
            MoveKind::Displace => "displace",
            MoveKind::Adiabatic => "adiabatic",
            MoveKind::SpinFlip => "spinflip",
            MoveKind::Volume => "volume",
            MoveKind::ParallelTempering => "ptemp",
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveCounter {
    pub accept: u64,
    pub reject: u64,
}

impl MoveCounter {
    pub fn new(accept: u64, reject: u64) -> Self {
        Self { accept, reject }
    }

    /// `accept / (accept + reject)`, or zero when no move was attempted.
    #[inline]
    pub fn rate(&self) -> f64 {
        let attempts = self.accept + self.reject;
        if attempts == 0 {
            0.0
        } else {
            self.accept as f64 / attempts as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveCounters {
    pub insert: MoveCounter,
    pub remove: MoveCounter,
    pub displace: MoveCounter,
    pub adiabatic: MoveCounter,
    pub spin_flip: MoveCounter,
    pub volume: MoveCounter,
    pub ptemp: MoveCounter,
}

impl MoveCounters {
    pub fn get(&self, kind: MoveKind) -> &MoveCounter {
        match kind {
            MoveKind::Insert => &self.insert,
            MoveKind::Remove => &self.remove,
            MoveKind::Displace => &self.displace,
            MoveKind::Adiabatic => &self.adiabatic,
            MoveKind::SpinFlip => &self.spin_flip,
            MoveKind::Volume => &self.volume,
            MoveKind::ParallelTempering => &self.ptemp,
        }
    }

    pub fn get_mut(&mut self, kind: MoveKind) -> &mut MoveCounter {
        match kind {
            MoveKind::Insert => &mut self.insert,
            MoveKind::Remove => &mut self.remove,
            MoveKind::Displace => &mut self.displace,
            MoveKind::Adiabatic => &mut self.adiabatic,
            MoveKind::SpinFlip => &mut self.spin_flip,
            MoveKind::Volume => &mut self.volume,
            MoveKind::ParallelTempering => &mut self.ptemp,
        }
    }
}

/// Acceptance rate per move category plus the overall rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AcceptanceRates {
    pub overall: f64,
    pub insert: f64,
    pub remove: f64,
    pub displace: f64,
    pub adiabatic: f64,
    pub spin_flip: f64,
    pub volume: f64,
    pub ptemp: f64,
}

impl AcceptanceRates {
    pub fn get(&self, kind: MoveKind) -> f64 {
        match kind {
            MoveKind::Insert => self.insert,
            MoveKind::Remove => self.remove,
            MoveKind::Displace => self.displace,
            MoveKind::Adiabatic => self.adiabatic,
            MoveKind::SpinFlip => self.spin_flip,
            MoveKind::Volume => self.volume,
            MoveKind::ParallelTempering => self.ptemp,
        }
    }

    /// Component-wise arithmetic mean; the default (all zero) for an empty slice.
    pub fn mean_of(rates: &[AcceptanceRates]) -> Self {
        if rates.is_empty() {
            return Self::default();
        }
        let n = rates.len() as f64;
        let sum = |f: fn(&AcceptanceRates) -> f64| rates.iter().map(f).sum::<f64>() / n;
        Self {
            overall: sum(|r| r.overall),
            insert: sum(|r| r.insert),
            remove: sum(|r| r.remove),
            displace: sum(|r| r.displace),
            adiabatic: sum(|r| r.adiabatic),
            spin_flip: sum(|r| r.spin_flip),
            volume: sum(|r| r.volume),
            ptemp: sum(|r| r.ptemp),
        }
    }
}

/// Per-worker move bookkeeping.
///
/// The counters are cumulative since the last [`NodeStats::reset_counts`]; the
/// three diagnostics are the values observed at the current step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeStats {
    pub total: MoveCounter,
    pub moves: MoveCounters,
    pub boltzmann_factor: f64,
    pub cavity_bias_probability: f64,
    pub polarization_iterations: f64,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one attempted move of `kind`, in its category and in the total.
    pub fn record(&mut self, kind: MoveKind, accepted: bool) {
        let counter = self.moves.get_mut(kind);
        if accepted {
            counter.accept += 1;
            self.total.accept += 1;
        } else {
            counter.reject += 1;
            self.total.reject += 1;
        }
    }

    pub fn acceptance_rates(&self) -> AcceptanceRates {
        AcceptanceRates {
            overall: self.total.rate(),
            insert: self.moves.insert.rate(),
            remove: self.moves.remove.rate(),
            displace: self.moves.displace.rate(),
            adiabatic: self.moves.adiabatic.rate(),
            spin_flip: self.moves.spin_flip.rate(),
            volume: self.moves.volume.rate(),
            ptemp: self.moves.ptemp.rate(),
        }
    }

    /// Clears the raw counters at the start of a reporting interval.
    pub fn reset_counts(&mut self) {
        self.total = MoveCounter::default();
        self.moves = MoveCounters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn rate_is_zero_when_no_moves_were_attempted() {
        assert_eq!(MoveCounter::default().rate(), 0.0);
    }

    #[test]
    fn rate_is_accept_over_attempts() {
        assert!((MoveCounter::new(3, 1).rate() - 0.75).abs() < TOLERANCE);
        assert_eq!(MoveCounter::new(0, 5).rate(), 0.0);
        assert_eq!(MoveCounter::new(5, 0).rate(), 1.0);
    }

    #[test]
    fn record_updates_category_and_total() {
        let mut stats = NodeStats::new();
        stats.record(MoveKind::Insert, true);
        stats.record(MoveKind::Insert, false);
        stats.record(MoveKind::Displace, true);

        assert_eq!(stats.moves.insert, MoveCounter::new(1, 1));
        assert_eq!(stats.moves.displace, MoveCounter::new(1, 0));
        assert_eq!(stats.total, MoveCounter::new(2, 1));

        let rates = stats.acceptance_rates();
        assert!((rates.overall - 2.0 / 3.0).abs() < TOLERANCE);
        assert!((rates.insert - 0.5).abs() < TOLERANCE);
        assert_eq!(rates.displace, 1.0);
        assert_eq!(rates.volume, 0.0);
    }

    #[test]
    fn reset_counts_clears_counters_but_not_diagnostics() {
        let mut stats = NodeStats::new();
        stats.record(MoveKind::Volume, true);
        stats.boltzmann_factor = 0.4;
        stats.reset_counts();
        assert_eq!(stats.total, MoveCounter::default());
        assert_eq!(stats.moves, MoveCounters::default());
        assert_eq!(stats.boltzmann_factor, 0.4);
    }

    #[test]
    fn get_and_get_mut_address_the_same_counter() {
        let mut counters = MoveCounters::default();
        for kind in MoveKind::ALL {
            counters.get_mut(kind).accept = 7;
            assert_eq!(counters.get(kind).accept, 7);
        }
    }

    #[test]
    fn mean_of_averages_each_component() {
        let a = AcceptanceRates {
            overall: 0.2,
            insert: 0.4,
            ..AcceptanceRates::default()
        };
        let b = AcceptanceRates {
            overall: 0.6,
            insert: 0.0,
            ..AcceptanceRates::default()
        };
        let mean = AcceptanceRates::mean_of(&[a, b]);
        assert!((mean.overall - 0.4).abs() < TOLERANCE);
        assert!((mean.insert - 0.2).abs() < TOLERANCE);
        assert_eq!(AcceptanceRates::mean_of(&[]), AcceptanceRates::default());
    }
}
