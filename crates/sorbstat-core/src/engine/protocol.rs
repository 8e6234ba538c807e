use super::averages::GlobalAverages;
use super::checkpoint::Checkpoint;
use super::config::SimulationParameters;
use super::derived::DerivedPropertyCalculator;
use super::error::AggregationError;
use super::nodestats::{AvgNodeStats, RootNodeStats};
use super::report::Report;
use super::sorbates::SorbateAggregator;
use crate::core::models::snapshot::ObservableSnapshot;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// One worker's contribution to an aggregation point.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub worker: usize,
    pub snapshot: ObservableSnapshot,
    pub node_stats: AvgNodeStats,
}

/// A member of the collective. Each worker owns its local state and produces
/// exactly one report per step.
pub trait Worker: Send {
    fn index(&self) -> usize;
    fn step(&mut self, step: u64) -> Result<WorkerReport, AggregationError>;
}

/// Sole owner of the global running state.
///
/// Reports are folded only once a full step is available, in worker-index
/// order, so the result does not depend on the order workers finish in.
#[derive(Debug, Clone)]
pub struct RootAggregator {
    params: SimulationParameters,
    calculator: DerivedPropertyCalculator,
    averages: GlobalAverages,
    sorbates: SorbateAggregator,
    node_stats: RootNodeStats,
    last_step: Option<u64>,
}

impl RootAggregator {
    pub fn new(params: SimulationParameters) -> Self {
        Self::with_calculator(params, DerivedPropertyCalculator::default())
    }

    pub fn with_calculator(
        params: SimulationParameters,
        calculator: DerivedPropertyCalculator,
    ) -> Self {
        let sorbates = SorbateAggregator::new(params.species.clone());
        Self {
            params,
            calculator,
            averages: GlobalAverages::new(),
            sorbates,
            node_stats: RootNodeStats::new(),
            last_step: None,
        }
    }

    /// Resumes from a checkpoint taken by a collective with the same shape.
    pub fn restore(
        params: SimulationParameters,
        checkpoint: Checkpoint,
    ) -> Result<Self, AggregationError> {
        Self::restore_with_calculator(params, DerivedPropertyCalculator::default(), checkpoint)
    }

    pub fn restore_with_calculator(
        params: SimulationParameters,
        calculator: DerivedPropertyCalculator,
        checkpoint: Checkpoint,
    ) -> Result<Self, AggregationError> {
        if checkpoint.workers != params.workers {
            return Err(AggregationError::CheckpointMismatch(format!(
                "checkpoint was taken with {} workers, configuration has {}",
                checkpoint.workers, params.workers
            )));
        }
        let checkpoint_ids: Vec<&str> = checkpoint
            .sorbates
            .species()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        let configured_ids: Vec<&str> = params.species.iter().map(|s| s.id.as_str()).collect();
        if checkpoint_ids != configured_ids {
            return Err(AggregationError::CheckpointMismatch(format!(
                "checkpoint sorbates {:?} differ from configured sorbates {:?}",
                checkpoint_ids, configured_ids
            )));
        }

        let mut averages = checkpoint.averages;
        averages.refresh_derived(&params, &calculator);
        Ok(Self {
            params,
            calculator,
            averages,
            sorbates: checkpoint.sorbates,
            node_stats: checkpoint.node_stats,
            last_step: checkpoint.last_step,
        })
    }

    #[inline]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[inline]
    pub fn averages(&self) -> &GlobalAverages {
        &self.averages
    }

    #[inline]
    pub fn sorbates(&self) -> &SorbateAggregator {
        &self.sorbates
    }

    #[inline]
    pub fn node_stats(&self) -> &RootNodeStats {
        &self.node_stats
    }

    #[inline]
    pub fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    /// Folds one complete step. On error nothing is ingested.
    #[instrument(level = "debug", skip_all, name = "root_fold", fields(step = step))]
    pub fn fold(&mut self, step: u64, mut reports: Vec<WorkerReport>) -> Result<(), AggregationError> {
        self.validate(step, &reports)?;
        reports.sort_by_key(|r| r.worker);

        for report in &reports {
            self.averages
                .ingest(&report.snapshot, &self.params, &self.calculator);
            self.sorbates.update(&report.snapshot, &self.params);
        }
        let worker_stats: Vec<AvgNodeStats> = reports.iter().map(|r| r.node_stats).collect();
        self.node_stats
            .fold(step, self.params.workers, self.params.corrtime, &worker_stats);
        self.last_step = Some(step);

        debug!(samples = self.averages.count(), "Step folded into root averages.");
        Ok(())
    }

    fn validate(&self, step: u64, reports: &[WorkerReport]) -> Result<(), AggregationError> {
        if let Some(last) = self.last_step {
            if step <= last {
                return Err(AggregationError::StepOutOfOrder { step, last });
            }
        }

        let size = self.params.workers;
        let expected_species = self.params.species.len();
        let mut seen = vec![false; size];
        for report in reports {
            let worker = report.worker;
            if worker >= size {
                return Err(AggregationError::UnknownWorker { step, worker, size });
            }
            if seen[worker] {
                return Err(AggregationError::DuplicateWorker { step, worker });
            }
            seen[worker] = true;

            let received = report.snapshot.species_count();
            if received != expected_species {
                return Err(AggregationError::SpeciesMismatch {
                    step,
                    worker,
                    expected: expected_species,
                    received,
                });
            }
        }

        if reports.len() != size {
            return Err(AggregationError::IncompleteStep {
                step,
                expected: size,
                received: reports.len(),
            });
        }
        Ok(())
    }

    /// Resets every root accumulator, as at the end of equilibration.
    pub fn clear_averages(&mut self) {
        self.averages.clear();
        self.sorbates.clear();
        self.node_stats.clear();
    }

    pub fn report(&self) -> Report {
        Report::new(
            self.last_step.unwrap_or(0),
            &self.averages,
            self.sorbates.globals(),
            self.node_stats.report(),
        )
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            last_step: self.last_step,
            workers: self.params.workers,
            averages: self.averages.clone(),
            sorbates: self.sorbates.clone(),
            node_stats: self.node_stats.clone(),
        }
    }
}

/// Runs a collective in lockstep: every worker steps in parallel, all reports
/// are collected, then the root folds them.
pub struct Lockstep<W: Worker> {
    workers: Vec<W>,
    root: RootAggregator,
}

impl<W: Worker> Lockstep<W> {
    pub fn new(workers: Vec<W>, root: RootAggregator) -> Self {
        Self { workers, root }
    }

    /// Steps every worker once and folds the result. The first worker
    /// failure aborts the step before anything is folded, and so does a
    /// report labelled with another worker's index.
    pub fn advance(&mut self, step: u64) -> Result<(), AggregationError> {
        let reports = self
            .workers
            .par_iter_mut()
            .map(|worker| {
                let index = worker.index();
                let report = worker.step(step)?;
                if report.worker != index {
                    return Err(AggregationError::WorkerFailed {
                        step,
                        worker: index,
                        reason: format!("report labelled as worker {}", report.worker),
                    });
                }
                Ok(report)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.root.fold(step, reports)
    }

    #[inline]
    pub fn root(&self) -> &RootAggregator {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut RootAggregator {
        &mut self.root
    }

    #[inline]
    pub fn workers(&self) -> &[W] {
        &self.workers
    }

    pub fn into_root(self) -> RootAggregator {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ensemble::Ensemble;
    use crate::core::models::sorbate::SorbateSpecies;
    use crate::engine::averages::Observable;

    fn params(workers: usize) -> SimulationParameters {
        SimulationParameters::builder()
            .temperature(300.0)
            .ensemble(Ensemble::Uvt)
            .workers(workers)
            .species(SorbateSpecies::new("H2", 2.016))
            .build()
            .unwrap()
    }

    fn report(worker: usize, energy: f64, n: f64) -> WorkerReport {
        WorkerReport {
            worker,
            snapshot: ObservableSnapshot::new(energy, n, 1000.0).with_sorbate_counts(vec![n]),
            node_stats: AvgNodeStats::default(),
        }
    }

    #[test]
    fn fold_ingests_every_worker_in_index_order() {
        let mut root = RootAggregator::new(params(2));
        root.fold(0, vec![report(1, -2.0, 2.0), report(0, -1.0, 1.0)])
            .unwrap();
        assert_eq!(root.averages().count(), 2);
        assert_eq!(root.averages().estimate(Observable::Energy).value, -1.5);
        assert_eq!(root.last_step(), Some(0));
        assert_eq!(root.node_stats().count(), 2);
    }

    #[test]
    fn out_of_order_reports_fold_identically_to_sorted_reports() {
        let mut sorted = RootAggregator::new(params(3));
        let mut shuffled = RootAggregator::new(params(3));
        for step in 0..4 {
            let base = step as f64;
            let reports = vec![
                report(0, -base, 1.0 + base),
                report(1, -2.0 * base, 2.0),
                report(2, 0.5 * base, 3.0 * base),
            ];
            let mut reversed = reports.clone();
            reversed.reverse();
            sorted.fold(step, reports).unwrap();
            shuffled.fold(step, reversed).unwrap();
        }
        assert_eq!(sorted.averages(), shuffled.averages());
        assert_eq!(sorted.sorbates(), shuffled.sorbates());
    }

    #[test]
    fn incomplete_step_is_rejected_without_ingesting() {
        let mut root = RootAggregator::new(params(2));
        let err = root.fold(0, vec![report(0, -1.0, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            AggregationError::IncompleteStep { expected: 2, received: 1, .. }
        ));
        assert_eq!(root.averages().count(), 0);
        assert_eq!(root.last_step(), None);
    }

    #[test]
    fn duplicate_and_unknown_workers_are_rejected() {
        let mut root = RootAggregator::new(params(2));
        assert!(matches!(
            root.fold(0, vec![report(0, -1.0, 1.0), report(0, -1.0, 1.0)]),
            Err(AggregationError::DuplicateWorker { worker: 0, .. })
        ));
        assert!(matches!(
            root.fold(0, vec![report(0, -1.0, 1.0), report(5, -1.0, 1.0)]),
            Err(AggregationError::UnknownWorker { worker: 5, size: 2, .. })
        ));
        assert_eq!(root.averages().count(), 0);
    }

    #[test]
    fn species_count_mismatch_is_rejected() {
        let mut root = RootAggregator::new(params(1));
        let mut bad = report(0, -1.0, 1.0);
        bad.snapshot.sorbate_counts = vec![1.0, 0.0];
        assert!(matches!(
            root.fold(0, vec![bad]),
            Err(AggregationError::SpeciesMismatch { expected: 1, received: 2, .. })
        ));
    }

    #[test]
    fn steps_must_increase() {
        let mut root = RootAggregator::new(params(1));
        root.fold(3, vec![report(0, -1.0, 1.0)]).unwrap();
        assert!(matches!(
            root.fold(3, vec![report(0, -1.0, 1.0)]),
            Err(AggregationError::StepOutOfOrder { step: 3, last: 3 })
        ));
    }

    #[test]
    fn clear_averages_resets_root_state_but_keeps_step() {
        let mut root = RootAggregator::new(params(1));
        root.fold(0, vec![report(0, -1.0, 1.0)]).unwrap();
        root.clear_averages();
        assert_eq!(root.averages().count(), 0);
        assert_eq!(root.node_stats().count(), 0);
        assert_eq!(root.sorbates().globals()[0].n.value, 0.0);
        assert_eq!(root.last_step(), Some(0));
        root.fold(1, vec![report(0, -4.0, 2.0)]).unwrap();
        assert_eq!(root.report().energy.value, -4.0);
    }

    #[test]
    fn restore_rejects_mismatched_collective() {
        let mut root = RootAggregator::new(params(2));
        root.fold(0, vec![report(0, -1.0, 1.0), report(1, -3.0, 2.0)])
            .unwrap();
        let checkpoint = root.checkpoint();
        assert!(matches!(
            RootAggregator::restore(params(3), checkpoint.clone()),
            Err(AggregationError::CheckpointMismatch(_))
        ));
        let restored = RootAggregator::restore(params(2), checkpoint).unwrap();
        assert_eq!(restored.averages(), root.averages());
        assert_eq!(restored.last_step(), Some(0));
    }

    struct ConstantWorker {
        index: usize,
        fail_at: Option<u64>,
    }

    impl Worker for ConstantWorker {
        fn index(&self) -> usize {
            self.index
        }

        fn step(&mut self, step: u64) -> Result<WorkerReport, AggregationError> {
            if self.fail_at == Some(step) {
                return Err(AggregationError::WorkerFailed {
                    step,
                    worker: self.index,
                    reason: "move engine diverged".to_string(),
                });
            }
            Ok(report(self.index, -(self.index as f64), 1.0))
        }
    }

    #[test]
    fn lockstep_folds_every_worker_each_step() {
        let workers = (0..4)
            .map(|index| ConstantWorker { index, fail_at: None })
            .collect();
        let mut lockstep = Lockstep::new(workers, RootAggregator::new(params(4)));
        for step in 0..3 {
            lockstep.advance(step).unwrap();
        }
        assert_eq!(lockstep.workers().len(), 4);
        let root = lockstep.into_root();
        assert_eq!(root.averages().count(), 12);
        assert!((root.averages().estimate(Observable::Energy).value + 1.5).abs() < 1e-12);
    }

    #[test]
    fn lockstep_aborts_on_worker_failure() {
        let workers = vec![
            ConstantWorker { index: 0, fail_at: None },
            ConstantWorker { index: 1, fail_at: Some(1) },
        ];
        let mut lockstep = Lockstep::new(workers, RootAggregator::new(params(2)));
        lockstep.advance(0).unwrap();
        assert!(matches!(
            lockstep.advance(1),
            Err(AggregationError::WorkerFailed { worker: 1, .. })
        ));
        assert_eq!(lockstep.root().averages().count(), 2);
    }

    struct MislabelledWorker;

    impl Worker for MislabelledWorker {
        fn index(&self) -> usize {
            1
        }

        fn step(&mut self, _step: u64) -> Result<WorkerReport, AggregationError> {
            Ok(report(0, -1.0, 1.0))
        }
    }

    #[test]
    fn lockstep_rejects_report_from_the_wrong_index() {
        let mut lockstep = Lockstep::new(vec![MislabelledWorker], RootAggregator::new(params(1)));
        assert!(matches!(
            lockstep.advance(0),
            Err(AggregationError::WorkerFailed { step: 0, worker: 1, .. })
        ));
        assert_eq!(lockstep.root().averages().count(), 0);
        assert_eq!(lockstep.root().last_step(), None);
    }
}
