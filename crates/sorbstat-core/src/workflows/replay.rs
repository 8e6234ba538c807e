use crate::core::io::snapshots::SnapshotRecord;
use crate::engine::checkpoint::Checkpoint;
use crate::engine::config::SimulationParameters;
use crate::engine::error::AggregationError;
use crate::engine::nodestats::NodeStatsAggregator;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::protocol::{Lockstep, RootAggregator, Worker, WorkerReport};
use crate::engine::report::Report;
use std::collections::{BTreeMap, VecDeque};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Number of leading steps whose statistics are discarded. Averages are
    /// cleared right after the last of them is folded.
    pub equilibration_steps: u64,
    /// Root state to continue from; steps up to its last step are skipped.
    pub resume_from: Option<Checkpoint>,
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub report: Report,
    pub root: RootAggregator,
    pub steps_folded: u64,
}

/// Plays one worker's share of a recorded stream back in step order.
struct ReplayWorker {
    index: usize,
    pending: VecDeque<SnapshotRecord>,
    stats: NodeStatsAggregator,
}

impl ReplayWorker {
    fn new(index: usize) -> Self {
        Self {
            index,
            pending: VecDeque::new(),
            stats: NodeStatsAggregator::new(),
        }
    }

    /// Consumes every record up to and including `last`, keeping the
    /// worker-local move statistics as they were when the root state was
    /// saved.
    fn skip_through(&mut self, last: u64) {
        while self.pending.front().is_some_and(|r| r.step <= last) {
            if let Some(record) = self.pending.pop_front() {
                self.stats.update(&record.node_stats);
            }
        }
    }
}

impl Worker for ReplayWorker {
    fn index(&self) -> usize {
        self.index
    }

    fn step(&mut self, step: u64) -> Result<WorkerReport, AggregationError> {
        let record = match self.pending.pop_front() {
            Some(record) if record.step == step => record,
            _ => {
                return Err(AggregationError::WorkerFailed {
                    step,
                    worker: self.index,
                    reason: "no snapshot recorded for this step".to_string(),
                });
            }
        };
        self.stats.update(&record.node_stats);
        Ok(WorkerReport {
            worker: self.index,
            snapshot: record.snapshot,
            node_stats: self.stats.summary(),
        })
    }
}

/// Checks that every step of the stream carries exactly one record per
/// worker and returns the steps in increasing order.
fn collect_steps(records: &[SnapshotRecord], size: usize) -> Result<Vec<u64>, AggregationError> {
    let mut steps: BTreeMap<u64, Vec<bool>> = BTreeMap::new();
    for record in records {
        let (step, worker) = (record.step, record.worker);
        if worker >= size {
            return Err(AggregationError::UnknownWorker { step, worker, size });
        }
        let seen = steps.entry(step).or_insert_with(|| vec![false; size]);
        if seen[worker] {
            return Err(AggregationError::DuplicateWorker { step, worker });
        }
        seen[worker] = true;
    }

    for (&step, seen) in &steps {
        let received = seen.iter().filter(|&&s| s).count();
        if received != size {
            return Err(AggregationError::IncompleteStep {
                step,
                expected: size,
                received,
            });
        }
    }
    Ok(steps.into_keys().collect())
}

#[instrument(skip_all, name = "replay_workflow")]
pub fn run(
    records: Vec<SnapshotRecord>,
    params: &SimulationParameters,
    options: ReplayOptions,
    reporter: &ProgressReporter,
) -> Result<ReplayOutcome, AggregationError> {
    // === Phase 0: Stream validation and worker setup ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let size = params.workers;
    let steps = collect_steps(&records, size)?;
    info!(
        records = records.len(),
        steps = steps.len(),
        workers = size,
        "Snapshot stream validated."
    );

    let (root, resume_after) = match options.resume_from {
        Some(checkpoint) => {
            let last = checkpoint.last_step;
            let root = RootAggregator::restore(params.clone(), checkpoint)?;
            info!(last_step = ?last, "Resuming from checkpoint.");
            reporter.report(Progress::Message(match last {
                Some(step) => format!("Resuming after step {step}"),
                None => "Resuming from a checkpoint with no folded steps".to_string(),
            }));
            (root, last)
        }
        None => (RootAggregator::new(params.clone()), None),
    };

    let equilibration_boundary = options
        .equilibration_steps
        .checked_sub(1)
        .and_then(|i| steps.get(i as usize))
        .copied();

    let mut workers: Vec<ReplayWorker> = (0..size).map(ReplayWorker::new).collect();
    for record in records {
        workers[record.worker].pending.push_back(record);
    }
    for worker in &mut workers {
        worker.pending.make_contiguous().sort_by_key(|r| r.step);
        if let Some(last) = resume_after {
            worker.skip_through(last);
        }
    }

    let pending: Vec<u64> = steps
        .into_iter()
        .filter(|&step| resume_after.is_none_or(|last| step > last))
        .collect();
    reporter.report(Progress::PhaseFinish);

    // === Phase 1: Lockstep aggregation ===
    reporter.report(Progress::PhaseStart {
        name: "Aggregation",
    });
    reporter.report(Progress::StepsStart {
        total_steps: pending.len() as u64,
    });

    let mut lockstep = Lockstep::new(workers, root);
    for &step in &pending {
        lockstep.advance(step)?;
        reporter.report(Progress::StepFolded { step });

        if equilibration_boundary == Some(step) {
            lockstep.root_mut().clear_averages();
            info!(step, "Equilibration finished; root averages cleared.");
            reporter.report(Progress::AveragesCleared { step });
        }
    }

    reporter.report(Progress::StepsFinish);
    reporter.report(Progress::PhaseFinish);

    let root = lockstep.into_root();
    info!(
        steps_folded = pending.len(),
        samples = root.averages().count(),
        "Replay complete."
    );

    Ok(ReplayOutcome {
        report: root.report(),
        root,
        steps_folded: pending.len() as u64,
    })
}
