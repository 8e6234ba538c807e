use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use sorbstat::core::models::ensemble::Ensemble;
use sorbstat::core::models::nodestats::{MoveKind, NodeStats};
use sorbstat::core::models::snapshot::ObservableSnapshot;
use sorbstat::core::models::sorbate::SorbateSpecies;
use sorbstat::engine::averages::Observable;
use sorbstat::engine::checkpoint::Checkpoint;
use sorbstat::engine::config::SimulationParameters;
use sorbstat::engine::nodestats::NodeStatsAggregator;
use sorbstat::engine::protocol::{RootAggregator, WorkerReport};

fn parameters(ensemble: Ensemble, workers: usize) -> SimulationParameters {
    SimulationParameters::builder()
        .temperature(77.0)
        .ensemble(ensemble)
        .pressure(1.0)
        .workers(workers)
        .species(SorbateSpecies::new("H2", 2.016))
        .build()
        .unwrap()
}

fn report(worker: usize, energy: f64, n: f64, volume: f64) -> WorkerReport {
    WorkerReport {
        worker,
        snapshot: ObservableSnapshot::new(energy, n, volume).with_sorbate_counts(vec![n]),
        node_stats: Default::default(),
    }
}

fn random_step(rng: &mut StdRng, workers: usize) -> Vec<WorkerReport> {
    (0..workers)
        .map(|worker| {
            let n = rng.gen_range(5..15) as f64;
            let energy = -40.0 * n + rng.gen_range(-25.0..25.0);
            let volume = rng.gen_range(950.0..1050.0);
            report(worker, energy, n, volume)
        })
        .collect()
}

#[test]
fn replaying_the_same_stream_is_bit_identical() {
    let params = parameters(Ensemble::Uvt, 3);
    let mut rng = StdRng::seed_from_u64(7);
    let steps: Vec<Vec<WorkerReport>> = (0..50).map(|_| random_step(&mut rng, 3)).collect();

    let mut first = RootAggregator::new(params.clone());
    let mut second = RootAggregator::new(params);
    for (step, reports) in steps.iter().enumerate() {
        first.fold(step as u64, reports.clone()).unwrap();
        let mut shuffled = reports.clone();
        shuffled.rotate_left(step % 3);
        second.fold(step as u64, shuffled).unwrap();
    }

    for observable in Observable::ALL {
        assert_eq!(
            first.averages().accumulator(observable),
            second.averages().accumulator(observable)
        );
    }
    assert_eq!(first.sorbates(), second.sorbates());
    assert_eq!(
        first.report().derived.heat_capacity,
        second.report().derived.heat_capacity
    );
}

#[test]
fn uniform_samples_converge_to_known_moments() {
    let params = parameters(Ensemble::Nvt, 4);
    let mut root = RootAggregator::new(params);
    let mut rng = StdRng::seed_from_u64(2024);

    let steps = 5000;
    for step in 0..steps {
        let reports = (0..4)
            .map(|worker| report(worker, rng.gen_range(0.0..1.0), 1.0, 1000.0))
            .collect();
        root.fold(step, reports).unwrap();
    }

    let energy = root.averages().estimate(Observable::Energy);
    let samples = (steps * 4) as f64;
    let sigma = (1.0_f64 / 12.0).sqrt();
    assert!((energy.value - 0.5).abs() < 0.02, "mean = {}", energy.value);

    let expected_error = sigma / (samples - 1.0).sqrt();
    assert!(
        (energy.error - expected_error).abs() / expected_error < 0.05,
        "error = {}, expected about {}",
        energy.error,
        expected_error
    );
}

#[test]
fn three_step_population_error_matches_hand_value() {
    let mut root = RootAggregator::new(parameters(Ensemble::Uvt, 1));
    for (step, n) in [10.0, 12.0, 11.0].into_iter().enumerate() {
        root.fold(step as u64, vec![report(0, -1.0, n, 1000.0)])
            .unwrap();
    }
    let n = root.report().n;
    assert!((n.value - 11.0).abs() < 1e-9);
    let mean_sq = (100.0 + 144.0 + 121.0) / 3.0;
    let expected = (mean_sq - 121.0_f64).sqrt() / 2.0_f64.sqrt();
    assert!((n.error - expected).abs() < 1e-9);
}

#[test]
fn compressibility_differs_between_nvt_and_npt() {
    let mut rng = StdRng::seed_from_u64(11);
    let steps: Vec<Vec<WorkerReport>> = (0..40).map(|_| random_step(&mut rng, 2)).collect();

    let mut nvt = RootAggregator::new(parameters(Ensemble::Nvt, 2));
    let mut npt = RootAggregator::new(parameters(Ensemble::Npt, 2));
    for (step, reports) in steps.into_iter().enumerate() {
        nvt.fold(step as u64, reports.clone()).unwrap();
        npt.fold(step as u64, reports).unwrap();
    }

    let kappa_nvt = nvt.report().derived.compressibility;
    let kappa_npt = npt.report().derived.compressibility;
    assert!(kappa_nvt.is_finite() && kappa_nvt.value > 0.0);
    assert!(kappa_npt.is_finite() && kappa_npt.value > 0.0);
    assert_ne!(kappa_nvt.value, kappa_npt.value);

    // Everything but the compressibility family is ensemble independent.
    assert_eq!(
        nvt.report().derived.heat_capacity,
        npt.report().derived.heat_capacity
    );
}

#[test]
fn acceptance_rate_tracks_latest_cumulative_ratio() {
    let mut stats = NodeStats::new();
    let mut local = NodeStatsAggregator::new();
    let mut root = RootAggregator::new(parameters(Ensemble::Uvt, 1));

    let outcomes = [true, true, false, true, false, false, false, true];
    for (step, &accepted) in outcomes.iter().enumerate() {
        stats.record(MoveKind::Remove, accepted);
        stats.record(MoveKind::Insert, !accepted);
        local.update(&stats);

        let mut worker_report = report(0, -1.0, 1.0, 1000.0);
        worker_report.node_stats = local.summary();
        root.fold(step as u64, vec![worker_report]).unwrap();

        let seen = &outcomes[..=step];
        let accepted_so_far = seen.iter().filter(|&&a| a).count() as f64;
        let expected = accepted_so_far / seen.len() as f64;
        let rates = root.report().node_stats.acceptance;
        assert!((rates.remove - expected).abs() < 1e-12);
        assert!((rates.insert - (1.0 - expected)).abs() < 1e-12);
        assert!((rates.overall - 0.5).abs() < 1e-12);
    }
}

#[test]
fn checkpoint_restore_then_continue_equals_uninterrupted_run() {
    let params = parameters(Ensemble::Uvt, 2);
    let mut rng = StdRng::seed_from_u64(99);
    let steps: Vec<Vec<WorkerReport>> = (0..30).map(|_| random_step(&mut rng, 2)).collect();

    let mut uninterrupted = RootAggregator::new(params.clone());
    for (step, reports) in steps.iter().enumerate() {
        uninterrupted.fold(step as u64, reports.clone()).unwrap();
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("root.json");
    let mut first_leg = RootAggregator::new(params.clone());
    for (step, reports) in steps.iter().enumerate().take(12) {
        first_leg.fold(step as u64, reports.clone()).unwrap();
    }
    first_leg.checkpoint().store(&path).unwrap();

    let mut second_leg = RootAggregator::restore(params, Checkpoint::load(&path).unwrap()).unwrap();
    for (step, reports) in steps.iter().enumerate().skip(12) {
        second_leg.fold(step as u64, reports.clone()).unwrap();
    }

    for observable in Observable::ALL {
        assert_eq!(
            second_leg.averages().accumulator(observable),
            uninterrupted.averages().accumulator(observable)
        );
    }
    assert_eq!(second_leg.sorbates(), uninterrupted.sorbates());
    assert_eq!(second_leg.report().derived, uninterrupted.report().derived);
}

#[test]
fn missing_static_inputs_withhold_dependent_fields() {
    let mut root = RootAggregator::new(parameters(Ensemble::Uvt, 1));
    for (step, n) in [3.0, 5.0, 4.0].into_iter().enumerate() {
        root.fold(step as u64, vec![report(0, -10.0 * n, n, 1000.0)])
            .unwrap();
    }
    let report = root.report();
    assert!(report.derived.percent_wt.is_none());
    assert!(report.derived.percent_wt_me.is_none());
    assert!(report.derived.qst.is_none());
    assert!(report.derived.excess_ratio.is_none());
    assert!(report.derived.pore_density.is_none());
    assert!(report.sorbates[0].percent_wt.is_none());
    assert!(report.sorbates[0].pore_density.is_none());
    assert!(report.sorbates[0].selectivity.is_none());
}

#[test]
fn equal_species_have_equal_selectivity() {
    let params = SimulationParameters::builder()
        .temperature(77.0)
        .ensemble(Ensemble::Uvt)
        .species(SorbateSpecies::new("H2", 2.016))
        .species(SorbateSpecies::new("D2", 4.028))
        .build()
        .unwrap();
    let mut root = RootAggregator::new(params);
    for (step, n) in [4.0, 6.0, 5.0, 7.0].into_iter().enumerate() {
        let reports = vec![WorkerReport {
            worker: 0,
            snapshot: ObservableSnapshot::new(-1.0, 2.0 * n, 1000.0)
                .with_sorbate_counts(vec![n, n]),
            node_stats: Default::default(),
        }];
        root.fold(step as u64, reports).unwrap();
    }

    let sorbates = root.report().sorbates;
    let first = sorbates[0].selectivity.unwrap();
    let second = sorbates[1].selectivity.unwrap();
    assert_eq!(first, second);
    assert!((first.value - 1.0).abs() < 1e-12);
    assert!(first.error > 0.0);
}
