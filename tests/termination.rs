use std::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};
use trancheflow::algo::solve::{solve_best_ratio, solve_cheapest_opening, solve_source_saturating};
use trancheflow::algo::SolveError;
use trancheflow::{FlowNetwork, TrancheEdge};

type Strategy = fn(&mut FlowNetwork, f64) -> Result<bool, SolveError>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("cheapest-opening", solve_cheapest_opening),
    ("source-saturating", solve_source_saturating),
    ("best-ratio", solve_best_ratio),
];

/// Tallies the per-iteration diagnostic lines the strategies emit. Loggers
/// are process-global, so the assertions built on this one live in their own
/// binary.
struct AugmentationCounter;

static COUNTER: AugmentationCounter = AugmentationCounter;
static COUNTED: AtomicUsize = AtomicUsize::new(0);

impl Log for AugmentationCounter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record<'_>) {
        if record.level() == Level::Debug && record.args().to_string().contains("iteration =") {
            COUNTED.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn flush(&self) {}
}

/// Two chained edges, each with two tranches of 3 units.
fn two_tranche_chain() -> FlowNetwork {
    let edges = vec![
        TrancheEdge::from_levels(0, 1, &[3.0, 3.0], &[1.0, 2.0], &[0.0, 4.0]).unwrap(),
        TrancheEdge::from_levels(1, 2, &[3.0, 3.0], &[1.0, 2.0], &[0.0, 4.0]).unwrap(),
    ];
    FlowNetwork::new(3, edges).unwrap()
}

#[test]
fn augmentations_stay_within_the_tranche_count() {
    log::set_logger(&COUNTER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    for (name, solve) in STRATEGIES {
        let mut net = two_tranche_chain();
        let tranches: usize = net
            .tranche_edges()
            .iter()
            .map(|edge| edge.levels().len())
            .sum();

        COUNTED.store(0, Ordering::SeqCst);
        assert!(solve(&mut net, 6.0).unwrap(), "{name}");
        let iterations = COUNTED.load(Ordering::SeqCst);
        assert!(iterations >= 1, "{name}: no augmentations counted");
        assert!(
            iterations <= tranches,
            "{name}: {iterations} augmentations for {tranches} tranches"
        );

        // An infeasible demand has to give up within the same bound.
        let mut fresh = two_tranche_chain();
        COUNTED.store(0, Ordering::SeqCst);
        assert!(!solve(&mut fresh, 7.0).unwrap(), "{name}");
        assert!(
            COUNTED.load(Ordering::SeqCst) <= tranches,
            "{name}: infeasible demand kept augmenting"
        );
    }
}
