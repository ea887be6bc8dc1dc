use alloc::vec::Vec;

use log::{debug, info};

use crate::algo::search::{find_cheapest_path, find_cheapest_path_for};
use crate::algo::SolveError;
use crate::network::FlowNetwork;
use crate::path::FlowPath;
use crate::EPSILON;

/// Routes `demand` units from source to sink by repeatedly augmenting along
/// the path with the cheapest opening cost.
///
/// Every augmentation is committed; later iterations may route through
/// reverse slots to cancel it, but no replanning undoes it directly.
/// Returns whether the demand was met. On `false` the network keeps the
/// partial flow it reached.
pub fn solve_cheapest_opening(net: &mut FlowNetwork, demand: f64) -> Result<bool, SolveError> {
    let mut iteration = 0usize;
    loop {
        let routed = net.total_flow();
        let remaining = demand - routed;
        if remaining <= EPSILON {
            summary(net, "cheapest-opening", demand, true);
            return Ok(true);
        }

        let path = match find_cheapest_path(net)? {
            Some(path) => path,
            None => {
                summary(net, "cheapest-opening", demand, false);
                return Ok(false);
            }
        };
        let amount = path.flow().min(remaining);
        trace_step(iteration, routed, &path, amount);
        net.augment_along_path(path.nodes(), amount);
        iteration += 1;
    }
}

/// Saturates source-adjacent headroom in best flow-per-cost order.
pub fn solve_source_saturating(net: &mut FlowNetwork, demand: f64) -> Result<bool, SolveError> {
    solve_by_ratio(net, "source-saturating", demand)
}

/// Routes the augmentation with the highest flow-per-cost quote each round.
///
/// Selects identically to [`solve_source_saturating`]; both names delegate
/// to the same engine.
pub fn solve_best_ratio(net: &mut FlowNetwork, demand: f64) -> Result<bool, SolveError> {
    solve_by_ratio(net, "best-ratio", demand)
}

/// Shared engine of the ratio strategies: each round quotes, for every arc
/// leaving the source, the cheapest whole-network route carrying that arc's
/// usable headroom, and fully augments the quote with the best flow per
/// cost. A round with no quote above zero gives up.
fn solve_by_ratio(net: &mut FlowNetwork, strategy: &str, demand: f64) -> Result<bool, SolveError> {
    let mut iteration = 0usize;
    loop {
        let routed = net.total_flow();
        let remaining = demand - routed;
        if remaining <= EPSILON {
            summary(net, strategy, demand, true);
            return Ok(true);
        }

        let mut best: Option<FlowPath> = None;
        let mut best_ratio = 0.0;
        let amounts: Vec<f64> = net
            .views_from(net.source())
            .map(|view| view.usable_capacity().min(remaining))
            .collect();
        for amount in amounts {
            if amount <= EPSILON {
                continue;
            }
            if let Some(path) = find_cheapest_path_for(net, amount)? {
                let ratio = path.flow_per_cost();
                if ratio > best_ratio {
                    best_ratio = ratio;
                    best = Some(path);
                }
            }
        }

        let path = match best {
            Some(path) => path,
            None => {
                summary(net, strategy, demand, false);
                return Ok(false);
            }
        };
        trace_step(iteration, routed, &path, path.flow());
        net.augment_along_path(path.nodes(), path.flow());
        iteration += 1;
    }
}

fn trace_step(iteration: usize, routed: f64, path: &FlowPath, amount: f64) {
    debug!("   iteration = {iteration}");
    debug!("      routed = {routed}");
    debug!("        path = {path}");
    debug!("     augment = {amount}");
    debug!("   path cost = {}", path.cost());
}

fn summary(net: &FlowNetwork, strategy: &str, demand: f64, met: bool) {
    info!("----------------------------------");
    info!("    strategy = {strategy}");
    info!("      demand = {demand}");
    info!(" routed flow = {}", net.total_flow());
    info!("  total cost = {}", net.total_cost());
    info!("  demand met = {met}");
}
