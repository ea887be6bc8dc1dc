use alloc::vec;
use alloc::vec::Vec;

use itertools::Itertools;
use petgraph::graph::NodeIndex;

use crate::algo::SolveError;
use crate::edge::EdgeView;
use crate::network::FlowNetwork;
use crate::path::FlowPath;
use crate::EPSILON;

/// Bellman-Ford relaxation state over the network's residual arcs.
struct Relaxation {
    dist: Vec<f64>,
    pred: Vec<Option<NodeIndex>>,
}

impl Relaxation {
    /// Settles shortest distances from the source under `weight`, or reports
    /// the negative cycle that keeps them from settling.
    ///
    /// Arcs whose weight is not finite are unusable and never relax, so an
    /// exhausted edge cannot poison the distances of nodes behind it.
    fn run<W>(net: &FlowNetwork, weight: W) -> Result<Self, SolveError>
    where
        W: Fn(EdgeView<'_>) -> f64,
    {
        let nodes = net.node_count();
        let mut state = Relaxation {
            dist: vec![f64::INFINITY; nodes],
            pred: vec![None; nodes],
        };
        state.dist[net.source().index()] = 0.0;

        for _ in 0..nodes {
            if !state.relax_pass(net, &weight) {
                break;
            }
        }

        // One more material improvement after n full passes means the
        // distances never settle.
        let mut offender = None;
        for (start, end, view) in net.arcs() {
            if let Some(candidate) = state.candidate(start, view, &weight) {
                if candidate + EPSILON < state.dist[end.index()] {
                    state.dist[end.index()] = candidate;
                    state.pred[end.index()] = Some(start);
                    offender = Some(end);
                    break;
                }
            }
        }
        if let Some(seed) = offender {
            return Err(SolveError::NegativeCycle(state.cycle_from(net, seed)));
        }
        Ok(state)
    }

    fn candidate<W>(&self, start: NodeIndex, view: EdgeView<'_>, weight: &W) -> Option<f64>
    where
        W: Fn(EdgeView<'_>) -> f64,
    {
        let from = self.dist[start.index()];
        if !from.is_finite() {
            return None;
        }
        let w = weight(view);
        if !w.is_finite() {
            return None;
        }
        Some(from + w)
    }

    fn relax_pass<W>(&mut self, net: &FlowNetwork, weight: &W) -> bool
    where
        W: Fn(EdgeView<'_>) -> f64,
    {
        let mut changed = false;
        for (start, end, view) in net.arcs() {
            if let Some(candidate) = self.candidate(start, view, weight) {
                if candidate + EPSILON < self.dist[end.index()] {
                    self.dist[end.index()] = candidate;
                    self.pred[end.index()] = Some(start);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Walks the predecessors back from `end` to the source.
    fn path_to(&self, net: &FlowNetwork, end: NodeIndex) -> Vec<NodeIndex> {
        let nodes = net.node_count();
        let mut path = vec![end];
        let mut at = end;
        while at != net.source() {
            at = self.pred[at.index()].expect("bug: settled node has no predecessor");
            path.push(at);
            assert!(
                path.len() <= nodes,
                "bug: predecessor walk does not reach the source"
            );
        }
        path.reverse();
        path
    }

    /// Lands inside the cycle by walking `n` predecessor steps from `seed`,
    /// then collects one full lap.
    fn cycle_from(&self, net: &FlowNetwork, seed: NodeIndex) -> Vec<usize> {
        let walk =
            |at: NodeIndex| self.pred[at.index()].expect("bug: negative-cycle walk left the tree");

        let mut at = seed;
        for _ in 0..net.node_count() {
            at = walk(at);
        }
        let entry = at;
        let mut cycle = vec![entry.index()];
        at = walk(entry);
        while at != entry {
            cycle.push(at.index());
            at = walk(at);
        }
        cycle.reverse();
        cycle
    }
}

/// Finds the cheapest source-to-sink path by fixed opening costs.
///
/// Each arc weighs the fixed cost owed before its next unit can flow, so the
/// search prefers routes that are already open. The returned path carries
/// its bottleneck, the smallest immediately usable headroom along the way,
/// priced at each arc's marginal cost for that amount.
///
/// Returns `Ok(None)` when the sink is unreachable; a negative cycle in the
/// opening costs is an error carrying the cycle's nodes.
pub fn find_cheapest_path(net: &FlowNetwork) -> Result<Option<FlowPath>, SolveError> {
    let relaxation = Relaxation::run(net, |view: EdgeView<'_>| view.opening_cost())?;
    if !relaxation.dist[net.sink().index()].is_finite() {
        return Ok(None);
    }

    let nodes = relaxation.path_to(net, net.sink());
    let mut bottleneck = f64::INFINITY;
    for (start, end) in nodes.iter().tuple_windows() {
        let view = net
            .view_between(*start, *end)
            .expect("bug: found path uses a missing arc");
        bottleneck = bottleneck.min(view.usable_capacity());
    }
    if bottleneck <= EPSILON {
        return Ok(None);
    }

    let mut cost = 0.0;
    for (start, end) in nodes.iter().tuple_windows() {
        let view = net
            .view_between(*start, *end)
            .expect("bug: found path uses a missing arc");
        cost += view.marginal_cost(bottleneck);
    }
    Ok(Some(FlowPath::new(nodes, cost, bottleneck)))
}

/// Finds the cheapest source-to-sink path able to carry `amount`, by
/// marginal cost. Arcs that cannot take the full amount price at infinity
/// and drop out, so a sink left unpriced means no route carries it.
pub fn find_cheapest_path_for(
    net: &FlowNetwork,
    amount: f64,
) -> Result<Option<FlowPath>, SolveError> {
    let relaxation = Relaxation::run(net, |view: EdgeView<'_>| view.marginal_cost(amount))?;
    let sink_cost = relaxation.dist[net.sink().index()];
    if !sink_cost.is_finite() {
        return Ok(None);
    }
    let nodes = relaxation.path_to(net, net.sink());
    Ok(Some(FlowPath::new(nodes, sink_cost, amount)))
}
