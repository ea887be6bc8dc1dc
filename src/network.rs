use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use itertools::Itertools;
use num_traits::float::FloatCore;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::edge::{EdgeView, TrancheEdge};
use crate::error::Error;
use crate::EPSILON;

/// Which side of an edge pair an arc reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Orientation {
    Forward,
    Reverse,
}

/// Arc payload: an index into the edge arena plus the side it reads.
#[derive(Clone, Copy, Debug)]
struct EdgeSlot {
    pair: usize,
    orientation: Orientation,
}

/// A directed flow network with tranche-structured edges.
///
/// Nodes are `0..n`; node `0` is the source and `n - 1` the sink. Every
/// tranche edge is stored once in an arena and the graph carries two arcs
/// per edge, the forward slot and the derived reverse slot, so path searches
/// see the full residual topology. The topology is fixed at construction;
/// only the per-edge flow changes, and only through augmentation.
pub struct FlowNetwork {
    graph: DiGraph<(), EdgeSlot>,
    edges: Vec<TrancheEdge>,
}

impl FlowNetwork {
    pub fn new(nodes: usize, edges: Vec<TrancheEdge>) -> Result<Self, Error> {
        if nodes < 2 {
            return Err(Error::TooFewNodes);
        }
        let mut seen = BTreeSet::new();
        for edge in &edges {
            if edge.start() >= nodes {
                return Err(Error::NodeOutOfRange(edge.start()));
            }
            if edge.end() >= nodes {
                return Err(Error::NodeOutOfRange(edge.end()));
            }
            // The opposite direction is always the paired reverse slot, so an
            // antiparallel edge counts as a duplicate.
            let low = edge.start().min(edge.end());
            let high = edge.start().max(edge.end());
            if !seen.insert((low, high)) {
                return Err(Error::DuplicateEdge(edge.start(), edge.end()));
            }
        }

        let mut graph = DiGraph::new();
        for _ in 0..nodes {
            graph.add_node(());
        }
        for (pair, edge) in edges.iter().enumerate() {
            let start = NodeIndex::new(edge.start());
            let end = NodeIndex::new(edge.end());
            graph.add_edge(
                start,
                end,
                EdgeSlot {
                    pair,
                    orientation: Orientation::Forward,
                },
            );
            graph.add_edge(
                end,
                start,
                EdgeSlot {
                    pair,
                    orientation: Orientation::Reverse,
                },
            );
        }
        Ok(Self { graph, edges })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn source(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    pub fn sink(&self) -> NodeIndex {
        NodeIndex::new(self.graph.node_count() - 1)
    }

    /// The tranche edges in insertion order.
    pub fn tranche_edges(&self) -> &[TrancheEdge] {
        &self.edges
    }

    fn view(&self, slot: EdgeSlot) -> EdgeView<'_> {
        let edge = &self.edges[slot.pair];
        match slot.orientation {
            Orientation::Forward => EdgeView::Forward(edge),
            Orientation::Reverse => EdgeView::Reverse(edge),
        }
    }

    /// View of the arc from `start` to `end`, if present.
    pub fn view_between(&self, start: NodeIndex, end: NodeIndex) -> Option<EdgeView<'_>> {
        self.graph
            .find_edge(start, end)
            .map(|arc| self.view(self.graph[arc]))
    }

    /// Views of every arc leaving `node`, reverse slots included.
    pub fn views_from<'a>(&'a self, node: NodeIndex) -> impl Iterator<Item = EdgeView<'a>> + 'a {
        self.graph
            .edges(node)
            .map(move |arc| self.view(*arc.weight()))
    }

    /// Every arc of the residual topology with its endpoints.
    pub(crate) fn arcs<'a>(
        &'a self,
    ) -> impl Iterator<Item = (NodeIndex, NodeIndex, EdgeView<'a>)> + 'a {
        self.graph
            .edge_references()
            .map(move |arc| (arc.source(), arc.target(), self.view(*arc.weight())))
    }

    /// Total flow leaving the source.
    pub fn total_flow(&self) -> f64 {
        self.views_from(self.source()).map(|view| view.flow()).sum()
    }

    /// Total cost incurred across all edges at their current flow.
    pub fn total_cost(&self) -> f64 {
        self.edges.iter().map(TrancheEdge::incurred_cost).sum()
    }

    /// Pushes `amount` along `nodes`, an arc chain from the search. Forward
    /// slots gain flow; reverse slots cancel it on their partner.
    ///
    /// Amounts come from a path search, so a node pair without an arc or an
    /// over-driven edge is a logic error.
    pub fn augment_along_path(&mut self, nodes: &[NodeIndex], amount: f64) {
        for (start, end) in nodes.iter().tuple_windows() {
            let arc = self
                .graph
                .find_edge(*start, *end)
                .expect("bug: augmenting path uses a missing arc");
            let slot = self.graph[arc];
            let delta = match slot.orientation {
                Orientation::Forward => amount,
                Orientation::Reverse => -amount,
            };
            self.edges[slot.pair].augment(delta);
        }
    }

    /// Checks every edge against its tranche bounds, conservation of flow at
    /// every interior node, and that the source sends what the sink receives.
    pub fn is_valid(&self) -> bool {
        for edge in &self.edges {
            if !edge.is_valid() {
                log::debug!(
                    "edge {} -> {} broke its tranche bounds at flow {}",
                    edge.start(),
                    edge.end(),
                    edge.flow()
                );
                return false;
            }
        }

        let nodes = self.graph.node_count();
        let mut inflow = vec![0.0f64; nodes];
        let mut outflow = vec![0.0f64; nodes];
        for edge in &self.edges {
            outflow[edge.start()] += edge.flow();
            inflow[edge.end()] += edge.flow();
        }
        for node in 1..nodes - 1 {
            if FloatCore::abs(inflow[node] - outflow[node]) > EPSILON {
                log::debug!(
                    "node {node} leaks flow: {} in, {} out",
                    inflow[node],
                    outflow[node]
                );
                return false;
            }
        }

        let sent = outflow[0] - inflow[0];
        let received = inflow[nodes - 1] - outflow[nodes - 1];
        if FloatCore::abs(sent - received) > EPSILON {
            log::debug!("source sends {sent} but sink receives {received}");
            return false;
        }
        true
    }
}

impl fmt::Display for FlowNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "flow network: {} nodes, {} edges",
            self.node_count(),
            self.edges.len()
        )?;
        for edge in &self.edges {
            writeln!(
                f,
                "  {} -> {}: flow {} of {}, cost {}",
                edge.start(),
                edge.end(),
                edge.flow(),
                edge.total_capacity(),
                edge.incurred_cost()
            )?;
        }
        write!(
            f,
            "  total flow {}, total cost {}",
            self.total_flow(),
            self.total_cost()
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn plain_edge(start: usize, end: usize, capacity: f64) -> TrancheEdge {
        TrancheEdge::from_levels(start, end, &[capacity], &[1.0], &[0.0]).unwrap()
    }

    fn chain() -> FlowNetwork {
        let edges = vec![plain_edge(0, 1, 5.0), plain_edge(1, 2, 5.0)];
        FlowNetwork::new(3, edges).unwrap()
    }

    fn path(nodes: &[usize]) -> Vec<NodeIndex> {
        nodes.iter().map(|&n| NodeIndex::new(n)).collect()
    }

    #[test]
    fn rejects_malformed_networks() {
        assert!(matches!(
            FlowNetwork::new(1, vec![]),
            Err(Error::TooFewNodes)
        ));
        assert!(matches!(
            FlowNetwork::new(2, vec![plain_edge(0, 3, 1.0)]),
            Err(Error::NodeOutOfRange(3))
        ));
        assert!(matches!(
            FlowNetwork::new(2, vec![plain_edge(0, 1, 1.0), plain_edge(1, 0, 1.0)]),
            Err(Error::DuplicateEdge(1, 0))
        ));
    }

    #[test]
    fn totals_follow_augmentation() {
        let mut net = chain();
        net.augment_along_path(&path(&[0, 1, 2]), 2.0);
        assert_abs_diff_eq!(net.total_flow(), 2.0);
        assert_abs_diff_eq!(net.total_cost(), 4.0);
        assert!(net.is_valid());
    }

    #[test]
    fn reverse_slots_cancel_flow() {
        let mut net = chain();
        net.augment_along_path(&path(&[0, 1, 2]), 2.0);
        net.augment_along_path(&path(&[2, 1, 0]), 1.0);
        assert_abs_diff_eq!(net.total_flow(), 1.0);
        assert!(net.is_valid());

        let forward = net
            .view_between(NodeIndex::new(0), NodeIndex::new(1))
            .unwrap();
        assert_abs_diff_eq!(forward.flow(), 1.0);
        let reverse = net
            .view_between(NodeIndex::new(1), NodeIndex::new(0))
            .unwrap();
        assert_abs_diff_eq!(reverse.usable_capacity(), 1.0);
    }

    #[test]
    fn leaking_interior_node_is_invalid() {
        let mut net = chain();
        net.augment_along_path(&path(&[0, 1]), 2.0);
        assert!(!net.is_valid());
    }
}
