use alloc::vec::Vec;
use core::fmt;

use petgraph::graph::NodeIndex;

/// An augmenting path from source to sink, with the flow it can carry and
/// the cost of carrying it.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowPath {
    nodes: Vec<NodeIndex>,
    cost: f64,
    flow: f64,
}

impl FlowPath {
    pub(crate) fn new(nodes: Vec<NodeIndex>, cost: f64, flow: f64) -> Self {
        Self { nodes, cost, flow }
    }

    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    /// Flow gained per unit of cost. A free path quotes `+inf` and beats
    /// everything; an empty quote divides zero by zero and loses every `>`
    /// comparison.
    pub fn flow_per_cost(&self) -> f64 {
        self.flow / self.cost
    }
}

impl fmt::Display for FlowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for node in &self.nodes {
            write!(f, "{sep}{}", node.index())?;
            sep = " -> ";
        }
        write!(f, " (flow {}, cost {})", self.flow, self.cost)
    }
}
