use alloc::string::String;

use displaydoc::Display;

/// Errors raised while assembling a flow network.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Error {
    /// Invalid edge where start and end are the same node
    EdgeToSelf,
    /// Invalid edge with no tranches
    EmptyTranches,
    /// Invalid edge where the per-tranche lists have different lengths
    MismatchedTranches,
    /// Invalid tranche capacity, expected positive value
    NonPositiveCapacity,
    /// Invalid tranche value, expected finite number
    NonFiniteValue,
    /// Edge endpoint {0} is outside the node range
    NodeOutOfRange(usize),
    /// Duplicate or antiparallel edge between nodes {0} and {1}
    DuplicateEdge(usize, usize),
    /// A network needs a source and a distinct sink
    TooFewNodes,
    /// Malformed tranche list `{0}`
    InvalidTrancheList(String),
}
