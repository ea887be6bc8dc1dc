use alloc::vec::Vec;

use displaydoc::Display;

pub mod search;
pub mod solve;

/// Errors surfaced by the path searches.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum SolveError {
    /// Negative-cost cycle through nodes {0:?}
    NegativeCycle(Vec<usize>),
}
