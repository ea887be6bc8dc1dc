#![no_std]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    rust_2018_idioms
)]
#![forbid(unsafe_code)]

//! Minimum-cost flow over capacitated directed networks whose edges are
//! opened in tranches: discrete capacity levels, each with its own unit cost
//! and a one-time activation cost.

extern crate alloc;

pub mod algo;

mod edge;
mod error;
mod network;
mod path;

pub use crate::edge::{EdgeView, RawTrancheEdge, Tranche, TrancheEdge};
pub use crate::error::Error;
pub use crate::network::FlowNetwork;
pub use crate::path::FlowPath;

/// Tolerance applied to every flow and cost comparison made by the searches,
/// the solve strategies and the validity checks.
pub const EPSILON: f64 = 1e-9;
