use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::Deserialize;

use crate::error::Error;
use crate::EPSILON;

/// One capacity tranche of an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tranche {
    capacity: f64,
    unit_cost: f64,
    fixed_cost: f64,
}

impl Tranche {
    pub fn new(capacity: f64, unit_cost: f64, fixed_cost: f64) -> Result<Self, Error> {
        if !(capacity.is_finite() && unit_cost.is_finite() && fixed_cost.is_finite()) {
            Err(Error::NonFiniteValue)
        } else if capacity <= 0.0 {
            Err(Error::NonPositiveCapacity)
        } else {
            Ok(Self {
                capacity,
                unit_cost,
                fixed_cost,
            })
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }
}

/// A directed edge whose capacity is bought in tranches.
///
/// Flow fills the tranches in order. Each tranche charges its own unit cost
/// for the flow routed through it, plus a one-time fixed cost owed as soon as
/// flow crosses into it. The fixed cost is given back if the flow later
/// retreats below the tranche, so the incurred cost is a pure function of the
/// current flow.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawTrancheEdge")]
pub struct TrancheEdge {
    start: usize,
    end: usize,
    levels: Vec<Tranche>,
    flow: f64,
    opened: usize,
}

impl TrancheEdge {
    pub fn new(start: usize, end: usize, levels: Vec<Tranche>) -> Result<Self, Error> {
        if start == end {
            Err(Error::EdgeToSelf)
        } else if levels.is_empty() {
            Err(Error::EmptyTranches)
        } else {
            Ok(Self {
                start,
                end,
                levels,
                flow: 0.0,
                opened: 0,
            })
        }
    }

    /// Builds an edge from parallel per-tranche lists.
    pub fn from_levels(
        start: usize,
        end: usize,
        capacities: &[f64],
        unit_costs: &[f64],
        fixed_costs: &[f64],
    ) -> Result<Self, Error> {
        if capacities.len() != unit_costs.len() || capacities.len() != fixed_costs.len() {
            return Err(Error::MismatchedTranches);
        }
        let levels = capacities
            .iter()
            .zip(unit_costs)
            .zip(fixed_costs)
            .map(|((&capacity, &unit_cost), &fixed_cost)| {
                Tranche::new(capacity, unit_cost, fixed_cost)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(start, end, levels)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn levels(&self) -> &[Tranche] {
        &self.levels
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    /// Index of the deepest tranche the flow has entered, if any.
    pub fn active_tranche(&self) -> Option<usize> {
        self.opened.checked_sub(1)
    }

    pub fn total_capacity(&self) -> f64 {
        self.prefix_capacity(self.levels.len())
    }

    /// Combined capacity of the first `levels` tranches.
    fn prefix_capacity(&self, levels: usize) -> f64 {
        self.levels.iter().take(levels).map(|t| t.capacity).sum()
    }

    /// Number of tranches entered by `flow`.
    fn tranches_entered(&self, flow: f64) -> usize {
        let mut entered = 0;
        let mut boundary = 0.0;
        for level in &self.levels {
            if flow <= boundary + EPSILON {
                break;
            }
            boundary += level.capacity;
            entered += 1;
        }
        entered
    }

    /// Cost of holding `flow` units: per entered tranche, the units routed
    /// through it at its unit cost, plus its fixed cost.
    fn cost_at(&self, flow: f64) -> f64 {
        let mut cost = 0.0;
        let mut boundary = 0.0;
        for level in &self.levels {
            if flow <= boundary + EPSILON {
                break;
            }
            let used = (flow - boundary).min(level.capacity);
            cost += level.fixed_cost + used * level.unit_cost;
            boundary += level.capacity;
        }
        cost
    }

    pub fn incurred_cost(&self) -> f64 {
        self.cost_at(self.flow)
    }

    /// Capacity left within the tranches already entered. A fresh edge and
    /// an edge sitting exactly on a tranche boundary both report zero.
    pub fn residual_capacity(&self) -> f64 {
        (self.prefix_capacity(self.opened) - self.flow).max(0.0)
    }

    /// Capacity left if the first `levels` tranches were open.
    pub fn residual_through(&self, levels: usize) -> f64 {
        let levels = levels.min(self.levels.len());
        (self.prefix_capacity(levels) - self.flow).max(0.0)
    }

    /// Headroom immediately routable through this edge: the residual of the
    /// entered tranches, or the next tranche when sitting on a boundary.
    pub fn usable_capacity(&self) -> f64 {
        let residual = self.residual_capacity();
        if residual > EPSILON {
            residual
        } else {
            self.residual_through(self.opened + 1)
        }
    }

    /// Fixed cost owed before the next unit can be routed: zero inside an
    /// entered tranche, the next tranche's activation cost on a boundary,
    /// infinite once every tranche is exhausted.
    pub fn opening_cost(&self) -> f64 {
        if self.residual_capacity() > EPSILON {
            0.0
        } else {
            match self.levels.get(self.opened) {
                Some(level) => level.fixed_cost,
                None => f64::INFINITY,
            }
        }
    }

    /// Cost of routing `amount` additional units, infinite if they do not
    /// fit within the remaining tranches.
    pub fn marginal_cost(&self, amount: f64) -> f64 {
        if amount <= EPSILON {
            0.0
        } else if self.flow + amount > self.total_capacity() + EPSILON {
            f64::INFINITY
        } else {
            self.cost_at(self.flow + amount) - self.cost_at(self.flow)
        }
    }

    /// Adjusts the flow by `delta`; negative values cancel committed flow.
    /// Callers derive `delta` from a path search, so driving the flow out of
    /// bounds is a logic error.
    pub(crate) fn augment(&mut self, delta: f64) {
        let next = self.flow + delta;
        debug_assert!(
            next >= -EPSILON,
            "bug: cancelled more flow than the edge carries"
        );
        debug_assert!(
            next <= self.total_capacity() + EPSILON,
            "bug: pushed flow past the last tranche"
        );
        self.flow = next.max(0.0).min(self.total_capacity());
        self.opened = self.tranches_entered(self.flow);
    }

    /// Flow within the tranche bounds and the bookkeeping in sync with it.
    pub fn is_valid(&self) -> bool {
        self.flow >= -EPSILON
            && self.flow <= self.total_capacity() + EPSILON
            && self.opened == self.tranches_entered(self.flow)
    }
}

/// Serde-facing form of [`TrancheEdge`] with `;`-separated per-tranche
/// lists, e.g. capacities `"3;3"`, unit costs `"1;5"`, fixed costs `"0;10"`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawTrancheEdge {
    pub start: usize,
    pub end: usize,
    pub capacities: String,
    pub unit_costs: String,
    pub fixed_costs: String,
}

fn parse_levels(list: &str) -> Result<Vec<f64>, Error> {
    list.split(';')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::InvalidTrancheList(list.to_string()))
}

impl TryFrom<RawTrancheEdge> for TrancheEdge {
    type Error = Error;

    fn try_from(e: RawTrancheEdge) -> Result<Self, Self::Error> {
        let capacities = parse_levels(&e.capacities)?;
        let unit_costs = parse_levels(&e.unit_costs)?;
        let fixed_costs = parse_levels(&e.fixed_costs)?;
        Self::from_levels(e.start, e.end, &capacities, &unit_costs, &fixed_costs)
    }
}

/// Read-only view of one direction of an edge pair.
///
/// The forward view reads the tranche edge as stored. The reverse view is
/// derived on the fly: it can carry up to the partner's committed flow, and
/// routing through it refunds the partner's cost over that slice. Reverse
/// views report no flow and no incurred cost of their own, so network totals
/// count each pair exactly once.
#[derive(Clone, Copy, Debug)]
pub enum EdgeView<'a> {
    Forward(&'a TrancheEdge),
    Reverse(&'a TrancheEdge),
}

impl EdgeView<'_> {
    pub fn start(&self) -> usize {
        match self {
            Self::Forward(e) => e.start,
            Self::Reverse(e) => e.end,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Self::Forward(e) => e.end,
            Self::Reverse(e) => e.start,
        }
    }

    pub fn flow(&self) -> f64 {
        match self {
            Self::Forward(e) => e.flow,
            Self::Reverse(_) => 0.0,
        }
    }

    pub fn incurred_cost(&self) -> f64 {
        match self {
            Self::Forward(e) => e.incurred_cost(),
            Self::Reverse(_) => 0.0,
        }
    }

    pub fn residual_capacity(&self) -> f64 {
        match self {
            Self::Forward(e) => e.residual_capacity(),
            Self::Reverse(e) => e.flow,
        }
    }

    pub fn residual_through(&self, levels: usize) -> f64 {
        match self {
            Self::Forward(e) => e.residual_through(levels),
            Self::Reverse(e) => e.flow,
        }
    }

    pub fn usable_capacity(&self) -> f64 {
        match self {
            Self::Forward(e) => e.usable_capacity(),
            Self::Reverse(e) => e.flow,
        }
    }

    /// Fixed cost owed before the next unit can be routed this way.
    /// Cancelling committed flow opens nothing, so a loaded reverse view is
    /// free and an empty one is unusable.
    pub fn opening_cost(&self) -> f64 {
        match self {
            Self::Forward(e) => e.opening_cost(),
            Self::Reverse(e) => {
                if e.flow > EPSILON {
                    0.0
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Cost of routing `amount` more units this way. On a reverse view this
    /// is the partner's refund for its top `amount` units, never positive.
    pub fn marginal_cost(&self, amount: f64) -> f64 {
        match self {
            Self::Forward(e) => e.marginal_cost(amount),
            Self::Reverse(e) => {
                if amount <= EPSILON {
                    0.0
                } else if amount > e.flow + EPSILON {
                    f64::INFINITY
                } else {
                    e.cost_at((e.flow - amount).max(0.0)) - e.cost_at(e.flow)
                }
            }
        }
    }

    pub fn active_tranche(&self) -> Option<usize> {
        match self {
            Self::Forward(e) | Self::Reverse(e) => e.active_tranche(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn edge(capacities: &[f64], unit_costs: &[f64], fixed_costs: &[f64]) -> TrancheEdge {
        TrancheEdge::from_levels(0, 1, capacities, unit_costs, fixed_costs).unwrap()
    }

    #[test]
    fn rejects_malformed_edges() {
        assert_eq!(
            TrancheEdge::from_levels(2, 2, &[1.0], &[0.0], &[0.0]),
            Err(Error::EdgeToSelf)
        );
        assert_eq!(
            TrancheEdge::from_levels(0, 1, &[], &[], &[]),
            Err(Error::EmptyTranches)
        );
        assert_eq!(
            TrancheEdge::from_levels(0, 1, &[1.0, 2.0], &[0.0], &[0.0]),
            Err(Error::MismatchedTranches)
        );
        assert_eq!(
            TrancheEdge::from_levels(0, 1, &[0.0], &[1.0], &[0.0]),
            Err(Error::NonPositiveCapacity)
        );
        assert_eq!(
            TrancheEdge::from_levels(0, 1, &[1.0], &[f64::NAN], &[0.0]),
            Err(Error::NonFiniteValue)
        );
    }

    #[test]
    fn fresh_edge_sits_on_the_first_boundary() {
        let e = edge(&[3.0, 3.0], &[1.0, 5.0], &[0.5, 10.0]);
        assert_eq!(e.active_tranche(), None);
        assert_abs_diff_eq!(e.residual_capacity(), 0.0);
        assert_abs_diff_eq!(e.usable_capacity(), 3.0);
        assert_abs_diff_eq!(e.opening_cost(), 0.5);
        assert_abs_diff_eq!(e.incurred_cost(), 0.0);
    }

    #[test]
    fn costs_follow_the_tranches() {
        let mut e = edge(&[3.0, 3.0], &[1.0, 5.0], &[0.0, 10.0]);
        assert_abs_diff_eq!(e.marginal_cost(3.0), 3.0);
        assert_abs_diff_eq!(e.marginal_cost(5.0), 23.0);
        assert!(e.marginal_cost(6.5).is_infinite());

        e.augment(3.0);
        assert_eq!(e.active_tranche(), Some(0));
        assert_abs_diff_eq!(e.incurred_cost(), 3.0);
        assert_abs_diff_eq!(e.residual_capacity(), 0.0);
        assert_abs_diff_eq!(e.usable_capacity(), 3.0);
        assert_abs_diff_eq!(e.opening_cost(), 10.0);
        assert_abs_diff_eq!(e.marginal_cost(2.0), 20.0);
    }

    #[test]
    fn augmentation_tracks_entered_tranches() {
        let mut e = edge(&[3.0, 3.0], &[1.0, 5.0], &[0.0, 10.0]);
        e.augment(4.0);
        assert_eq!(e.active_tranche(), Some(1));
        assert_abs_diff_eq!(e.incurred_cost(), 18.0);
        assert!(e.is_valid());

        e.augment(-4.0);
        assert_eq!(e.active_tranche(), None);
        assert_abs_diff_eq!(e.flow(), 0.0);
        assert_abs_diff_eq!(e.incurred_cost(), 0.0);
        assert!(e.is_valid());
    }

    #[test]
    fn reverse_view_prices_the_refund() {
        let mut e = edge(&[3.0, 3.0], &[1.0, 5.0], &[0.0, 10.0]);
        e.augment(4.0);
        let view = EdgeView::Reverse(&e);

        assert_eq!(view.start(), 1);
        assert_eq!(view.end(), 0);
        assert_abs_diff_eq!(view.flow(), 0.0);
        assert_abs_diff_eq!(view.incurred_cost(), 0.0);
        assert_abs_diff_eq!(view.residual_capacity(), 4.0);
        assert_abs_diff_eq!(view.usable_capacity(), 4.0);
        assert_abs_diff_eq!(view.opening_cost(), 0.0);
        assert_abs_diff_eq!(view.marginal_cost(2.0), -16.0);
        assert!(view.marginal_cost(5.0).is_infinite());
    }

    #[test]
    fn empty_reverse_view_is_unusable() {
        let e = edge(&[3.0], &[1.0], &[2.0]);
        let view = EdgeView::Reverse(&e);
        assert_abs_diff_eq!(view.usable_capacity(), 0.0);
        assert!(view.opening_cost().is_infinite());
        assert!(view.marginal_cost(1.0).is_infinite());
    }

    #[test]
    fn parses_raw_tranche_lists() {
        let raw = RawTrancheEdge {
            start: 0,
            end: 1,
            capacities: "3;3".into(),
            unit_costs: "1; 5".into(),
            fixed_costs: "0;10".into(),
        };
        let e = TrancheEdge::try_from(raw).unwrap();
        assert_abs_diff_eq!(e.total_capacity(), 6.0);
        assert_abs_diff_eq!(e.marginal_cost(5.0), 23.0);

        // The lists zip positionally into the levels.
        let levels = e.levels();
        assert_eq!(levels.len(), 2);
        assert_abs_diff_eq!(levels[1].capacity(), 3.0);
        assert_abs_diff_eq!(levels[1].unit_cost(), 5.0);
        assert_abs_diff_eq!(levels[1].fixed_cost(), 10.0);
    }

    #[test]
    fn rejects_malformed_tranche_lists() {
        let raw = RawTrancheEdge {
            start: 0,
            end: 1,
            capacities: "3;x".into(),
            unit_costs: "1;5".into(),
            fixed_costs: "0;10".into(),
        };
        assert_eq!(
            TrancheEdge::try_from(raw),
            Err(Error::InvalidTrancheList("3;x".into()))
        );
    }
}
