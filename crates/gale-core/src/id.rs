//! Strongly-typed identifiers.
//!
//! Global turbine indices, process-local indices and process ranks are all
//! plain `usize` underneath. Keeping them as distinct newtypes means the
//! compiler rejects the global/local mix-ups that the ownership tables
//! exist to prevent.

use std::fmt;

/// Global index of a turbine, dense in `0..n_turbines`.
///
/// Assigned in configuration order and identical on every process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurbineId(pub usize);

impl fmt::Display for TurbineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for TurbineId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Process-relative index of a locally owned turbine.
///
/// Dense in `0..n_local` on each process, in ascending global order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalIndex(pub usize);

impl fmt::Display for LocalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for LocalIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Rank of a process within a communication group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub usize);

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Rank {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Global simulation step counter.
///
/// Step `n` corresponds to simulated time `n * dt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// The following step.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_id_next_increments() {
        assert_eq!(StepId(41).next(), StepId(42));
    }

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(TurbineId(3).to_string(), "3");
        assert_eq!(LocalIndex(0).to_string(), "0");
        assert_eq!(Rank(7).to_string(), "7");
        assert_eq!(StepId(100).to_string(), "100");
    }

    #[test]
    fn ids_order_numerically() {
        let mut ids = vec![TurbineId(2), TurbineId(0), TurbineId(1)];
        ids.sort();
        assert_eq!(ids, vec![TurbineId(0), TurbineId(1), TurbineId(2)]);
    }
}
