//! Per-step timing for the coupling loop.

use gale_core::TurbineId;

/// Wall-clock timings of one coupling step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Whole step.
    pub total_us: u64,
    /// Controller output computation and scatter.
    pub controller_us: u64,
    /// Per-turbine input write and solver step: `(turbine, microseconds)`.
    pub turbine_us: Vec<(TurbineId, u64)>,
    /// Controller gather (including the reduction) and state update.
    pub gather_us: u64,
    /// Solver and controller checkpoint writes.
    pub checkpoint_us: u64,
}

impl StepMetrics {
    /// Sum of the per-turbine times.
    pub fn solver_us(&self) -> u64 {
        self.turbine_us.iter().map(|(_, us)| us).sum()
    }
}
