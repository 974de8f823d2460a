//! The [`TurbineSolver`] and [`SolverFactory`] traits.

use std::path::Path;

use gale_core::{NodeCounts, StepId, TurbineDescriptor};

use crate::buffers::{SolverInputs, SolverOutputs};
use crate::error::SolverError;
use crate::status::{Reported, SolverStatus};

/// Run-wide parameters handed to a solver at init or restart.
#[derive(Clone, Copy, Debug)]
pub struct SolverSetup<'a> {
    /// The turbine this solver advances.
    pub turbine: &'a TurbineDescriptor,
    /// End time of the run, in seconds.
    pub t_max: f64,
    /// Coupling time step, in seconds.
    pub dt: f64,
    /// Length of this turbine's controller input row.
    pub n_controller_inputs: usize,
    /// Length of this turbine's controller output row.
    pub n_controller_outputs: usize,
}

/// State recovered from a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartInfo {
    /// Step the checkpoint was written at.
    pub step: StepId,
    /// Node counts of the restored turbine.
    pub counts: NodeCounts,
}

/// One turbine's structural/aero-elastic solver.
///
/// # Contract
///
/// - Exactly one of [`init`](Self::init) or [`restart`](Self::restart) is
///   called before any other entry point.
/// - After init or restart, [`outputs`](Self::outputs) and
///   [`inputs`](Self::inputs) are sized for the returned node counts.
/// - [`end`](Self::end) is called once; no call follows it.
///
/// # Object safety
///
/// The coordinator stores solvers as `Box<dyn TurbineSolver>`.
pub trait TurbineSolver: Send {
    /// Cold-start the solver and report its node counts.
    fn init(&mut self, setup: &SolverSetup<'_>) -> Reported<NodeCounts>;

    /// Restore state from the checkpoint rooted at `checkpoint`.
    fn restart(&mut self, setup: &SolverSetup<'_>, checkpoint: &Path) -> Reported<RestartInfo>;

    /// Solve for the initial state once time-zero inputs are in place.
    fn advance_to_solution0(&mut self) -> SolverStatus;

    /// Advance by one coupling step using the current inputs.
    fn step(&mut self) -> SolverStatus;

    /// Write a checkpoint. `None` lets the solver choose the file name.
    fn write_checkpoint(&mut self, root: Option<&Path>) -> SolverStatus;

    /// Release solver resources.
    fn end(&mut self);

    /// Buffers published by the solver.
    fn outputs(&self) -> &SolverOutputs;

    /// Buffers the solver will read on its next call.
    fn inputs(&self) -> &SolverInputs;

    /// Mutable access to the input buffers.
    fn inputs_mut(&mut self) -> &mut SolverInputs;
}

/// Creates solver instances for locally owned turbines.
pub trait SolverFactory {
    /// Create an uninitialised solver for `turbine`.
    fn create(&self, turbine: &TurbineDescriptor) -> Result<Box<dyn TurbineSolver>, SolverError>;
}
