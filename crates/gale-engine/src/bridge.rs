//! Global controller bridge.
//!
//! Per step: compute outputs from the global input array, scatter each
//! local turbine's output row into its solver, and after the solvers step
//! gather every turbine's input row back into the global array. The
//! gather zero-fills the array, writes local rows and sums across the
//! owning ranks, so each row ends up holding exactly its owner's
//! contribution on every rank.

use gale_comm::Communicator;
use gale_controller::{Controller, SuperController};
use gale_core::StepId;

use crate::error::CouplerError;
use crate::exchange::LocalTurbine;

struct Active {
    sc: Box<dyn SuperController>,
    n_turbines: usize,
    n_inputs: usize,
    n_outputs: usize,
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

/// Owns the farm controller and its global input/output arrays.
///
/// Inactive when the controller is disabled or this rank is outside the
/// owning sub-group; every operation is then a no-op and no array is
/// allocated.
pub struct ControllerBridge {
    active: Option<Active>,
}

impl ControllerBridge {
    /// A bridge that does nothing.
    pub fn disabled() -> Self {
        Self { active: None }
    }

    /// Bridge for a farm of `n_turbines`. `participates` is whether this
    /// rank belongs to the owning sub-group.
    pub fn new(
        controller: Controller,
        n_turbines: usize,
        n_inputs: usize,
        n_outputs: usize,
        participates: bool,
    ) -> Self {
        let sc = match controller.into_dyn() {
            Some(sc) if participates => sc,
            _ => return Self::disabled(),
        };
        Self {
            active: Some(Active {
                sc,
                n_turbines,
                n_inputs,
                n_outputs,
                inputs: vec![0.0; n_turbines * n_inputs],
                outputs: vec![0.0; n_turbines * n_outputs],
            }),
        }
    }

    /// Whether the bridge does anything.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Global input array, one row per turbine.
    pub fn global_inputs(&self) -> Option<&[f64]> {
        self.active.as_ref().map(|a| a.inputs.as_slice())
    }

    /// Global output array, one row per turbine.
    pub fn global_outputs(&self) -> Option<&[f64]> {
        self.active.as_ref().map(|a| a.outputs.as_slice())
    }

    /// Initialise the controller for the farm.
    pub fn init(&mut self) -> Result<(), CouplerError> {
        if let Some(a) = &mut self.active {
            a.sc.init(a.n_turbines, a.n_inputs, a.n_outputs)?;
            tracing::info!(
                controller = a.sc.name(),
                n_turbines = a.n_turbines,
                "controller initialised"
            );
        }
        Ok(())
    }

    /// Initialise the controller and restore its state at `step`.
    pub fn restart(&mut self, step: StepId) -> Result<(), CouplerError> {
        self.init()?;
        if let Some(a) = &mut self.active {
            a.sc.read_restart(step)?;
        }
        Ok(())
    }

    /// Compute outputs and copy each local turbine's row into its solver.
    pub fn compute_and_scatter(&mut self, locals: &mut [LocalTurbine]) -> Result<(), CouplerError> {
        let Some(a) = &mut self.active else {
            return Ok(());
        };
        a.sc.compute_outputs(&a.inputs, &mut a.outputs)?;

        for t in locals.iter_mut() {
            let row = t.id().0 * a.n_outputs;
            t.solver
                .inputs_mut()
                .from_controller
                .copy_from_slice(&a.outputs[row..row + a.n_outputs]);
        }
        Ok(())
    }

    /// Rebuild the global input array from every rank's local rows.
    ///
    /// Collective over `group`.
    pub fn gather(&mut self, locals: &[LocalTurbine], group: &dyn Communicator) -> Result<(), CouplerError> {
        let Some(a) = &mut self.active else {
            return Ok(());
        };
        a.inputs.fill(0.0);
        for t in locals {
            let row = t.id().0 * a.n_inputs;
            a.inputs[row..row + a.n_inputs].copy_from_slice(&t.solver.outputs().to_controller);
        }
        group.all_reduce_sum(&mut a.inputs)?;
        Ok(())
    }

    /// Advance controller state with the gathered inputs.
    pub fn update_states(&mut self) -> Result<(), CouplerError> {
        if let Some(a) = &mut self.active {
            a.sc.update_states(&a.inputs)?;
        }
        Ok(())
    }

    /// Write the controller restart file for `step` if `is_root`.
    pub fn write_restart(&mut self, step: StepId, is_root: bool) -> Result<(), CouplerError> {
        if let (Some(a), true) = (&mut self.active, is_root) {
            a.sc.write_restart(step)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ControllerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.active {
            None => f.write_str("ControllerBridge(inactive)"),
            Some(a) => f
                .debug_struct("ControllerBridge")
                .field("controller", &a.sc.name())
                .field("n_turbines", &a.n_turbines)
                .field("n_inputs", &a.n_inputs)
                .field("n_outputs", &a.n_outputs)
                .finish(),
        }
    }
}
