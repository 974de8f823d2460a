//! Flat per-node buffers exchanged with a turbine solver.
//!
//! Arrays are parallel and indexed by node position in the fixed node
//! ordering: hub, then each blade root to tip, then the tower bottom to
//! top.

use gale_core::{NodeCounts, Orientation, Vec3};

/// Data the solver publishes after each call.
///
/// Forces and moments are stored in the solver's convention: the load
/// acting on the structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolverOutputs {
    /// Velocity sampling node positions.
    pub vel_positions: Vec<Vec3>,
    /// Force node positions.
    pub force_positions: Vec<Vec3>,
    /// Force at each force node.
    pub forces: Vec<Vec3>,
    /// Moment at each force node.
    pub moments: Vec<Vec3>,
    /// Row-major direction cosine matrix at each force node.
    pub orientations: Vec<Orientation>,
    /// Chord (blades) or diameter (tower) at each force node.
    pub chord: Vec<f64>,
    /// This turbine's row of the global controller input array.
    pub to_controller: Vec<f64>,
}

impl SolverOutputs {
    /// Zeroed buffers sized for `counts`.
    pub fn zeroed(counts: &NodeCounts, n_controller_inputs: usize) -> Self {
        let nf = counts.force_layout().len();
        let nv = counts.velocity_layout().len();
        Self {
            vel_positions: vec![[0.0; 3]; nv],
            force_positions: vec![[0.0; 3]; nf],
            forces: vec![[0.0; 3]; nf],
            moments: vec![[0.0; 3]; nf],
            orientations: vec![[0.0; 9]; nf],
            chord: vec![0.0; nf],
            to_controller: vec![0.0; n_controller_inputs],
        }
    }
}

/// Data the coordinator writes before each solver call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolverInputs {
    /// Inflow velocity at each velocity sampling node.
    pub velocities: Vec<Vec3>,
    /// This turbine's row of the global controller output array.
    pub from_controller: Vec<f64>,
}

impl SolverInputs {
    /// Zeroed buffers sized for `counts`.
    pub fn zeroed(counts: &NodeCounts, n_controller_outputs: usize) -> Self {
        Self {
            velocities: vec![[0.0; 3]; counts.velocity_layout().len()],
            from_controller: vec![0.0; n_controller_outputs],
        }
    }
}
