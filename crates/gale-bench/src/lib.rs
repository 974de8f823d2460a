//! Benchmark profiles for the Gale coupling framework.
//!
//! - [`reference_farm`]: a regular grid of turbines with prescribed inflow
//! - [`reference_counts`]: node counts of a finely resolved rotor
//! - [`rotor_geometry`]: force and sampling positions for those counts
//! - [`FrozenRotorFactory`]: solvers with fixed geometry and loads, so a
//!   step measures coupling overhead only

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use gale_core::{NodeCounts, StepId, TurbineDescriptor, Vec3};
use gale_engine::{CouplingConfig, InflowConfig, TurbineConfig};
use gale_solver::{
    Reported, RestartInfo, Severity, SolverError, SolverFactory, SolverInputs, SolverOutputs,
    SolverSetup, SolverStatus, TurbineSolver,
};

/// `n` turbines on a grid with 5-diameter spacing, stepping 0.01 s for
/// `steps` steps. No controller, no checkpoints within the run.
pub fn reference_farm(n: usize, steps: u64) -> CouplingConfig {
    let cols = (n as f64).sqrt().ceil().max(1.0) as usize;
    let turbines = (0..n)
        .map(|i| {
            let x = 630.0 * (i % cols) as f64;
            let y = 630.0 * (i / cols) as f64;
            TurbineConfig {
                turb_id: None,
                input_file: format!("turbine{i}.fst").into(),
                restart_file: format!("turbine{i}.chkp").into(),
                base_pos: [x, y, 0.0],
                hub_pos: [x, y, 90.0],
                force_pts_blade: 50,
                force_pts_tower: 20,
            }
        })
        .collect();
    CouplingConfig {
        turbines,
        t_start: 0.0,
        t_max: 0.01 * steps as f64,
        dt: 0.01,
        checkpoint_interval: steps + 1,
        abort_level: Severity::Fatal,
        dry_run: false,
        debug: false,
        debug_dir: None,
        allocation_report_dir: None,
        controller: Default::default(),
        num_inputs: 0,
        num_outputs: 0,
        inflow: InflowConfig::default(),
    }
}

/// Three blades of 50 force nodes and 200 sampling nodes, a tower of 20
/// force nodes and 40 sampling nodes.
pub fn reference_counts() -> NodeCounts {
    NodeCounts {
        num_blades: 3,
        force_pts_blade: 50,
        force_pts_tower: 20,
        vel_pts_blade: 200,
        vel_pts_tower: 40,
    }
}

/// Force and sampling node positions for `counts`: straight 63 m blades
/// in the plane `x = 0` around a hub at 90 m, tower along `z`.
pub fn rotor_geometry(counts: &NodeCounts) -> (Vec<Vec3>, Vec<Vec3>) {
    let points = |per_blade: usize, tower: usize| {
        let hub = [0.0, 0.0, 90.0];
        let mut pts = vec![hub];
        for b in 0..counts.num_blades {
            let theta = std::f64::consts::TAU * b as f64 / counts.num_blades as f64;
            for j in 0..per_blade {
                let r = 1.5 + 61.5 * j as f64 / (per_blade - 1).max(1) as f64;
                pts.push([0.0, r * theta.cos(), 90.0 + r * theta.sin()]);
            }
        }
        for j in 0..tower {
            pts.push([0.0, 0.0, 87.6 * j as f64 / (tower - 1).max(1) as f64]);
        }
        pts
    };
    (
        points(counts.force_pts_blade, counts.force_pts_tower),
        points(counts.vel_pts_blade, counts.vel_pts_tower),
    )
}

/// A solver whose geometry is [`rotor_geometry`] and whose loads never
/// change. Only the step counter advances.
pub struct FrozenRotor {
    counts: NodeCounts,
    step: u64,
    outputs: SolverOutputs,
    inputs: SolverInputs,
}

impl FrozenRotor {
    /// Sized for `turbine`'s force counts and the reference sampling counts.
    pub fn new(turbine: &TurbineDescriptor) -> Self {
        let reference = reference_counts();
        Self {
            counts: NodeCounts {
                force_pts_blade: turbine.force_pts_blade,
                force_pts_tower: turbine.force_pts_tower,
                ..reference
            },
            step: 0,
            outputs: SolverOutputs::default(),
            inputs: SolverInputs::default(),
        }
    }

    fn build(&mut self, setup: &SolverSetup<'_>) {
        self.outputs = SolverOutputs::zeroed(&self.counts, setup.n_controller_inputs);
        self.inputs = SolverInputs::zeroed(&self.counts, setup.n_controller_outputs);
        let (force, sample) = rotor_geometry(&self.counts);
        self.outputs.forces = force.iter().map(|p| [p[2] * 10.0, 0.0, 0.0]).collect();
        self.outputs.force_positions = force;
        self.outputs.vel_positions = sample;
        self.outputs
            .orientations
            .fill([0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        self.outputs.chord.fill(3.0);
    }
}

impl TurbineSolver for FrozenRotor {
    fn init(&mut self, setup: &SolverSetup<'_>) -> Reported<NodeCounts> {
        self.build(setup);
        Reported::ok(self.counts)
    }

    fn restart(&mut self, setup: &SolverSetup<'_>, _checkpoint: &Path) -> Reported<RestartInfo> {
        self.build(setup);
        Reported::ok(RestartInfo {
            step: StepId(self.step),
            counts: self.counts,
        })
    }

    fn advance_to_solution0(&mut self) -> SolverStatus {
        SolverStatus::ok()
    }

    fn step(&mut self) -> SolverStatus {
        self.step += 1;
        SolverStatus::ok()
    }

    fn write_checkpoint(&mut self, _root: Option<&Path>) -> SolverStatus {
        SolverStatus::ok()
    }

    fn end(&mut self) {}

    fn outputs(&self) -> &SolverOutputs {
        &self.outputs
    }

    fn inputs(&self) -> &SolverInputs {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut SolverInputs {
        &mut self.inputs
    }
}

/// Creates a [`FrozenRotor`] per turbine.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrozenRotorFactory;

impl SolverFactory for FrozenRotorFactory {
    fn create(&self, turbine: &TurbineDescriptor) -> Result<Box<dyn TurbineSolver>, SolverError> {
        Ok(Box::new(FrozenRotor::new(turbine)))
    }
}
