//! Scripted per-turbine solver.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gale_core::{NodeCounts, StepId, TurbineDescriptor, TurbineId, Vec3};
use gale_solver::{
    Reported, RestartInfo, SolverError, SolverFactory, SolverInputs, SolverOutputs, SolverSetup,
    SolverStatus, TurbineSolver,
};

/// Orientation written at every force node: row 1 is the shaft axis `+x`.
pub const MOCK_ORIENTATION: [f64; 9] = [0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];

/// Distance from the hub centre to each blade root.
pub const ROOT_OFFSET: f64 = 1.5;

/// One call observed by a [`MockTurbineSolver`].
#[derive(Clone, Debug, PartialEq)]
pub enum SolverCall {
    Init,
    Restart { checkpoint: PathBuf },
    Solution0 { inputs: SolverInputs },
    Step { step: u64, inputs: SolverInputs },
    Checkpoint { step: u64 },
    End,
}

/// Entry points a failure can be scripted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Init,
    Restart,
    Solution0,
    Step,
    Checkpoint,
}

/// Shared, cloneable log of `(turbine, call)` pairs.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Arc<Mutex<Vec<(TurbineId, SolverCall)>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, turbine: TurbineId, call: SolverCall) {
        self.0.lock().unwrap().push((turbine, call));
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<(TurbineId, SolverCall)> {
        self.0.lock().unwrap().clone()
    }

    /// Calls made on one turbine, in order.
    pub fn for_turbine(&self, turbine: TurbineId) -> Vec<SolverCall> {
        self.calls()
            .into_iter()
            .filter(|(t, _)| *t == turbine)
            .map(|(_, c)| c)
            .collect()
    }

    /// Steps at which `turbine` wrote a checkpoint.
    pub fn checkpoints(&self, turbine: TurbineId) -> Vec<u64> {
        self.for_turbine(turbine)
            .into_iter()
            .filter_map(|c| match c {
                SolverCall::Checkpoint { step } => Some(step),
                _ => None,
            })
            .collect()
    }
}

/// Geometry and scripted behaviour shared by every mock solver a
/// factory creates.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub num_blades: usize,
    pub vel_pts_blade: usize,
    pub vel_pts_tower: usize,
    pub blade_span: f64,
    pub restart_step: StepId,
    /// Per-turbine overrides of `restart_step`.
    pub restart_overrides: Vec<(TurbineId, StepId)>,
    pub failures: Vec<(TurbineId, CallKind, SolverStatus)>,
    /// Turbines the factory refuses to create.
    pub refuse: Vec<TurbineId>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            num_blades: 3,
            vel_pts_blade: 5,
            vel_pts_tower: 4,
            blade_span: 60.0,
            restart_step: StepId(0),
            restart_overrides: Vec::new(),
            failures: Vec::new(),
            refuse: Vec::new(),
        }
    }
}

/// Creates [`MockTurbineSolver`]s that share one [`CallLog`].
#[derive(Clone, Debug, Default)]
pub struct MockSolverFactory {
    pub config: MockConfig,
    pub log: CallLog,
}

impl MockSolverFactory {
    pub fn new(config: MockConfig, log: CallLog) -> Self {
        Self { config, log }
    }
}

impl SolverFactory for MockSolverFactory {
    fn create(&self, turbine: &TurbineDescriptor) -> Result<Box<dyn TurbineSolver>, SolverError> {
        if self.config.refuse.contains(&turbine.id) {
            return Err(SolverError::Create {
                turbine: turbine.id,
                reason: "refused by mock".into(),
            });
        }
        Ok(Box::new(MockTurbineSolver::new(
            turbine.clone(),
            self.config.clone(),
            self.log.clone(),
        )))
    }
}

/// A turbine with straight blades in the rotor plane `x = hub.x`.
///
/// Blade `b` points along `(0, cos θ, sin θ)` with `θ = 2πb / num_blades`
/// and starts [`ROOT_OFFSET`] from the hub. Nodes are evenly spaced from
/// root to tip. The tower rises from the base to 90% of hub height.
///
/// Each step sets `force[i] = [step, i, 0.5]`, `moment[i] = [0, 0, 0.25]`
/// and controller input `k` to `10 * turbine + k + step`.
pub struct MockTurbineSolver {
    turbine: TurbineDescriptor,
    config: MockConfig,
    log: CallLog,
    counts: NodeCounts,
    step: u64,
    outputs: SolverOutputs,
    inputs: SolverInputs,
}

impl MockTurbineSolver {
    pub fn new(turbine: TurbineDescriptor, config: MockConfig, log: CallLog) -> Self {
        let counts = NodeCounts {
            num_blades: config.num_blades,
            force_pts_blade: turbine.force_pts_blade,
            force_pts_tower: turbine.force_pts_tower,
            vel_pts_blade: config.vel_pts_blade,
            vel_pts_tower: config.vel_pts_tower,
        };
        Self {
            turbine,
            config,
            log,
            counts,
            step: 0,
            outputs: SolverOutputs::default(),
            inputs: SolverInputs::default(),
        }
    }

    fn scripted(&self, kind: CallKind) -> SolverStatus {
        self.config
            .failures
            .iter()
            .find(|(t, k, _)| *t == self.turbine.id && *k == kind)
            .map(|(_, _, s)| s.clone())
            .unwrap_or_default()
    }

    fn blade_points(&self, per_blade: usize) -> Vec<Vec3> {
        let hub = self.turbine.hub_pos;
        let mut pts = Vec::with_capacity(self.counts.num_blades * per_blade);
        for b in 0..self.counts.num_blades {
            let theta = std::f64::consts::TAU * b as f64 / self.counts.num_blades as f64;
            let dir = [0.0, theta.cos(), theta.sin()];
            for j in 0..per_blade {
                let r = ROOT_OFFSET + spacing(self.config.blade_span, per_blade, j);
                pts.push([hub[0] + r * dir[0], hub[1] + r * dir[1], hub[2] + r * dir[2]]);
            }
        }
        pts
    }

    fn tower_points(&self, n: usize) -> Vec<Vec3> {
        let base = self.turbine.base_pos;
        let height = 0.9 * (self.turbine.hub_pos[2] - base[2]);
        (0..n)
            .map(|j| [base[0], base[1], base[2] + spacing(height, n, j)])
            .collect()
    }

    fn build_buffers(&mut self, setup: &SolverSetup<'_>) {
        self.outputs = SolverOutputs::zeroed(&self.counts, setup.n_controller_inputs);
        self.inputs = SolverInputs::zeroed(&self.counts, setup.n_controller_outputs);

        let hub = self.turbine.hub_pos;
        let mut force = vec![hub];
        force.extend(self.blade_points(self.counts.force_pts_blade));
        force.extend(self.tower_points(self.counts.force_pts_tower));
        let mut vel = vec![hub];
        vel.extend(self.blade_points(self.counts.vel_pts_blade));
        vel.extend(self.tower_points(self.counts.vel_pts_tower));

        let tower_start = 1 + self.counts.num_blades * self.counts.force_pts_blade;
        self.outputs.chord = (0..force.len())
            .map(|i| match i {
                0 => 0.0,
                i if i < tower_start => 3.0,
                _ => 6.0,
            })
            .collect();
        self.outputs.force_positions = force;
        self.outputs.vel_positions = vel;
        self.outputs.orientations.fill(MOCK_ORIENTATION);
        self.publish();
    }

    fn publish(&mut self) {
        let step = self.step as f64;
        for (i, f) in self.outputs.forces.iter_mut().enumerate() {
            *f = [step, i as f64, 0.5];
        }
        self.outputs.moments.fill([0.0, 0.0, 0.25]);
        let base = 10.0 * self.turbine.id.0 as f64 + step;
        for (k, v) in self.outputs.to_controller.iter_mut().enumerate() {
            *v = base + k as f64;
        }
    }
}

fn spacing(length: f64, n: usize, j: usize) -> f64 {
    if n > 1 {
        length * j as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

impl TurbineSolver for MockTurbineSolver {
    fn init(&mut self, setup: &SolverSetup<'_>) -> Reported<NodeCounts> {
        self.log.push(self.turbine.id, SolverCall::Init);
        self.step = 0;
        self.build_buffers(setup);
        Reported {
            value: self.counts,
            status: self.scripted(CallKind::Init),
        }
    }

    fn restart(&mut self, setup: &SolverSetup<'_>, checkpoint: &Path) -> Reported<RestartInfo> {
        self.log.push(
            self.turbine.id,
            SolverCall::Restart {
                checkpoint: checkpoint.to_path_buf(),
            },
        );
        let step = self
            .config
            .restart_overrides
            .iter()
            .find(|(t, _)| *t == self.turbine.id)
            .map_or(self.config.restart_step, |(_, s)| *s);
        self.step = step.0;
        self.build_buffers(setup);
        Reported {
            value: RestartInfo {
                step,
                counts: self.counts,
            },
            status: self.scripted(CallKind::Restart),
        }
    }

    fn advance_to_solution0(&mut self) -> SolverStatus {
        self.log.push(
            self.turbine.id,
            SolverCall::Solution0 {
                inputs: self.inputs.clone(),
            },
        );
        self.scripted(CallKind::Solution0)
    }

    fn step(&mut self) -> SolverStatus {
        self.step += 1;
        self.log.push(
            self.turbine.id,
            SolverCall::Step {
                step: self.step,
                inputs: self.inputs.clone(),
            },
        );
        self.publish();
        self.scripted(CallKind::Step)
    }

    fn write_checkpoint(&mut self, _root: Option<&Path>) -> SolverStatus {
        self.log
            .push(self.turbine.id, SolverCall::Checkpoint { step: self.step });
        self.scripted(CallKind::Checkpoint)
    }

    fn end(&mut self) {
        self.log.push(self.turbine.id, SolverCall::End);
    }

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
