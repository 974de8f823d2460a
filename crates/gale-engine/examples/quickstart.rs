//! Gale Quickstart: a two-rank coupling run with a toy solver.
//!
//! Demonstrates:
//!   1. Implementing a turbine solver (a thrust-only actuator disk)
//!   2. Loading a run configuration from TOML
//!   3. Running two ranks as threads over `ThreadComm`
//!   4. Feeding a farm-averaging controller from every turbine
//!   5. Reading negated forces back through the coupler
//!
//! Run with:
//!   cargo run --example quickstart

use std::path::Path;
use std::thread;

use gale_comm::ThreadComm;
use gale_core::{NodeCounts, StepId, TurbineDescriptor};
use gale_engine::{Coupler, CouplingConfig};
use gale_solver::{
    Reported, RestartInfo, SolverError, SolverFactory, SolverInputs, SolverOutputs, SolverSetup,
    SolverStatus, TurbineSolver,
};

// ─── Rotor parameters ───────────────────────────────────────────

const BLADES: usize = 3;
const RADIUS: f64 = 40.0;
const RHO: f64 = 1.225;
const THRUST_COEFF: f64 = 0.75;

// ─── Solver: uniform actuator disk ──────────────────────────────
//
// Samples the inflow at the same points it applies force, spreads the
// disk thrust evenly over blade nodes and reports its mean rotor speed
// to the farm controller. The controller output scales the thrust.

struct ActuatorDisk {
    turbine: TurbineDescriptor,
    counts: NodeCounts,
    step: u64,
    outputs: SolverOutputs,
    inputs: SolverInputs,
}

impl ActuatorDisk {
    fn new(turbine: TurbineDescriptor) -> Self {
        let counts = NodeCounts {
            num_blades: BLADES,
            force_pts_blade: turbine.force_pts_blade,
            force_pts_tower: turbine.force_pts_tower,
            vel_pts_blade: turbine.force_pts_blade,
            vel_pts_tower: turbine.force_pts_tower,
        };
        Self {
            turbine,
            counts,
            step: 0,
            outputs: SolverOutputs::default(),
            inputs: SolverInputs::default(),
        }
    }

    fn layout(&mut self, setup: &SolverSetup<'_>) {
        self.outputs = SolverOutputs::zeroed(&self.counts, setup.n_controller_inputs);
        self.inputs = SolverInputs::zeroed(&self.counts, setup.n_controller_outputs);

        let hub = self.turbine.hub_pos;
        let base = self.turbine.base_pos;
        let mut pts = vec![hub];
        for b in 0..BLADES {
            let theta = std::f64::consts::TAU * b as f64 / BLADES as f64;
            for j in 0..self.counts.force_pts_blade {
                let r = RADIUS * (j + 1) as f64 / self.counts.force_pts_blade as f64;
                pts.push([hub[0], hub[1] + r * theta.cos(), hub[2] + r * theta.sin()]);
            }
        }
        for j in 0..self.counts.force_pts_tower {
            let z = (hub[2] - base[2]) * j as f64 / self.counts.force_pts_tower as f64;
            pts.push([base[0], base[1], base[2] + z]);
        }
        self.outputs.force_positions = pts.clone();
        self.outputs.vel_positions = pts;
        // row 1 is the shaft axis, pointing downwind
        self.outputs
            .orientations
            .fill([0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        self.outputs.chord.fill(3.0);
    }

    fn solve(&mut self) {
        let blades = 1..1 + BLADES * self.counts.force_pts_blade;
        let n = blades.len() as f64;
        let u_mean = self.inputs.velocities[blades.clone()]
            .iter()
            .map(|v| v[0])
            .sum::<f64>()
            / n;
        let scale = match self.inputs.from_controller.first() {
            Some(&avg) if avg > 0.0 => (avg / u_mean.max(1e-6)).min(1.0),
            _ => 1.0,
        };
        let area = std::f64::consts::PI * RADIUS * RADIUS;
        let thrust = 0.5 * RHO * area * THRUST_COEFF * u_mean * u_mean * scale;
        for i in blades {
            self.outputs.forces[i] = [thrust / n, 0.0, 0.0];
        }
        if let Some(out) = self.outputs.to_controller.first_mut() {
            *out = u_mean;
        }
    }
}

impl TurbineSolver for ActuatorDisk {
    fn init(&mut self, setup: &SolverSetup<'_>) -> Reported<NodeCounts> {
        self.layout(setup);
        Reported::ok(self.counts)
    }

    fn restart(&mut self, setup: &SolverSetup<'_>, _checkpoint: &Path) -> Reported<RestartInfo> {
        self.layout(setup);
        Reported::ok(RestartInfo {
            step: StepId(self.step),
            counts: self.counts,
        })
    }

    fn advance_to_solution0(&mut self) -> SolverStatus {
        self.solve();
        SolverStatus::ok()
    }

    fn step(&mut self) -> SolverStatus {
        self.step += 1;
        self.solve();
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

struct DiskFactory;

impl SolverFactory for DiskFactory {
    fn create(&self, turbine: &TurbineDescriptor) -> Result<Box<dyn TurbineSolver>, SolverError> {
        Ok(Box::new(ActuatorDisk::new(turbine.clone())))
    }
}

// ─── Configuration ──────────────────────────────────────────────

fn farm_config(restart_dir: &Path) -> String {
    let mut toml = format!(
        r#"
t_max = 2.0
dt = 0.1
checkpoint_interval = 10
num_inputs = 1
num_outputs = 1

[controller]
kind = "farm_average"
relaxation = 0.5
restart_dir = "{}"

[inflow]
kind = "power_law"
ref_speed = 9.0
ref_height = 90.0
exponent = 0.14
"#,
        restart_dir.display()
    );
    for i in 0..4 {
        toml.push_str(&format!(
            r#"
[[turbines]]
input_file = "turbine{i}.fst"
base_pos = [{x:.1}, 0.0, 0.0]
hub_pos = [{x:.1}, 0.0, 90.0]
force_pts_blade = 8
force_pts_tower = 4
"#,
            x = 400.0 * i as f64
        ));
    }
    toml
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Gale Quickstart ===\n");

    let restart_dir = std::env::temp_dir().join("gale-quickstart");
    std::fs::create_dir_all(&restart_dir)?;
    let config: CouplingConfig = farm_config(&restart_dir).parse()?;
    config.validate()?;
    println!(
        "Farm: {} turbines, {} steps of {} s",
        config.turbines.len(),
        config.final_step().0,
        config.dt
    );

    let handles: Vec<_> = ThreadComm::group(2)
        .into_iter()
        .map(|comm| {
            let config = config.clone();
            thread::spawn(move || -> Result<String, String> {
                let mut coupler =
                    Coupler::from_config(config, &comm, &DiskFactory).map_err(|e| e.to_string())?;
                let last = coupler.run().map_err(|e| e.to_string())?;

                let mut lines = format!(
                    "rank {} reached step {} owning {:?}\n",
                    coupler.allocation().rank(),
                    last,
                    coupler.local_turbines()
                );
                for &t in coupler.local_turbines() {
                    let (_, thrust) = coupler.torque_thrust(t).map_err(|e| e.to_string())?;
                    let f = coupler.force(t, 1).map_err(|e| e.to_string())?;
                    lines.push_str(&format!(
                        "  turbine {t}: rotor thrust {:>9.1} N, fluid load at node 1 {:>8.1} N\n",
                        thrust[0], f[0]
                    ));
                }
                coupler.end();
                Ok(lines)
            })
        })
        .collect();

    for h in handles {
        let report = h.join().map_err(|_| "rank panicked")??;
        print!("{report}");
    }

    println!("\nController restart files in {}", restart_dir.display());
    println!("Done.");
    Ok(())
}
