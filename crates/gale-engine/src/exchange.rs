//! Per-turbine data exchange between the flow solver and a turbine solver.
//!
//! All lookups address nodes by their position in the turbine's fixed
//! node ordering (hub, blades, tower). Forces and moments are handed out
//! in the flow solver's convention, the load acting on the fluid, which
//! is the negation of what the turbine solver stores.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use gale_core::geometry::{add, cross, neg, orientation_row, sub};
use gale_core::{LocalIndex, NodeCounts, NodeType, Orientation, TurbineDescriptor, TurbineId, Vec3};
use gale_interp::interpolate_turbine;
use gale_solver::{SolverOutputs, TurbineSolver};

use crate::config::InflowConfig;
use crate::error::CouplingError;

/// A locally owned turbine: its descriptor, solver and exchange buffers.
pub struct LocalTurbine {
    pub(crate) descriptor: TurbineDescriptor,
    pub(crate) local: LocalIndex,
    pub(crate) solver: Box<dyn TurbineSolver>,
    /// Init or restart was called; the solver needs `end`.
    pub(crate) started: bool,
    counts: Option<NodeCounts>,
    force_node_vel: Vec<Vec3>,
    force_vel_pending: bool,
    scratch: Vec<Vec3>,
}

fn check_len(
    turbine: TurbineId,
    buffer: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), CouplingError> {
    if expected != actual {
        return Err(CouplingError::BufferLength {
            turbine,
            buffer,
            expected,
            actual,
        });
    }
    Ok(())
}

impl LocalTurbine {
    /// Wrap a freshly created, uninitialised solver.
    pub fn new(descriptor: TurbineDescriptor, local: LocalIndex, solver: Box<dyn TurbineSolver>) -> Self {
        Self {
            descriptor,
            local,
            solver,
            started: false,
            counts: None,
            force_node_vel: Vec::new(),
            force_vel_pending: false,
            scratch: Vec::new(),
        }
    }

    /// Global turbine index.
    pub fn id(&self) -> TurbineId {
        self.descriptor.id
    }

    /// Local index on the owning rank.
    pub fn local_index(&self) -> LocalIndex {
        self.local
    }

    /// Static description of the turbine.
    pub fn descriptor(&self) -> &TurbineDescriptor {
        &self.descriptor
    }

    /// Node counts reported by the solver.
    pub fn counts(&self) -> Result<NodeCounts, CouplingError> {
        self.counts
            .ok_or(CouplingError::NotInitialized { turbine: self.id() })
    }

    /// Record the node counts reported at init or restart and check every
    /// solver buffer against them.
    pub(crate) fn bind(
        &mut self,
        counts: NodeCounts,
        n_controller_inputs: usize,
        n_controller_outputs: usize,
    ) -> Result<(), CouplingError> {
        let id = self.id();
        let nf = counts.force_layout().len();
        let nv = counts.velocity_layout().len();

        let out = self.solver.outputs();
        check_len(id, "velocity node positions", nv, out.vel_positions.len())?;
        check_len(id, "force node positions", nf, out.force_positions.len())?;
        check_len(id, "forces", nf, out.forces.len())?;
        check_len(id, "moments", nf, out.moments.len())?;
        check_len(id, "orientations", nf, out.orientations.len())?;
        check_len(id, "chord", nf, out.chord.len())?;
        check_len(id, "controller inputs", n_controller_inputs, out.to_controller.len())?;
        let inp = self.solver.inputs();
        check_len(id, "velocities", nv, inp.velocities.len())?;
        check_len(id, "controller outputs", n_controller_outputs, inp.from_controller.len())?;

        self.counts = Some(counts);
        self.force_node_vel = vec![[0.0; 3]; nf];
        self.force_vel_pending = false;
        self.scratch = vec![[0.0; 3]; nv];
        Ok(())
    }

    fn outputs(&self) -> Result<&SolverOutputs, CouplingError> {
        self.counts()?;
        Ok(self.solver.outputs())
    }

    fn node<T: Copy>(&self, buf: &[T], node: usize) -> Result<T, CouplingError> {
        buf.get(node).copied().ok_or(CouplingError::NodeOutOfRange {
            turbine: self.id(),
            node,
            len: buf.len(),
        })
    }

    /// Hub position from the configuration.
    pub fn hub_position(&self) -> Vec3 {
        self.descriptor.hub_pos
    }

    /// Downwind shaft axis: row 1 of the hub node's orientation matrix.
    pub fn hub_shaft_direction(&self) -> Result<Vec3, CouplingError> {
        let hub = self.node(&self.outputs()?.orientations, 0)?;
        Ok(orientation_row(&hub, 1))
    }

    /// Position of velocity sampling node `node`.
    pub fn velocity_node_position(&self, node: usize) -> Result<Vec3, CouplingError> {
        self.node(&self.outputs()?.vel_positions, node)
    }

    /// Position of force node `node`.
    pub fn force_node_position(&self, node: usize) -> Result<Vec3, CouplingError> {
        self.node(&self.outputs()?.force_positions, node)
    }

    /// Row-major orientation matrix of force node `node`.
    pub fn force_node_orientation(&self, node: usize) -> Result<Orientation, CouplingError> {
        self.node(&self.outputs()?.orientations, node)
    }

    /// Force exerted on the fluid at force node `node`.
    pub fn force(&self, node: usize) -> Result<Vec3, CouplingError> {
        Ok(neg(self.node(&self.outputs()?.forces, node)?))
    }

    /// Moment exerted on the fluid at force node `node`.
    pub fn moment(&self, node: usize) -> Result<Vec3, CouplingError> {
        Ok(neg(self.node(&self.outputs()?.moments, node)?))
    }

    /// Chord (blade) or diameter (tower) at force node `node`.
    pub fn chord(&self, node: usize) -> Result<f64, CouplingError> {
        self.node(&self.outputs()?.chord, node)
    }

    /// Type of velocity sampling node `node`.
    pub fn velocity_node_type(&self, node: usize) -> Result<NodeType, CouplingError> {
        self.counts()?
            .velocity_layout()
            .node_type(node)
            .map_err(|source| CouplingError::Layout {
                turbine: self.id(),
                source,
            })
    }

    /// Type of force node `node`.
    pub fn force_node_type(&self, node: usize) -> Result<NodeType, CouplingError> {
        self.counts()?
            .force_layout()
            .node_type(node)
            .map_err(|source| CouplingError::Layout {
                turbine: self.id(),
                source,
            })
    }

    /// Set the inflow velocity at sampling node `node`.
    pub fn set_velocity(&mut self, node: usize, velocity: Vec3) -> Result<(), CouplingError> {
        self.counts()?;
        let id = self.id();
        let velocities = &mut self.solver.inputs_mut().velocities;
        let len = velocities.len();
        let slot = velocities
            .get_mut(node)
            .ok_or(CouplingError::NodeOutOfRange { turbine: id, node, len })?;
        *slot = velocity;
        Ok(())
    }

    /// Set the inflow velocity at force node `node`. Sampling nodes are
    /// filled by interpolation on the next input write.
    pub fn set_force_node_velocity(&mut self, node: usize, velocity: Vec3) -> Result<(), CouplingError> {
        self.counts()?;
        let len = self.force_node_vel.len();
        let slot = self
            .force_node_vel
            .get_mut(node)
            .ok_or(CouplingError::NodeOutOfRange {
                turbine: self.descriptor.id,
                node,
                len,
            })?;
        *slot = velocity;
        self.force_vel_pending = true;
        Ok(())
    }

    /// Rotor torque and thrust from the blade force nodes, in the solver's
    /// sign convention. Returns `(torque, thrust)`.
    pub fn torque_thrust(&self) -> Result<(Vec3, Vec3), CouplingError> {
        let counts = self.counts()?;
        let out = self.solver.outputs();
        let hub = self.node(&out.force_positions, 0)?;
        let blades = 1..1 + counts.num_blades * counts.force_pts_blade;

        let mut torque = [0.0; 3];
        let mut thrust = [0.0; 3];
        for i in blades {
            let f = self.node(&out.forces, i)?;
            let m = self.node(&out.moments, i)?;
            let r = sub(self.node(&out.force_positions, i)?, hub);
            thrust = add(thrust, f);
            torque = add(torque, add(cross(r, f), m));
        }
        Ok((torque, thrust))
    }

    /// Fill the solver's velocity inputs for the coming solver call.
    ///
    /// A prescribed inflow is evaluated at every sampling node. With
    /// external inflow, velocities set at force nodes since the last call
    /// are interpolated to the sampling nodes; otherwise the values set
    /// with [`set_velocity`](Self::set_velocity) are left in place.
    pub fn write_inputs(&mut self, inflow: &InflowConfig) -> Result<(), CouplingError> {
        let counts = self.counts()?;
        let id = self.id();
        let out = self.solver.outputs();

        match inflow {
            InflowConfig::External if !self.force_vel_pending => return Ok(()),
            InflowConfig::External => {
                interpolate_turbine(
                    &counts.force_layout(),
                    &counts.velocity_layout(),
                    &out.force_positions,
                    &out.vel_positions,
                    &self.force_node_vel,
                    &mut self.scratch,
                )
                .map_err(|source| CouplingError::Interp {
                    turbine: id,
                    source,
                })?;
                self.force_vel_pending = false;
            }
            InflowConfig::PowerLaw { .. } => {
                for (v, p) in self.scratch.iter_mut().zip(&out.vel_positions) {
                    *v = inflow.velocity_at(*p).unwrap_or([0.0; 3]);
                }
            }
        }
        self.solver
            .inputs_mut()
            .velocities
            .copy_from_slice(&self.scratch);
        Ok(())
    }

    /// Emit every node's position and velocity at debug level.
    pub(crate) fn trace_nodes(&self) {
        let out = self.solver.outputs();
        let inp = self.solver.inputs();
        for (i, (p, v)) in out.vel_positions.iter().zip(&inp.velocities).enumerate() {
            tracing::debug!(turbine = self.id().0, node = i, position = ?p, velocity = ?v, "sampling node");
        }
        for (i, p) in out.force_positions.iter().enumerate() {
            tracing::debug!(turbine = self.id().0, node = i, position = ?p, "force node");
        }
    }

    /// Write `actuator_forces.<turbine>.csv` into `dir`, one row of
    /// `x, y, z, fx, fy, fz` per force node in the solver's convention.
    pub fn dump_forces(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let out = self.solver.outputs();
        let mut csv = String::from("# x, y, z, fx, fy, fz\n");
        for (p, f) in out.force_positions.iter().zip(&out.forces) {
            // Writing to a String cannot fail.
            let _ = writeln!(
                csv,
                "{}, {}, {}, {}, {}, {}",
                p[0], p[1], p[2], f[0], f[1], f[2]
            );
        }
        let path = dir.join(format!("actuator_forces.{}.csv", self.id()));
        std::fs::write(&path, csv)?;
        Ok(path)
    }
}

impl std::fmt::Debug for LocalTurbine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTurbine")
            .field("id", &self.id())
            .field("local", &self.local)
            .field("counts", &self.counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bound_turbine;
    use gale_test_utils::{descriptor, CallLog, MockConfig, MockTurbineSolver};

    fn turbine() -> LocalTurbine {
        bound_turbine(1, 0, 0)
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn unbound_turbine_rejects_lookups() {
        let d = descriptor(0);
        let solver = MockTurbineSolver::new(d.clone(), MockConfig::default(), CallLog::new());
        let t = LocalTurbine::new(d, LocalIndex(0), Box::new(solver));
        assert!(matches!(
            t.force(0),
            Err(CouplingError::NotInitialized { turbine: TurbineId(0) })
        ));
    }

    #[test]
    fn bind_checks_buffer_lengths() {
        let mut t = turbine();
        let mut counts = t.counts().unwrap();
        counts.vel_pts_blade += 1;
        assert!(matches!(
            t.bind(counts, 0, 0),
            Err(CouplingError::BufferLength {
                buffer: "velocity node positions",
                ..
            })
        ));
        let counts = t.counts().unwrap();
        assert!(matches!(
            t.bind(counts, 2, 0),
            Err(CouplingError::BufferLength {
                buffer: "controller inputs",
                expected: 2,
                actual: 0,
                ..
            })
        ));
    }

    #[test]
    fn forces_and_moments_are_negated() {
        let t = turbine();
        // mock solver stores [step, node, 0.5] and [0, 0, 0.25]
        assert_eq!(t.force(4).unwrap(), [-0.0, -4.0, -0.5]);
        assert_eq!(t.moment(4).unwrap(), [-0.0, -0.0, -0.25]);
    }

    #[test]
    fn hub_shaft_direction_is_second_orientation_row() {
        let t = turbine();
        assert_eq!(t.hub_shaft_direction().unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(
            t.force_node_orientation(0).unwrap(),
            gale_test_utils::solver::MOCK_ORIENTATION
        );
    }

    #[test]
    fn positions_and_chord() {
        let t = turbine();
        assert_eq!(t.hub_position(), [500.0, 0.0, 90.0]);
        assert_eq!(t.force_node_position(0).unwrap(), [500.0, 0.0, 90.0]);
        assert_eq!(t.velocity_node_position(0).unwrap(), [500.0, 0.0, 90.0]);
        assert_eq!(t.chord(0).unwrap(), 0.0);
        assert_eq!(t.chord(1).unwrap(), 3.0);
        assert_eq!(t.chord(11).unwrap(), 6.0);
    }

    #[test]
    fn node_index_past_end_rejected() {
        let t = turbine();
        assert!(matches!(
            t.force(12),
            Err(CouplingError::NodeOutOfRange {
                node: 12,
                len: 12,
                ..
            })
        ));
        assert!(matches!(
            t.velocity_node_type(20),
            Err(CouplingError::Layout { .. })
        ));
    }

    #[test]
    fn node_types_follow_layout() {
        let t = turbine();
        assert_eq!(t.force_node_type(0).unwrap(), NodeType::Hub);
        assert_eq!(t.force_node_type(4).unwrap(), NodeType::Blade(1));
        assert_eq!(t.force_node_type(10).unwrap(), NodeType::Tower);
        assert_eq!(t.velocity_node_type(15).unwrap(), NodeType::Blade(2));
        assert_eq!(t.velocity_node_type(16).unwrap(), NodeType::Tower);
    }

    #[test]
    fn power_law_fills_every_sampling_node() {
        let mut t = turbine();
        t.write_inputs(&InflowConfig::default()).unwrap();
        let vel = &t.solver.inputs().velocities;
        assert!(close(vel[0], [10.0, 0.0, 0.0]));
        // tower bottom sits on the ground
        assert_eq!(vel[16], [0.0, 0.0, 0.0]);
        let z = t.velocity_node_position(18).unwrap()[2];
        assert!(close(vel[18], [10.0 * (z / 90.0).powf(0.2), 0.0, 0.0]));
    }

    #[test]
    fn external_sampling_velocities_left_in_place() {
        let mut t = turbine();
        t.set_velocity(3, [1.0, 2.0, 3.0]).unwrap();
        t.write_inputs(&InflowConfig::External).unwrap();
        assert_eq!(t.solver.inputs().velocities[3], [1.0, 2.0, 3.0]);
        assert!(t.set_velocity(20, [0.0; 3]).is_err());
    }

    #[test]
    fn force_node_velocities_interpolated_to_sampling_nodes() {
        let mut t = turbine();
        t.set_force_node_velocity(0, [7.0, 7.0, 7.0]).unwrap();
        for b in 0..3 {
            for j in 0..3 {
                // 30 m between force nodes along each blade
                t.set_force_node_velocity(1 + 3 * b + j, [30.0 * j as f64, 0.0, b as f64])
                    .unwrap();
            }
        }
        t.set_force_node_velocity(10, [0.0, 0.0, 0.0]).unwrap();
        t.set_force_node_velocity(11, [0.0, 81.0, 0.0]).unwrap();
        t.write_inputs(&InflowConfig::External).unwrap();

        let vel = t.solver.inputs().velocities.clone();
        assert_eq!(vel[0], [7.0, 7.0, 7.0]);
        for b in 0..3 {
            for j in 0..5 {
                // 15 m between sampling nodes along each blade
                let expected = [15.0 * j as f64, 0.0, b as f64];
                assert!(close(vel[1 + 5 * b + j], expected), "blade {b} node {j}");
            }
        }
        for j in 0..4 {
            assert!(close(vel[16 + j], [0.0, 27.0 * j as f64, 0.0]), "tower node {j}");
        }
    }

    #[test]
    fn torque_and_thrust_sum_blade_nodes() {
        let t = turbine();
        let (torque, thrust) = t.torque_thrust().unwrap();
        // forces are [0, i, 0.5] on blade nodes 1..=9
        assert_eq!(thrust, [0.0, 45.0, 4.5]);

        let hub = t.force_node_position(0).unwrap();
        let mut expected = [0.0; 3];
        for i in 1..10 {
            let r = sub(t.force_node_position(i).unwrap(), hub);
            let f = neg(t.force(i).unwrap());
            let m = neg(t.moment(i).unwrap());
            expected = add(expected, add(cross(r, f), m));
        }
        assert!(close(torque, expected));
        assert!((torque[2] - expected[2]).abs() < 1e-9);
    }

    #[test]
    fn force_dump_has_one_row_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let t = turbine();
        let path = t.dump_forces(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("actuator_forces.1.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "# x, y, z, fx, fy, fz");
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[1], "500, 0, 90, 0, 0, 0.5");
    }
}
