//! The coupling coordinator.
//!
//! One [`Coupler`] runs per rank. It owns the turbine registry, the
//! controller bridge and the owning sub-group, and drives them through
//!
//! ```text
//! Uninitialized ─init()─► TimeZero ─solution0()─► Stepping ─end()─► Finalized
//!               └──(restart)───────────────────►┘
//!               └──(dry run)─► DryRun ─end()─► Finalized
//! ```
//!
//! Each [`step()`](Coupler::step) runs controller compute and scatter,
//! then per local turbine writes inputs and steps the solver, then
//! gathers controller inputs across the sub-group, updates controller
//! state, advances the clock and writes checkpoints when due.

use std::time::Instant;

use gale_comm::Communicator;
use gale_controller::Controller;
use gale_core::{NodeCounts, NodeType, Orientation, Rank, StepId, TurbineId, Vec3};
use gale_solver::{SolverFactory, SolverSetup};

use crate::alloc::TurbineAllocation;
use crate::bridge::ControllerBridge;
use crate::clock::SimClock;
use crate::config::CouplingConfig;
use crate::error::{ConfigError, CouplerError};
use crate::metrics::StepMetrics;
use crate::registry::TurbineRegistry;

/// Lifecycle phase of a [`Coupler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Built; no solver has been initialised.
    Uninitialized,
    /// Cold-started; waiting for the time-zero solution.
    TimeZero,
    /// Advancing one step per [`Coupler::step`] call.
    Stepping,
    /// Dry run: allocation only, solvers are never advanced.
    DryRun,
    /// Solvers finalised and the sub-group released.
    Finalized,
}

/// Outcome of one [`Coupler::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Step reached.
    pub step: StepId,
    /// Whether checkpoints were written at `step`.
    pub checkpointed: bool,
    /// Timings of the step.
    pub metrics: StepMetrics,
}

/// Per-rank coordinator of a multi-turbine coupling run.
pub struct Coupler {
    config: CouplingConfig,
    registry: TurbineRegistry,
    bridge: ControllerBridge,
    group: Option<Box<dyn Communicator>>,
    clock: SimClock,
    phase: RunPhase,
    n_inputs: usize,
    n_outputs: usize,
    metrics: StepMetrics,
}

fn micros(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}

impl Coupler {
    /// Build a coupler with the controller named in `config`.
    ///
    /// Collective over `world`.
    pub fn from_config(
        config: CouplingConfig,
        world: &dyn Communicator,
        factory: &dyn SolverFactory,
    ) -> Result<Self, CouplerError> {
        let controller = Controller::load(&config.controller)?;
        Self::new(config, world, factory, controller)
    }

    /// Allocate turbines, form the owning sub-group and create the local
    /// solvers.
    ///
    /// Collective over `world`: every rank must call it.
    pub fn new(
        config: CouplingConfig,
        world: &dyn Communicator,
        factory: &dyn SolverFactory,
        controller: Controller,
    ) -> Result<Self, CouplerError> {
        config.validate()?;
        let (n_inputs, n_outputs) = config.controller_arity(controller.is_enabled());
        if controller.is_enabled() && (n_inputs == 0 || n_outputs == 0) {
            return Err(ConfigError::ControllerArity {
                n_inputs,
                n_outputs,
            }
            .into());
        }

        let descriptors = config.descriptors();
        let n_turbines = descriptors.len();
        let allocation = TurbineAllocation::round_robin(n_turbines, world.size(), world.rank())?;
        let group = world.subgroup(&allocation.owning_ranks())?;
        tracing::info!(
            rank = allocation.rank().0,
            world_size = allocation.world_size(),
            local = allocation.num_local(),
            global = n_turbines,
            in_subgroup = group.is_some(),
            "turbines allocated"
        );
        tracing::info!("{}", allocation.report().trim_end());
        if let Some(dir) = &config.allocation_report_dir {
            allocation
                .write_report(dir)
                .map_err(|source| CouplerError::Report {
                    path: allocation.report_path(dir),
                    source,
                })?;
        }

        let registry = TurbineRegistry::new(descriptors, allocation, factory)?;
        let bridge = ControllerBridge::new(
            controller,
            n_turbines,
            n_inputs,
            n_outputs,
            group.is_some(),
        );
        let clock = SimClock::new(
            config.start_step(),
            config.final_step(),
            config.checkpoint_interval,
        );

        Ok(Self {
            config,
            registry,
            bridge,
            group,
            clock,
            phase: RunPhase::Uninitialized,
            n_inputs,
            n_outputs,
            metrics: StepMetrics::default(),
        })
    }

    fn expect_phase(&self, operation: &'static str, phase: RunPhase) -> Result<(), CouplerError> {
        if self.phase != phase {
            return Err(CouplerError::InvalidPhase {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Cold-start or restart every local solver, depending on `t_start`.
    pub fn init(&mut self) -> Result<(), CouplerError> {
        self.expect_phase("init", RunPhase::Uninitialized)?;
        if self.config.dry_run {
            tracing::info!("dry run: solvers will not be advanced");
            self.phase = RunPhase::DryRun;
            return Ok(());
        }
        if self.config.is_restart() {
            self.restart()?;
            self.phase = RunPhase::Stepping;
        } else {
            self.cold_start()?;
            self.phase = RunPhase::TimeZero;
        }
        Ok(())
    }

    fn cold_start(&mut self) -> Result<(), CouplerError> {
        let abort = self.config.abort_level;
        for t in self.registry.locals_mut() {
            let setup = SolverSetup {
                turbine: &t.descriptor,
                t_max: self.config.t_max,
                dt: self.config.dt,
                n_controller_inputs: self.n_inputs,
                n_controller_outputs: self.n_outputs,
            };
            let reported = t.solver.init(&setup);
            t.started = true;
            let counts = reported.check(abort, t.id())?;
            t.bind(counts, self.n_inputs, self.n_outputs)?;
            log_counts(t.id(), t.descriptor.turb_id, &counts, "turbine initialised");
            if self.config.debug {
                t.trace_nodes();
            }
        }
        Ok(())
    }

    fn restart(&mut self) -> Result<(), CouplerError> {
        // Peers block in the agreement below, so a local failure is
        // reported to them before it is returned.
        let local = self.restart_locals();
        let agreed = self.agree_on_step(local.as_ref().ok().copied())?;
        let local = local?;

        let configured = self.config.start_step();
        let step = agreed.or(local).unwrap_or(configured);
        if step != configured {
            tracing::warn!(
                configured = configured.0,
                recovered = step.0,
                "checkpoint step differs from t_start / dt; continuing from the checkpoint"
            );
        }
        self.clock.restart_at(step);
        self.bridge.restart(step)?;
        tracing::info!(step = step.0, "restarted from checkpoints");
        Ok(())
    }

    /// Restart every local solver. Returns the step they all recovered,
    /// or `None` if this rank owns no turbines.
    fn restart_locals(&mut self) -> Result<Option<StepId>, CouplerError> {
        let abort = self.config.abort_level;
        let mut recovered: Option<StepId> = None;
        for t in self.registry.locals_mut() {
            let setup = SolverSetup {
                turbine: &t.descriptor,
                t_max: self.config.t_max,
                dt: self.config.dt,
                n_controller_inputs: self.n_inputs,
                n_controller_outputs: self.n_outputs,
            };
            let reported = t.solver.restart(&setup, &t.descriptor.restart_file);
            t.started = true;
            let info = reported.check(abort, t.id())?;
            t.bind(info.counts, self.n_inputs, self.n_outputs)?;
            log_counts(t.id(), t.descriptor.turb_id, &info.counts, "turbine restarted");

            match recovered {
                None => recovered = Some(info.step),
                Some(expected) if expected != info.step => {
                    return Err(CouplerError::RestartStepMismatch {
                        turbine: t.id(),
                        expected,
                        found: info.step,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(recovered)
    }

    /// Check that every sub-group rank recovered the same step.
    ///
    /// Each member writes its step into its own slot, or `-1` if its local
    /// restart failed; the summed array must then hold one value
    /// throughout. Collective over the sub-group. Ranks outside it return
    /// `local`. A failed rank returns `None` and reports its own error.
    fn agree_on_step(&self, local: Option<Option<StepId>>) -> Result<Option<StepId>, CouplerError> {
        let Some(group) = self.group.as_deref() else {
            return Ok(local.flatten());
        };
        let Some(local) = local else {
            let mut steps = vec![0.0; group.size()];
            steps[group.rank().0] = -1.0;
            group.all_reduce_sum(&mut steps)?;
            return Ok(None);
        };

        let mut steps = vec![0.0; group.size()];
        // Every sub-group member owns at least one turbine.
        steps[group.rank().0] = local.map_or(0.0, |s| s.0 as f64);
        group.all_reduce_sum(&mut steps)?;

        if let Some(rank) = steps.iter().position(|&s| s < 0.0) {
            return Err(CouplerError::PeerRestartFailed { rank: Rank(rank) });
        }
        let expected = StepId(steps[0] as u64);
        for (rank, &s) in steps.iter().enumerate().skip(1) {
            if s as u64 != expected.0 {
                return Err(CouplerError::RankStepMismatch {
                    rank: Rank(rank),
                    expected,
                    found: StepId(s as u64),
                });
            }
        }
        Ok(Some(expected))
    }

    /// Solve the time-zero state: first-guess inflow, first controller
    /// outputs, each solver's initial solution, then the first gather.
    pub fn solution0(&mut self) -> Result<(), CouplerError> {
        self.expect_phase("solution0", RunPhase::TimeZero)?;
        let abort = self.config.abort_level;
        for t in self.registry.locals_mut() {
            t.write_inputs(&self.config.inflow)?;
        }

        self.bridge.init()?;
        self.bridge.compute_and_scatter(self.registry.locals_mut())?;

        for t in self.registry.locals_mut() {
            t.solver.advance_to_solution0().check(abort, t.id())?;
        }
        self.phase = RunPhase::Stepping;

        if let Some(group) = self.group.as_deref() {
            self.bridge.gather(self.registry.locals(), group)?;
        }
        tracing::info!(step = self.clock.current().0, "time-zero solution complete");
        Ok(())
    }

    /// Advance every local turbine by one step.
    ///
    /// In a dry run this does nothing and reports the current step.
    pub fn step(&mut self) -> Result<StepReport, CouplerError> {
        if self.phase == RunPhase::DryRun {
            return Ok(StepReport {
                step: self.clock.current(),
                checkpointed: false,
                metrics: StepMetrics::default(),
            });
        }
        self.expect_phase("step", RunPhase::Stepping)?;
        let abort = self.config.abort_level;
        let started = Instant::now();
        let mut metrics = StepMetrics::default();

        let t0 = Instant::now();
        self.bridge.compute_and_scatter(self.registry.locals_mut())?;
        metrics.controller_us = micros(t0);

        for t in self.registry.locals_mut() {
            let t0 = Instant::now();
            t.write_inputs(&self.config.inflow)?;
            if self.config.debug {
                t.trace_nodes();
            }
            t.solver.step().check(abort, t.id())?;
            if let (true, Some(dir)) = (self.config.debug, &self.config.debug_dir) {
                if let Err(e) = t.dump_forces(dir) {
                    tracing::warn!(turbine = t.id().0, error = %e, "actuator force dump failed");
                }
            }
            metrics.turbine_us.push((t.id(), micros(t0)));
        }

        let t0 = Instant::now();
        if let Some(group) = self.group.as_deref() {
            self.bridge.gather(self.registry.locals(), group)?;
        }
        self.bridge.update_states()?;
        metrics.gather_us = micros(t0);

        let step = self.clock.advance();
        let checkpointed = self.clock.is_checkpoint_step();
        if checkpointed {
            let t0 = Instant::now();
            self.write_checkpoints(step)?;
            metrics.checkpoint_us = micros(t0);
        }

        metrics.total_us = micros(started);
        self.metrics = metrics.clone();
        Ok(StepReport {
            step,
            checkpointed,
            metrics,
        })
    }

    fn write_checkpoints(&mut self, step: StepId) -> Result<(), CouplerError> {
        let abort = self.config.abort_level;
        for t in self.registry.locals_mut() {
            t.solver.write_checkpoint(None).check(abort, t.id())?;
        }
        let is_root = self.group.as_deref().is_some_and(|g| g.is_root());
        self.bridge.write_restart(step, is_root)?;
        tracing::info!(
            step = step.0,
            turbines = self.registry.locals().len(),
            "checkpoint written"
        );
        Ok(())
    }

    /// Initialise if needed, solve time zero if needed, then step until
    /// the final step. Returns the step reached.
    pub fn run(&mut self) -> Result<StepId, CouplerError> {
        if self.phase == RunPhase::Uninitialized {
            self.init()?;
        }
        match self.phase {
            RunPhase::DryRun => return Ok(self.clock.current()),
            RunPhase::TimeZero => self.solution0()?,
            _ => {}
        }
        self.expect_phase("run", RunPhase::Stepping)?;
        while !self.clock.is_finished() {
            self.step()?;
        }
        tracing::info!(step = self.clock.current().0, "run complete");
        Ok(self.clock.current())
    }

    /// Finalise every local solver and release the sub-group.
    ///
    /// Idempotent. Every solver whose init or restart was called is
    /// finalised, including after a failed [`init`](Self::init).
    pub fn end(&mut self) {
        if self.phase == RunPhase::Finalized {
            return;
        }
        for t in self.registry.locals_mut() {
            if t.started {
                t.solver.end();
                t.started = false;
            }
        }
        if self.group.take().is_some() {
            tracing::debug!("owning sub-group released");
        }
        self.phase = RunPhase::Finalized;
        tracing::info!(step = self.clock.current().0, "coupling finalised");
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Current global step.
    pub fn current_step(&self) -> StepId {
        self.clock.current()
    }

    /// Simulation time of the current step, s.
    pub fn current_time(&self) -> f64 {
        self.clock.current().0 as f64 * self.config.dt
    }

    /// The step clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The run configuration.
    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    /// Ownership tables.
    pub fn allocation(&self) -> &TurbineAllocation {
        self.registry.allocation()
    }

    /// Turbines owned by this rank, in local index order.
    pub fn local_turbines(&self) -> &[TurbineId] {
        self.registry.allocation().local_turbines()
    }

    /// Whether this rank belongs to the owning sub-group.
    pub fn in_subgroup(&self) -> bool {
        self.group.is_some()
    }

    /// The controller bridge.
    pub fn bridge(&self) -> &ControllerBridge {
        &self.bridge
    }

    /// Timings of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// Hub position of any turbine in the farm.
    pub fn hub_position(&self, turbine: TurbineId) -> Result<Vec3, CouplerError> {
        Ok(self.registry.descriptor(turbine)?.hub_pos)
    }

    /// Downwind shaft axis of a local turbine.
    pub fn hub_shaft_direction(&self, turbine: TurbineId) -> Result<Vec3, CouplerError> {
        Ok(self.registry.local(turbine)?.hub_shaft_direction()?)
    }

    /// Node counts of a local turbine.
    pub fn node_counts(&self, turbine: TurbineId) -> Result<NodeCounts, CouplerError> {
        Ok(self.registry.local(turbine)?.counts()?)
    }

    /// Position of a velocity sampling node.
    pub fn velocity_node_position(&self, turbine: TurbineId, node: usize) -> Result<Vec3, CouplerError> {
        Ok(self.registry.local(turbine)?.velocity_node_position(node)?)
    }

    /// Position of a force node.
    pub fn force_node_position(&self, turbine: TurbineId, node: usize) -> Result<Vec3, CouplerError> {
        Ok(self.registry.local(turbine)?.force_node_position(node)?)
    }

    /// Orientation matrix of a force node.
    pub fn force_node_orientation(
        &self,
        turbine: TurbineId,
        node: usize,
    ) -> Result<Orientation, CouplerError> {
        Ok(self.registry.local(turbine)?.force_node_orientation(node)?)
    }

    /// Force exerted on the fluid at a force node.
    pub fn force(&self, turbine: TurbineId, node: usize) -> Result<Vec3, CouplerError> {
        Ok(self.registry.local(turbine)?.force(node)?)
    }

    /// Moment exerted on the fluid at a force node.
    pub fn moment(&self, turbine: TurbineId, node: usize) -> Result<Vec3, CouplerError> {
        Ok(self.registry.local(turbine)?.moment(node)?)
    }

    /// Chord or tower diameter at a force node.
    pub fn chord(&self, turbine: TurbineId, node: usize) -> Result<f64, CouplerError> {
        Ok(self.registry.local(turbine)?.chord(node)?)
    }

    /// Type of a velocity sampling node.
    pub fn velocity_node_type(&self, turbine: TurbineId, node: usize) -> Result<NodeType, CouplerError> {
        Ok(self.registry.local(turbine)?.velocity_node_type(node)?)
    }

    /// Type of a force node.
    pub fn force_node_type(&self, turbine: TurbineId, node: usize) -> Result<NodeType, CouplerError> {
        Ok(self.registry.local(turbine)?.force_node_type(node)?)
    }

    /// Set the inflow velocity at a sampling node.
    pub fn set_velocity(
        &mut self,
        turbine: TurbineId,
        node: usize,
        velocity: Vec3,
    ) -> Result<(), CouplerError> {
        Ok(self.registry.local_mut(turbine)?.set_velocity(node, velocity)?)
    }

    /// Set the inflow velocity at a force node, to be interpolated to the
    /// sampling nodes before the next solver call.
    pub fn set_force_node_velocity(
        &mut self,
        turbine: TurbineId,
        node: usize,
        velocity: Vec3,
    ) -> Result<(), CouplerError> {
        Ok(self
            .registry
            .local_mut(turbine)?
            .set_force_node_velocity(node, velocity)?)
    }

    /// Rotor `(torque, thrust)` of a local turbine.
    pub fn torque_thrust(&self, turbine: TurbineId) -> Result<(Vec3, Vec3), CouplerError> {
        Ok(self.registry.local(turbine)?.torque_thrust()?)
    }
}

fn log_counts(turbine: TurbineId, turb_id: i32, counts: &NodeCounts, message: &str) {
    tracing::info!(
        turbine = turbine.0,
        turb_id,
        blades = counts.num_blades,
        force_nodes = counts.force_layout().len(),
        velocity_nodes = counts.velocity_layout().len(),
        "{message}"
    );
}

impl std::fmt::Debug for Coupler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coupler")
            .field("phase", &self.phase)
            .field("step", &self.clock.current())
            .field("local_turbines", &self.local_turbines())
            .field("bridge", &self.bridge)
            .finish()
    }
}
