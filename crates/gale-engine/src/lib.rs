//! Distributed coupling coordinator for per-turbine solvers.
//!
//! A [`Coupler`] runs on every rank of a process group. At construction it
//! assigns turbines to ranks round-robin ([`TurbineAllocation`]), forms the
//! sub-group of ranks that own turbines and creates a solver for each
//! local turbine ([`TurbineRegistry`]). It then drives the solvers in
//! lockstep with the flow solver that calls it:
//!
//! - [`LocalTurbine`] exchanges velocities, forces, positions and
//!   orientations with each solver, interpolating between node sets when
//!   velocities are supplied at force nodes.
//! - [`ControllerBridge`] feeds the farm controller a globally consistent
//!   input array, reduced across the owning sub-group.
//! - [`SimClock`] tracks the step counter and checkpoint cadence.
//!
//! ```no_run
//! use gale_comm::SingleProcess;
//! use gale_engine::{Coupler, CouplingConfig};
//! # fn factory() -> Box<dyn gale_solver::SolverFactory> { unimplemented!() }
//!
//! let config = CouplingConfig::from_file("gale.toml").unwrap();
//! let mut coupler = Coupler::from_config(config, &SingleProcess, factory().as_ref()).unwrap();
//! coupler.run().unwrap();
//! coupler.end();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod coupler;
pub mod error;
pub mod exchange;
pub mod metrics;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use alloc::TurbineAllocation;
pub use bridge::ControllerBridge;
pub use clock::SimClock;
pub use config::{CouplingConfig, InflowConfig, TurbineConfig};
pub use coupler::{Coupler, RunPhase, StepReport};
pub use error::{ConfigError, CouplerError, CouplingError};
pub use exchange::LocalTurbine;
pub use metrics::StepMetrics;
pub use registry::TurbineRegistry;
