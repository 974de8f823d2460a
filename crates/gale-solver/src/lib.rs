//! Per-turbine solver interface for the Gale coupling layer.
//!
//! Each turbine is advanced by an opaque structural/aero-elastic solver.
//! This crate defines the [`TurbineSolver`] trait the coordinator drives,
//! the flat input/output buffers exchanged with it, and the severity
//! classification every solver status passes through.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffers;
pub mod error;
pub mod solver;
pub mod status;

pub use buffers::{SolverInputs, SolverOutputs};
pub use error::SolverError;
pub use solver::{RestartInfo, SolverFactory, SolverSetup, TurbineSolver};
pub use status::{Reported, Severity, SolverStatus};
