//! Test utilities and mock types for Gale development.
//!
//! Provides a scripted [`MockTurbineSolver`] and its factory, a
//! [`RecordingController`], and descriptor fixtures. Mocks append to a
//! shared log so tests can assert on call order across turbines and
//! threads.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod controller;
pub mod fixtures;
pub mod solver;

pub use controller::{ControllerCall, ControllerLog, RecordingController};
pub use fixtures::{descriptor, farm};
pub use solver::{CallKind, CallLog, MockConfig, MockSolverFactory, MockTurbineSolver, SolverCall};
