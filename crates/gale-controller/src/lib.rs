//! Global wind-farm controller for the Gale coupling layer.
//!
//! A farm controller sees one row of inputs per turbine, gathered from
//! every process, and produces one row of outputs per turbine. The
//! coordinator drives it through the [`SuperController`] trait; the
//! concrete implementation is picked once at startup by
//! [`Controller::load`] from a closed set of variants.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod farm;

pub use codec::RestartImage;
pub use config::ControllerConfig;
pub use controller::{Controller, SuperController};
pub use error::ControllerError;
pub use farm::FarmAverage;

/// Magic bytes at the start of every controller restart file.
pub const MAGIC: [u8; 4] = *b"GLSC";

/// Current restart file format version.
pub const FORMAT_VERSION: u8 = 1;
