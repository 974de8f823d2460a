//! Arc-length interpolation between turbine node sets.
//!
//! A turbine exposes two node sets along each blade and the tower: a
//! sparse set of force nodes and a denser set of velocity sampling nodes.
//! Field values known at the force nodes are carried to the sampling
//! nodes by reducing each blade (or the tower) to a 1-D problem:
//!
//! 1. [`radial_parameters`] measures every node's Euclidean distance from
//!    the first node of its segment (blade root, tower bottom).
//! 2. [`BracketSearch`] finds the pair of force nodes whose parameters
//!    enclose each sampling parameter.
//! 3. [`interpolate_segment`] blends the two bracketing values linearly.
//!
//! [`interpolate_turbine`] applies this to a whole turbine, copying the
//! hub node through untouched.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bracket;
pub mod error;
pub mod segment;
pub mod turbine;

pub use bracket::{Bracket, BracketSearch};
pub use error::InterpError;
pub use segment::{interpolate_segment, radial_parameters};
pub use turbine::interpolate_turbine;
