//! Core types for the Gale turbine coupling layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by every other Gale crate: strongly-typed indices,
//! geometry aliases, the hub/blade/tower node layout, per-turbine
//! descriptors, and layout errors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod turbine;

pub use error::LayoutError;
pub use geometry::{Orientation, Vec3};
pub use id::{LocalIndex, Rank, StepId, TurbineId};
pub use layout::{NodeCounts, NodeLayout, NodeType};
pub use turbine::TurbineDescriptor;
