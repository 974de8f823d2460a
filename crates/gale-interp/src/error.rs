//! Interpolation errors.

use gale_core::{LayoutError, NodeType};
use thiserror::Error;

/// Inputs to an interpolation call were inconsistent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InterpError {
    /// A buffer length disagrees with the node count it must match.
    #[error("{what}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        /// Which buffer was wrong.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// Sampling nodes exist on a segment that has no force nodes.
    #[error("no force nodes on {segment:?} to interpolate {samples} sampling nodes from")]
    EmptySegment {
        /// The segment lacking force nodes.
        segment: NodeType,
        /// Number of sampling nodes that needed values.
        samples: usize,
    },
    /// The two node sets disagree on the blade count.
    #[error("force nodes describe {force} blades but sampling nodes describe {velocity}")]
    BladeCountMismatch {
        /// Blade count of the force node set.
        force: usize,
        /// Blade count of the sampling node set.
        velocity: usize,
    },
    /// A segment could not be resolved in the node layout.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
