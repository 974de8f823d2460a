//! Layout addressing errors.

use thiserror::Error;

/// A node or blade index fell outside a turbine's [`NodeLayout`](crate::NodeLayout).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Node index is past the end of the node set.
    #[error("node {node} out of range for a node set of {len} nodes")]
    NodeOutOfRange {
        /// The offending node index.
        node: usize,
        /// Number of nodes in the set.
        len: usize,
    },
    /// Blade index is not below the blade count.
    #[error("blade {blade} out of range ({num_blades} blades)")]
    BladeOutOfRange {
        /// The offending blade index.
        blade: usize,
        /// Number of blades on the turbine.
        num_blades: usize,
    },
}
