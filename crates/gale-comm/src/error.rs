//! Communication errors.

use thiserror::Error;

/// Errors from collective operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommError {
    /// The member list passed to `subgroup()` was malformed.
    #[error("invalid sub-group: {reason}")]
    InvalidGroup {
        /// What was wrong with the member list.
        reason: String,
    },
    /// Ranks contributed buffers of different lengths to a reduction.
    #[error("rank {rank} contributed {actual} values to a reduction of {expected}")]
    LengthMismatch {
        /// Rank whose buffer disagreed with the root's.
        rank: usize,
        /// Length of the root's buffer.
        expected: usize,
        /// Length of the offending buffer.
        actual: usize,
    },
    /// A peer dropped its end of the group mid-collective.
    #[error("peer disconnected during collective on rank {rank}")]
    Disconnected {
        /// The rank that observed the disconnect.
        rank: usize,
    },
    /// Shared group state was poisoned by a panic on another rank.
    #[error("group state poisoned by a panicked rank")]
    Poisoned,
}
