//! Process-group communication for the Gale coupling layer.
//!
//! The coordinator needs exactly two collective operations from its
//! process group: carving out a sub-group of the ranks that own turbines,
//! and an element-wise sum all-reduce within that sub-group. Both sit
//! behind the object-safe [`Communicator`] trait so the coordinator is
//! agnostic to the transport.
//!
//! Backends:
//! - [`SingleProcess`]: one rank, every collective is a no-op.
//! - [`ThreadComm`]: N ranks as threads of one process, wired with
//!   `crossbeam-channel`. Used for multi-rank runs without an external
//!   launcher and throughout the test suite.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod single;
pub mod thread;

pub use error::CommError;
pub use single::SingleProcess;
pub use thread::ThreadComm;

use gale_core::Rank;

/// A member's handle on a fixed-size group of cooperating processes.
///
/// All methods except [`rank`](Self::rank) and [`size`](Self::size) are
/// collective: every rank of the group must call them in the same order
/// with compatible arguments, or the group deadlocks.
pub trait Communicator: Send {
    /// This member's rank, in `0..size()`.
    fn rank(&self) -> Rank;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Build a communicator over the listed ranks of this group.
    ///
    /// `members` must be non-empty, strictly ascending and in range. The
    /// new group ranks members by their position in `members`. Ranks not
    /// listed receive `Ok(None)` and must never issue collectives on the
    /// sub-group.
    fn subgroup(&self, members: &[Rank]) -> Result<Option<Box<dyn Communicator>>, CommError>;

    /// Element-wise sum of `buf` across all ranks, in place.
    ///
    /// On return every rank holds the bit-identical sum. All ranks must
    /// pass buffers of the same length.
    fn all_reduce_sum(&self, buf: &mut [f64]) -> Result<(), CommError>;

    /// Whether this member is rank 0 of the group.
    fn is_root(&self) -> bool {
        self.rank() == Rank(0)
    }
}

/// Check the `members` argument of [`Communicator::subgroup`].
pub(crate) fn validate_members(members: &[Rank], size: usize) -> Result<(), CommError> {
    if members.is_empty() {
        return Err(CommError::InvalidGroup {
            reason: "sub-group has no members".to_string(),
        });
    }
    if let Some(r) = members.iter().find(|r| r.0 >= size) {
        return Err(CommError::InvalidGroup {
            reason: format!("rank {r} outside group of size {size}"),
        });
    }
    if members.windows(2).any(|w| w[0] >= w[1]) {
        return Err(CommError::InvalidGroup {
            reason: "members must be strictly ascending".to_string(),
        });
    }
    Ok(())
}
