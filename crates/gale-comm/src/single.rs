//! Single-rank communicator.

use gale_core::Rank;

use crate::error::CommError;
use crate::{validate_members, Communicator};

/// A group containing only the calling process.
///
/// Reductions leave the buffer untouched: the local contribution already
/// is the global sum.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> Rank {
        Rank(0)
    }

    fn size(&self) -> usize {
        1
    }

    fn subgroup(&self, members: &[Rank]) -> Result<Option<Box<dyn Communicator>>, CommError> {
        validate_members(members, 1)?;
        Ok(Some(Box::new(SingleProcess)))
    }

    fn all_reduce_sum(&self, _buf: &mut [f64]) -> Result<(), CommError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_process_is_rank_zero_of_one() {
        let c = SingleProcess;
        assert_eq!(c.rank(), Rank(0));
        assert_eq!(c.size(), 1);
        assert!(c.is_root());
    }

    #[test]
    fn reduce_leaves_buffer_unchanged() {
        let mut buf = [1.5, -2.0, 0.0];
        SingleProcess.all_reduce_sum(&mut buf).unwrap();
        assert_eq!(buf, [1.5, -2.0, 0.0]);
    }

    #[test]
    fn subgroup_of_self() {
        let sub = SingleProcess.subgroup(&[Rank(0)]).unwrap().unwrap();
        assert_eq!(sub.size(), 1);
    }

    #[test]
    fn subgroup_rejects_foreign_ranks() {
        assert!(matches!(
            SingleProcess.subgroup(&[Rank(1)]),
            Err(CommError::InvalidGroup { .. })
        ));
        assert!(matches!(
            SingleProcess.subgroup(&[]),
            Err(CommError::InvalidGroup { .. })
        ));
    }
}
