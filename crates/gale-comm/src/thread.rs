//! In-process communicator: one rank per thread.
//!
//! Reductions are gathered at rank 0, summed in ascending rank order and
//! broadcast back, so every rank receives the same bits regardless of
//! message arrival order.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};
use gale_core::Rank;

use crate::error::CommError;
use crate::{validate_members, Communicator};

struct Contribution {
    rank: usize,
    data: Vec<f64>,
}

type Reply = Result<Vec<f64>, CommError>;

/// Channel endpoints shared by all members of one group.
#[derive(Clone)]
struct Wiring {
    to_root: Sender<Contribution>,
    root_inbox: Receiver<Contribution>,
    to_members: Vec<Sender<Reply>>,
    inboxes: Vec<Receiver<Reply>>,
}

impl Wiring {
    fn new(size: usize) -> Self {
        let (to_root, root_inbox) = unbounded();
        let (to_members, inboxes) = (0..size).map(|_| unbounded()).unzip();
        Self {
            to_root,
            root_inbox,
            to_members,
            inboxes,
        }
    }
}

/// Sub-groups under construction, keyed by the parent group's lineage,
/// its split sequence number and the member list. An entry is removed once every member has
/// claimed its endpoints.
#[derive(Default)]
struct SplitTable {
    pending: HashMap<(Vec<u64>, Vec<usize>), (Wiring, usize)>,
}

/// One rank of an in-process group.
///
/// Create a whole group with [`ThreadComm::group`] and move each member
/// to its own thread.
///
/// ```
/// use gale_comm::{Communicator, ThreadComm};
///
/// let handles: Vec<_> = ThreadComm::group(3)
///     .into_iter()
///     .map(|comm| {
///         std::thread::spawn(move || {
///             let mut buf = [comm.rank().0 as f64];
///             comm.all_reduce_sum(&mut buf).unwrap();
///             buf[0]
///         })
///     })
///     .collect();
/// for h in handles {
///     assert_eq!(h.join().unwrap(), 3.0);
/// }
/// ```
pub struct ThreadComm {
    rank: usize,
    wiring: Wiring,
    splits: Arc<Mutex<SplitTable>>,
    lineage: Vec<u64>,
    split_seq: Cell<u64>,
}

impl ThreadComm {
    /// Create all `size` members of a new group, in rank order.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let wiring = Wiring::new(size);
        let splits = Arc::new(Mutex::new(SplitTable::default()));
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                wiring: wiring.clone(),
                splits: Arc::clone(&splits),
                lineage: Vec::new(),
                split_seq: Cell::new(0),
            })
            .collect()
    }

    fn size_of(&self) -> usize {
        self.wiring.inboxes.len()
    }

    fn reduce_at_root(&self, buf: &mut [f64]) -> Result<(), CommError> {
        let size = self.size_of();
        let mut parts: Vec<Option<Vec<f64>>> = vec![None; size];
        let mut failure = None;
        for _ in 1..size {
            let c = self
                .wiring
                .root_inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: self.rank })?;
            if c.data.len() != buf.len() && failure.is_none() {
                failure = Some(CommError::LengthMismatch {
                    rank: c.rank,
                    expected: buf.len(),
                    actual: c.data.len(),
                });
            }
            parts[c.rank] = Some(c.data);
        }

        let reply: Reply = match failure {
            Some(e) => Err(e),
            None => {
                parts[0] = Some(buf.to_vec());
                let mut sum = vec![0.0; buf.len()];
                for part in parts.iter().flatten() {
                    for (s, v) in sum.iter_mut().zip(part) {
                        *s += v;
                    }
                }
                Ok(sum)
            }
        };

        for tx in &self.wiring.to_members[1..] {
            tx.send(reply.clone())
                .map_err(|_| CommError::Disconnected { rank: self.rank })?;
        }
        buf.copy_from_slice(&reply?);
        Ok(())
    }

    fn reduce_at_member(&self, buf: &mut [f64]) -> Result<(), CommError> {
        self.wiring
            .to_root
            .send(Contribution {
                rank: self.rank,
                data: buf.to_vec(),
            })
            .map_err(|_| CommError::Disconnected { rank: self.rank })?;
        let sum = self.wiring.inboxes[self.rank]
            .recv()
            .map_err(|_| CommError::Disconnected { rank: self.rank })??;
        buf.copy_from_slice(&sum);
        Ok(())
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> Rank {
        Rank(self.rank)
    }

    fn size(&self) -> usize {
        self.size_of()
    }

    fn subgroup(&self, members: &[Rank]) -> Result<Option<Box<dyn Communicator>>, CommError> {
        validate_members(members, self.size_of())?;
        let seq = self.split_seq.get();
        self.split_seq.set(seq + 1);

        let Some(position) = members.iter().position(|r| r.0 == self.rank) else {
            return Ok(None);
        };

        let mut lineage = self.lineage.clone();
        lineage.push(seq);
        let key = (lineage.clone(), members.iter().map(|r| r.0).collect::<Vec<_>>());
        let wiring = {
            let mut table = self.splits.lock().map_err(|_| CommError::Poisoned)?;
            let entry = table
                .pending
                .entry(key.clone())
                .or_insert_with(|| (Wiring::new(members.len()), 0));
            entry.1 += 1;
            let wiring = entry.0.clone();
            if entry.1 == members.len() {
                table.pending.remove(&key);
            }
            wiring
        };

        Ok(Some(Box::new(ThreadComm {
            rank: position,
            wiring,
            splits: Arc::clone(&self.splits),
            lineage,
            split_seq: Cell::new(0),
        })))
    }

    fn all_reduce_sum(&self, buf: &mut [f64]) -> Result<(), CommError> {
        match (self.size_of(), self.rank) {
            (1, _) => Ok(()),
            (_, 0) => self.reduce_at_root(buf),
            _ => self.reduce_at_member(buf),
        }
    }
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.size_of())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn run<T, F>(size: usize, f: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(ThreadComm) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let handles: Vec<_> = ThreadComm::group(size)
            .into_iter()
            .map(|comm| {
                let f = Arc::clone(&f);
                thread::spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn group_ranks_are_ordered() {
        let group = ThreadComm::group(4);
        let ranks: Vec<_> = group.iter().map(|c| c.rank().0).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert!(group.iter().all(|c| c.size() == 4));
        assert!(group[0].is_root());
        assert!(!group[1].is_root());
    }

    #[test]
    fn single_member_reduce_is_identity() {
        let comm = ThreadComm::group(1).pop().unwrap();
        let mut buf = [1.5, -2.0];
        comm.all_reduce_sum(&mut buf).unwrap();
        assert_eq!(buf, [1.5, -2.0]);
    }

    #[test]
    fn reduce_sums_every_element() {
        let results = run(3, |comm| {
            let r = comm.rank().0 as f64;
            let mut buf = [r, 10.0 * r, 1.0];
            comm.all_reduce_sum(&mut buf).unwrap();
            buf
        });
        for buf in results {
            assert_eq!(buf, [3.0, 30.0, 3.0]);
        }
    }

    #[test]
    fn successive_reductions_stay_in_step() {
        let results = run(3, |comm| {
            let mut totals = Vec::new();
            for round in 0..5 {
                let mut buf = [round as f64 + comm.rank().0 as f64];
                comm.all_reduce_sum(&mut buf).unwrap();
                totals.push(buf[0]);
            }
            totals
        });
        let expected: Vec<f64> = (0..5).map(|r| 3.0 * r as f64 + 3.0).collect();
        for totals in results {
            assert_eq!(totals, expected);
        }
    }

    #[test]
    fn mismatched_lengths_fail_everywhere() {
        let results = run(2, |comm| {
            let mut buf = vec![1.0; 2 + comm.rank().0];
            comm.all_reduce_sum(&mut buf)
        });
        for r in results {
            assert!(matches!(
                r,
                Err(CommError::LengthMismatch {
                    rank: 1,
                    expected: 2,
                    actual: 3
                })
            ));
        }
    }

    #[test]
    fn subgroup_excludes_non_members() {
        let results = run(3, |comm| {
            let sub = comm.subgroup(&[Rank(0), Rank(2)]).unwrap();
            match sub {
                None => None,
                Some(sub) => {
                    let mut buf = [comm.rank().0 as f64 + 1.0];
                    sub.all_reduce_sum(&mut buf).unwrap();
                    Some((sub.rank().0, sub.size(), buf[0]))
                }
            }
        });
        assert_eq!(results[0], Some((0, 2, 4.0)));
        assert_eq!(results[1], None);
        assert_eq!(results[2], Some((1, 2, 4.0)));
    }

    #[test]
    fn nested_subgroups_reduce() {
        let results = run(4, |comm| {
            let Some(sub) = comm.subgroup(&[Rank(1), Rank(2), Rank(3)]).unwrap() else {
                return None;
            };
            let Some(inner) = sub.subgroup(&[Rank(1), Rank(2)]).unwrap() else {
                return Some(0.0);
            };
            let mut buf = [comm.rank().0 as f64];
            inner.all_reduce_sum(&mut buf).unwrap();
            Some(buf[0])
        });
        assert_eq!(results, vec![None, Some(0.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn subgroup_rejects_bad_members() {
        let comm = ThreadComm::group(2).pop().unwrap();
        assert!(comm.subgroup(&[]).is_err());
        assert!(comm.subgroup(&[Rank(2)]).is_err());
        assert!(comm.subgroup(&[Rank(1), Rank(0)]).is_err());
    }
}
