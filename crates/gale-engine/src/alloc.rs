//! Round-robin turbine-to-rank allocation.
//!
//! Turbine `i` is owned by rank `i mod P`. The assignment depends only on
//! the farm size and group size, so a restarted run reproduces it
//! exactly.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use gale_core::{LocalIndex, Rank, TurbineId};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::CouplingError;

/// Ownership of every turbine, seen from one rank.
#[derive(Clone, Debug)]
pub struct TurbineAllocation {
    rank: Rank,
    world_size: usize,
    owners: Vec<Rank>,
    local_to_global: SmallVec<[TurbineId; 8]>,
    global_to_local: IndexMap<TurbineId, LocalIndex>,
}

impl TurbineAllocation {
    /// Assign `n_turbines` turbines to `world_size` ranks, as seen from `rank`.
    pub fn round_robin(
        n_turbines: usize,
        world_size: usize,
        rank: Rank,
    ) -> Result<Self, CouplingError> {
        if n_turbines == 0 {
            return Err(CouplingError::NoTurbines);
        }
        if rank.0 >= world_size {
            return Err(CouplingError::InvalidWorld {
                rank,
                size: world_size,
            });
        }

        let owners: Vec<Rank> = (0..n_turbines).map(|i| Rank(i % world_size)).collect();
        let local_to_global: SmallVec<[TurbineId; 8]> = owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == rank)
            .map(|(i, _)| TurbineId(i))
            .collect();
        let global_to_local = local_to_global
            .iter()
            .enumerate()
            .map(|(local, global)| (*global, LocalIndex(local)))
            .collect();

        Ok(Self {
            rank,
            world_size,
            owners,
            local_to_global,
            global_to_local,
        })
    }

    /// The rank this view belongs to.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Size of the full process group.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// Number of turbines in the farm.
    pub fn num_global(&self) -> usize {
        self.owners.len()
    }

    /// Number of turbines owned by this rank.
    pub fn num_local(&self) -> usize {
        self.local_to_global.len()
    }

    /// Owning rank of `turbine`, if it exists.
    pub fn owner(&self, turbine: TurbineId) -> Option<Rank> {
        self.owners.get(turbine.0).copied()
    }

    /// Local index of `turbine` on this rank, if owned here.
    pub fn local_index(&self, turbine: TurbineId) -> Option<LocalIndex> {
        self.global_to_local.get(&turbine).copied()
    }

    /// Global turbines owned by this rank, in local index order.
    pub fn local_turbines(&self) -> &[TurbineId] {
        &self.local_to_global
    }

    /// Ranks that own at least one turbine, ascending.
    pub fn owning_ranks(&self) -> Vec<Rank> {
        (0..self.world_size.min(self.owners.len()))
            .map(Rank)
            .collect()
    }

    /// Whether this rank owns any turbine.
    pub fn owns_any(&self) -> bool {
        !self.local_to_global.is_empty()
    }

    /// Human-readable `local -> global` summary.
    pub fn report(&self) -> String {
        let mut s = format!(
            "rank {}: {} of {} turbines\n",
            self.rank,
            self.num_local(),
            self.num_global()
        );
        for (global, local) in &self.global_to_local {
            // Writing to a String cannot fail.
            let _ = writeln!(s, "  local {local} -> global {global}");
        }
        s
    }

    /// Where [`write_report`](Self::write_report) puts this rank's report.
    pub fn report_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("turbine_alloc.{}.txt", self.rank))
    }

    /// Write [`report`](Self::report) to `<dir>/turbine_alloc.<rank>.txt`.
    pub fn write_report(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = self.report_path(dir);
        std::fs::write(&path, self.report())?;
        Ok(path)
    }
}
