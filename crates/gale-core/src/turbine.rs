//! Static per-turbine metadata.

use std::path::PathBuf;

use crate::geometry::Vec3;
use crate::id::TurbineId;

/// Immutable description of one turbine, built once from configuration.
///
/// Every process holds the descriptor of every turbine, indexed by
/// [`TurbineId`]; only the owning process creates a solver for it.
#[derive(Clone, Debug, PartialEq)]
pub struct TurbineDescriptor {
    /// Global index (position in the configuration list).
    pub id: TurbineId,
    /// User-facing turbine number passed through to the solver.
    pub turb_id: i32,
    /// Solver input file.
    pub input_file: PathBuf,
    /// Checkpoint root used on restart.
    pub restart_file: PathBuf,
    /// Tower base position.
    pub base_pos: Vec3,
    /// Hub position.
    pub hub_pos: Vec3,
    /// Requested force nodes per blade.
    pub force_pts_blade: usize,
    /// Requested force nodes on the tower.
    pub force_pts_tower: usize,
}
