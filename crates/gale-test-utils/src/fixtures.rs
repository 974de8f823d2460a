//! Turbine descriptor fixtures.

use std::path::PathBuf;

use gale_core::{TurbineDescriptor, TurbineId};

/// A turbine on a 500 m grid along x with a 90 m hub.
pub fn descriptor(id: usize) -> TurbineDescriptor {
    let x = 500.0 * id as f64;
    TurbineDescriptor {
        id: TurbineId(id),
        turb_id: id as i32 + 1,
        input_file: PathBuf::from(format!("t{id}.fst")),
        restart_file: PathBuf::from(format!("t{id}.chkp")),
        base_pos: [x, 0.0, 0.0],
        hub_pos: [x, 0.0, 90.0],
        force_pts_blade: 3,
        force_pts_tower: 2,
    }
}

/// `n` turbines built with [`descriptor`].
pub fn farm(n: usize) -> Vec<TurbineDescriptor> {
    (0..n).map(descriptor).collect()
}
