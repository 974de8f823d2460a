#![allow(dead_code)]

use gale_engine::{CouplingConfig, InflowConfig, TurbineConfig};
use gale_test_utils::descriptor;

/// `n` turbines matching `gale_test_utils::descriptor`, 10 steps of 0.1 s.
pub fn config(n: usize) -> CouplingConfig {
    let turbines = (0..n)
        .map(|i| {
            let d = descriptor(i);
            TurbineConfig {
                turb_id: Some(d.turb_id),
                input_file: d.input_file,
                restart_file: d.restart_file,
                base_pos: d.base_pos,
                hub_pos: d.hub_pos,
                force_pts_blade: d.force_pts_blade,
                force_pts_tower: d.force_pts_tower,
            }
        })
        .collect();
    CouplingConfig {
        turbines,
        t_start: 0.0,
        t_max: 1.0,
        dt: 0.1,
        checkpoint_interval: 4,
        abort_level: gale_solver::Severity::Fatal,
        dry_run: false,
        debug: false,
        debug_dir: None,
        allocation_report_dir: None,
        controller: Default::default(),
        num_inputs: 0,
        num_outputs: 0,
        inflow: InflowConfig::default(),
    }
}
