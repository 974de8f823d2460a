//! Run configuration: [`CouplingConfig`], loaded from TOML and validated
//! before a [`Coupler`](crate::Coupler) is built.
//!
//! ```toml
//! t_start = 0.0
//! t_max = 10.0
//! dt = 0.01
//! checkpoint_interval = 100
//!
//! [[turbines]]
//! input_file = "t0.fst"
//! restart_file = "t0.chkp"
//! base_pos = [0.0, 0.0, 0.0]
//! hub_pos = [0.0, 0.0, 90.0]
//! force_pts_blade = 20
//! force_pts_tower = 10
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use gale_controller::ControllerConfig;
use gale_core::{StepId, TurbineDescriptor, TurbineId, Vec3};
use gale_solver::Severity;
use serde::Deserialize;

use crate::error::ConfigError;

/// One turbine entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurbineConfig {
    /// User-facing turbine number. Defaults to the list position.
    #[serde(default)]
    pub turb_id: Option<i32>,
    /// Solver input file.
    pub input_file: PathBuf,
    /// Checkpoint root used on restart.
    #[serde(default)]
    pub restart_file: PathBuf,
    /// Tower base position.
    pub base_pos: Vec3,
    /// Hub position.
    pub hub_pos: Vec3,
    /// Force nodes per blade.
    pub force_pts_blade: usize,
    /// Force nodes on the tower.
    #[serde(default)]
    pub force_pts_tower: usize,
}

/// Where sampling-node velocities come from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum InflowConfig {
    /// `u = ref_speed * (z / ref_height)^exponent`, `v = w = 0`.
    PowerLaw {
        /// Speed at the reference height, m/s.
        #[serde(default = "default_ref_speed")]
        ref_speed: f64,
        /// Reference height, m.
        #[serde(default = "default_ref_height")]
        ref_height: f64,
        /// Shear exponent.
        #[serde(default = "default_exponent")]
        exponent: f64,
    },
    /// Velocities are supplied by the caller each step.
    External,
}

fn default_ref_speed() -> f64 {
    10.0
}

fn default_ref_height() -> f64 {
    90.0
}

fn default_exponent() -> f64 {
    0.2
}

impl Default for InflowConfig {
    fn default() -> Self {
        Self::PowerLaw {
            ref_speed: default_ref_speed(),
            ref_height: default_ref_height(),
            exponent: default_exponent(),
        }
    }
}

impl InflowConfig {
    /// Prescribed velocity at `position`, or `None` for external inflow.
    ///
    /// Points at or below the ground get zero velocity.
    pub fn velocity_at(&self, position: Vec3) -> Option<Vec3> {
        match *self {
            Self::PowerLaw {
                ref_speed,
                ref_height,
                exponent,
            } => {
                let z = position[2];
                let u = if z > 0.0 {
                    ref_speed * (z / ref_height).powf(exponent)
                } else {
                    0.0
                };
                Some([u, 0.0, 0.0])
            }
            Self::External => None,
        }
    }
}

/// Complete configuration of a coupling run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouplingConfig {
    /// Turbines in global index order.
    pub turbines: Vec<TurbineConfig>,
    /// Start time, s. Positive values restart from checkpoints.
    #[serde(default)]
    pub t_start: f64,
    /// End time, s.
    pub t_max: f64,
    /// Coupling time step, s.
    pub dt: f64,
    /// Steps between checkpoints.
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,
    /// Solver statuses at or above this severity end the run.
    #[serde(default = "default_abort_level")]
    pub abort_level: Severity,
    /// Allocate and log only; never advance a solver.
    #[serde(default)]
    pub dry_run: bool,
    /// Log per-node data and dump actuator forces.
    #[serde(default)]
    pub debug: bool,
    /// Directory for per-step actuator force dumps when `debug` is set.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
    /// Directory for per-rank allocation reports.
    #[serde(default)]
    pub allocation_report_dir: Option<PathBuf>,
    /// Farm controller.
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Controller inputs per turbine.
    #[serde(default)]
    pub num_inputs: usize,
    /// Controller outputs per turbine.
    #[serde(default)]
    pub num_outputs: usize,
    /// Inflow model.
    #[serde(default)]
    pub inflow: InflowConfig,
}

fn default_checkpoint_interval() -> u64 {
    1
}

fn default_abort_level() -> Severity {
    Severity::Fatal
}

impl FromStr for CouplingConfig {
    type Err = ConfigError;

    /// Parse a configuration from TOML without validating it.
    fn from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl CouplingConfig {
    /// Read, parse and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turbines.is_empty() {
            return Err(ConfigError::NoTurbines);
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTime {
                field: "dt",
                value: self.dt,
            });
        }
        if !self.t_start.is_finite() || self.t_start < 0.0 {
            return Err(ConfigError::InvalidTime {
                field: "t_start",
                value: self.t_start,
            });
        }
        if !self.t_max.is_finite() || self.t_max < self.t_start {
            return Err(ConfigError::InvalidTime {
                field: "t_max",
                value: self.t_max,
            });
        }
        if self.checkpoint_interval == 0 {
            return Err(ConfigError::CheckpointIntervalZero);
        }
        if self.controller.is_enabled() && (self.num_inputs == 0 || self.num_outputs == 0) {
            return Err(ConfigError::ControllerArity {
                n_inputs: self.num_inputs,
                n_outputs: self.num_outputs,
            });
        }
        for (index, t) in self.turbines.iter().enumerate() {
            t.validate()
                .map_err(|reason| ConfigError::InvalidTurbine { index, reason })?;
        }
        if let InflowConfig::PowerLaw {
            ref_speed,
            ref_height,
            exponent,
        } = self.inflow
        {
            if !ref_speed.is_finite() || !exponent.is_finite() {
                return Err(ConfigError::InvalidInflow {
                    reason: "ref_speed and exponent must be finite".into(),
                });
            }
            if !ref_height.is_finite() || ref_height <= 0.0 {
                return Err(ConfigError::InvalidInflow {
                    reason: format!("ref_height must be positive, got {ref_height}"),
                });
            }
        }
        Ok(())
    }

    /// Step the run starts at: `round(t_start / dt)`.
    pub fn start_step(&self) -> StepId {
        StepId((self.t_start / self.dt).round() as u64)
    }

    /// Step the run ends at: `round(t_max / dt)`.
    pub fn final_step(&self) -> StepId {
        StepId((self.t_max / self.dt).round() as u64)
    }

    /// Whether the run resumes from checkpoints.
    pub fn is_restart(&self) -> bool {
        self.start_step().0 > 0
    }

    /// Controller inputs and outputs per turbine; `(0, 0)` when the
    /// controller in use is disabled. An external controller may be
    /// enabled while `[controller]` is not.
    pub fn controller_arity(&self, enabled: bool) -> (usize, usize) {
        if enabled {
            (self.num_inputs, self.num_outputs)
        } else {
            (0, 0)
        }
    }

    /// Descriptors for every turbine, in global index order.
    pub fn descriptors(&self) -> Vec<TurbineDescriptor> {
        self.turbines
            .iter()
            .enumerate()
            .map(|(i, t)| TurbineDescriptor {
                id: TurbineId(i),
                turb_id: t.turb_id.unwrap_or(i as i32),
                input_file: t.input_file.clone(),
                restart_file: t.restart_file.clone(),
                base_pos: t.base_pos,
                hub_pos: t.hub_pos,
                force_pts_blade: t.force_pts_blade,
                force_pts_tower: t.force_pts_tower,
            })
            .collect()
    }
}

impl TurbineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.force_pts_blade == 0 {
            return Err("force_pts_blade must be at least 1".into());
        }
        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        if !finite(&self.base_pos) || !finite(&self.hub_pos) {
            return Err("positions must be finite".into());
        }
        if self.input_file.as_os_str().is_empty() {
            return Err("input_file is empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        t_max = 1.0
        dt = 0.1

        [[turbines]]
        input_file = "a.fst"
        base_pos = [0.0, 0.0, 0.0]
        hub_pos = [0.0, 0.0, 90.0]
        force_pts_blade = 10
    "#;

    fn minimal() -> CouplingConfig {
        MINIMAL.parse().unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = minimal();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.checkpoint_interval, 1);
        assert_eq!(cfg.abort_level, Severity::Fatal);
        assert_eq!(cfg.controller, ControllerConfig::Disabled);
        assert_eq!(cfg.inflow, InflowConfig::default());
        assert!(!cfg.is_restart());
        assert_eq!(cfg.final_step(), StepId(10));
        assert_eq!(cfg.controller_arity(cfg.controller.is_enabled()), (0, 0));
    }

    #[test]
    fn full_config_parses() {
        let cfg: CouplingConfig = r#"
            t_start = 2.0
            t_max = 4.0
            dt = 0.5
            checkpoint_interval = 2
            abort_level = "severe"
            debug = true
            num_inputs = 2
            num_outputs = 1

            [controller]
            kind = "farm_average"
            relaxation = 0.25

            [inflow]
            kind = "external"

            [[turbines]]
            turb_id = 7
            input_file = "a.fst"
            restart_file = "a.chkp"
            base_pos = [1.0, 2.0, 0.0]
            hub_pos = [1.0, 2.0, 80.0]
            force_pts_blade = 5
            force_pts_tower = 3
        "#
        .parse()
        .unwrap();
        assert!(cfg.validate().is_ok());
        assert!(cfg.is_restart());
        assert_eq!(cfg.start_step(), StepId(4));
        assert_eq!(cfg.final_step(), StepId(8));
        assert_eq!(cfg.abort_level, Severity::Severe);
        assert_eq!(cfg.controller_arity(cfg.controller.is_enabled()), (2, 1));
        assert_eq!(cfg.controller_arity(false), (0, 0));
        assert_eq!(cfg.inflow, InflowConfig::External);

        let d = &cfg.descriptors()[0];
        assert_eq!(d.id, TurbineId(0));
        assert_eq!(d.turb_id, 7);
        assert_eq!(d.restart_file, PathBuf::from("a.chkp"));
        assert_eq!(d.force_pts_tower, 3);
    }

    #[test]
    fn unknown_field_rejected() {
        let text = format!("{MINIMAL}\nsurprise = 1\n");
        assert!(matches!(
            text.parse::<CouplingConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_farm_rejected() {
        let mut cfg = minimal();
        cfg.turbines.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoTurbines)));
    }

    #[test]
    fn bad_times_rejected() {
        let mut cfg = minimal();
        cfg.dt = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTime { field: "dt", .. })
        ));

        let mut cfg = minimal();
        cfg.t_max = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTime { field: "t_max", .. })
        ));

        let mut cfg = minimal();
        cfg.t_start = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTime { field: "t_start", .. })
        ));
    }

    #[test]
    fn zero_checkpoint_interval_rejected() {
        let mut cfg = minimal();
        cfg.checkpoint_interval = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::CheckpointIntervalZero)
        ));
    }

    #[test]
    fn enabled_controller_needs_arity() {
        let mut cfg = minimal();
        cfg.controller = ControllerConfig::FarmAverage {
            relaxation: 0.5,
            restart_dir: PathBuf::from("."),
        };
        cfg.num_inputs = 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ControllerArity {
                n_inputs: 1,
                n_outputs: 0
            })
        ));
    }

    #[test]
    fn turbine_without_blade_nodes_rejected() {
        let mut cfg = minimal();
        cfg.turbines[0].force_pts_blade = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTurbine { index: 0, .. })
        ));
    }

    #[test]
    fn power_law_profile() {
        let inflow = InflowConfig::default();
        assert_eq!(inflow.velocity_at([0.0, 0.0, 90.0]), Some([10.0, 0.0, 0.0]));
        let u = inflow.velocity_at([5.0, 5.0, 45.0]).unwrap()[0];
        assert!((u - 10.0 * 0.5f64.powf(0.2)).abs() < 1e-12);
        assert_eq!(inflow.velocity_at([0.0, 0.0, -1.0]), Some([0.0, 0.0, 0.0]));
        assert_eq!(InflowConfig::External.velocity_at([0.0, 0.0, 90.0]), None);
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{MINIMAL}").unwrap();
        let cfg = CouplingConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.turbines.len(), 1);
    }

    #[test]
    fn from_file_missing() {
        assert!(matches!(
            CouplingConfig::from_file("/nonexistent/gale.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
