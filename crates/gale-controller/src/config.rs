//! Controller selection in the run configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Which farm controller to run.
///
/// ```toml
/// [controller]
/// kind = "farm_average"
/// relaxation = 0.5
/// restart_dir = "sc"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ControllerConfig {
    /// No farm controller; the bridge does nothing.
    #[default]
    Disabled,
    /// Relaxes each input channel toward its farm-wide mean and feeds
    /// the result back to every turbine. See [`FarmAverage`](crate::FarmAverage).
    FarmAverage {
        /// Relaxation factor in `(0, 1]`.
        relaxation: f64,
        /// Directory restart files are written to and read from.
        #[serde(default = "default_restart_dir")]
        restart_dir: PathBuf,
    },
}

fn default_restart_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ControllerConfig {
    /// Whether a controller will be loaded.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}
