//! The [`SuperController`] trait and the [`Controller`] variants.

use gale_core::StepId;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::farm::FarmAverage;

/// A farm-level controller driven once per coupling step.
///
/// Inputs and outputs are flat row-major arrays: row `t` holds turbine
/// `t`'s values. Every process calls the controller redundantly with
/// identical inputs, so implementations must be deterministic.
pub trait SuperController: Send {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Size internal state for the given farm.
    fn init(
        &mut self,
        n_turbines: usize,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Result<(), ControllerError>;

    /// Compute the global output array from the current state and the
    /// most recently gathered inputs.
    fn compute_outputs(&mut self, inputs: &[f64], outputs: &mut [f64])
        -> Result<(), ControllerError>;

    /// Advance internal state by one step.
    fn update_states(&mut self, inputs: &[f64]) -> Result<(), ControllerError>;

    /// Persist state for `step`.
    fn write_restart(&mut self, step: StepId) -> Result<(), ControllerError>;

    /// Restore state persisted at `step`. Called after `init()`.
    fn read_restart(&mut self, step: StepId) -> Result<(), ControllerError>;
}

/// The controller selected for a run.
pub enum Controller {
    /// No controller: every operation is skipped.
    Noop,
    /// The built-in farm-average controller.
    FarmAverage(FarmAverage),
    /// A caller-supplied implementation.
    External(Box<dyn SuperController>),
}

impl Controller {
    /// Build the controller named by `config`.
    pub fn load(config: &ControllerConfig) -> Result<Self, ControllerError> {
        let controller = match config {
            ControllerConfig::Disabled => Self::Noop,
            ControllerConfig::FarmAverage {
                relaxation,
                restart_dir,
            } => Self::FarmAverage(FarmAverage::new(*relaxation, restart_dir.clone())?),
        };
        tracing::debug!(controller = controller.name(), "controller loaded");
        Ok(controller)
    }

    /// Wrap a caller-supplied implementation.
    pub fn external(inner: Box<dyn SuperController>) -> Self {
        Self::External(inner)
    }

    /// Whether this is anything other than [`Controller::Noop`].
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Noop)
    }

    /// The active implementation, if any.
    pub fn as_dyn_mut(&mut self) -> Option<&mut dyn SuperController> {
        match self {
            Self::Noop => None,
            Self::FarmAverage(c) => Some(c),
            Self::External(c) => Some(c.as_mut()),
        }
    }

    /// The active implementation as a trait object, if any.
    pub fn into_dyn(self) -> Option<Box<dyn SuperController>> {
        match self {
            Self::Noop => None,
            Self::FarmAverage(c) => Some(Box::new(c)),
            Self::External(c) => Some(c),
        }
    }

    /// Name of the active implementation, `"noop"` when disabled.
    pub fn name(&self) -> &str {
        match self {
            Self::Noop => "noop",
            Self::FarmAverage(c) => c.name(),
            Self::External(c) => c.name(),
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Controller").field(&self.name()).finish()
    }
}
