//! Solver failures surfaced to the coordinator.

use gale_core::TurbineId;
use thiserror::Error;

use crate::status::Severity;

/// A solver call failed at or above the configured abort level, or a
/// solver could not be created.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolverError {
    /// A solver reported a status at or above the abort level.
    #[error("solver for turbine {turbine} failed ({severity}): {message}")]
    Aborted {
        /// Turbine whose solver reported the failure.
        turbine: TurbineId,
        /// Reported severity.
        severity: Severity,
        /// Message supplied by the solver.
        message: String,
    },
    /// The factory could not produce a solver instance.
    #[error("cannot create solver for turbine {turbine}: {reason}")]
    Create {
        /// Turbine the solver was requested for.
        turbine: TurbineId,
        /// Why creation failed.
        reason: String,
    },
}
