//! Severity levels and the abort-level check.

use std::fmt;

use gale_core::TurbineId;
use serde::Deserialize;

use crate::error::SolverError;

/// Severity of a solver status, ordered from harmless to fatal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No error.
    #[default]
    None,
    /// Informational message.
    Info,
    /// Warning; results are probably fine.
    Warning,
    /// Severe error; results are suspect.
    Severe,
    /// Fatal error; the solver cannot continue.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Severe => "severe",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// Status returned by every solver entry point.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStatus {
    /// Severity of the condition.
    pub severity: Severity,
    /// Solver-supplied description; empty when `severity` is `None`.
    pub message: String,
}

impl SolverStatus {
    /// A status with no error.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A status with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Classify this status against `abort_level`.
    ///
    /// Statuses at or above the abort level become
    /// [`SolverError::Aborted`]. Anything else that is not
    /// [`Severity::None`] is logged and execution continues.
    pub fn check(self, abort_level: Severity, turbine: TurbineId) -> Result<(), SolverError> {
        if self.severity == Severity::None {
            return Ok(());
        }
        if self.severity >= abort_level {
            return Err(SolverError::Aborted {
                turbine,
                severity: self.severity,
                message: self.message,
            });
        }
        tracing::warn!(
            turbine = turbine.0,
            severity = %self.severity,
            "solver: {}",
            self.message
        );
        Ok(())
    }
}

/// A value returned together with the status of the call that produced it.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Reported<T> {
    /// The returned value. Meaningless if `status` aborts the run.
    pub value: T,
    /// Status of the call.
    pub status: SolverStatus,
}

impl<T> Reported<T> {
    /// A value with an ok status.
    pub fn ok(value: T) -> Self {
        Self {
            value,
            status: SolverStatus::ok(),
        }
    }

    /// Run the status through [`SolverStatus::check`] and return the value.
    pub fn check(self, abort_level: Severity, turbine: TurbineId) -> Result<T, SolverError> {
        self.status.check(abort_level, turbine)?;
        Ok(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::None < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Severe);
        assert!(Severity::Severe < Severity::Fatal);
    }

    #[test]
    fn ok_status_passes_any_level() {
        assert!(SolverStatus::ok().check(Severity::Info, TurbineId(0)).is_ok());
    }

    #[test]
    fn below_abort_level_continues() {
        let status = SolverStatus::new(Severity::Warning, "small dt");
        assert!(status.check(Severity::Severe, TurbineId(3)).is_ok());
    }

    #[test]
    fn at_abort_level_fails_with_message() {
        let status = SolverStatus::new(Severity::Severe, "diverged");
        let err = status.check(Severity::Severe, TurbineId(2)).unwrap_err();
        assert_eq!(
            err,
            SolverError::Aborted {
                turbine: TurbineId(2),
                severity: Severity::Severe,
                message: "diverged".into(),
            }
        );
        assert!(err.to_string().contains("diverged"));
    }

    #[test]
    fn reported_returns_value_when_ok() {
        let r = Reported {
            value: 7u64,
            status: SolverStatus::new(Severity::Info, "restarted"),
        };
        assert_eq!(r.check(Severity::Fatal, TurbineId(0)), Ok(7));
    }

    #[test]
    fn reported_discards_value_on_abort() {
        let r = Reported {
            value: 7u64,
            status: SolverStatus::new(Severity::Fatal, "missing file"),
        };
        assert!(r.check(Severity::Fatal, TurbineId(0)).is_err());
    }
}
