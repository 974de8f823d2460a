//! Error types for the coupling coordinator.

use std::io;
use std::path::PathBuf;

use gale_comm::CommError;
use gale_controller::ControllerError;
use gale_core::{LayoutError, Rank, StepId, TurbineId};
use gale_interp::InterpError;
use gale_solver::SolverError;
use thiserror::Error;

use crate::coupler::RunPhase;

/// Configuration rejected at load or validation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The configuration is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// No turbines were configured.
    #[error("no turbines configured")]
    NoTurbines,
    /// A time parameter is out of range.
    #[error("invalid {field}: {value}")]
    InvalidTime {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The checkpoint interval is zero.
    #[error("checkpoint_interval must be at least 1")]
    CheckpointIntervalZero,
    /// An enabled controller has no inputs or no outputs.
    #[error("controller needs inputs and outputs, got {n_inputs}/{n_outputs}")]
    ControllerArity {
        /// Configured inputs per turbine.
        n_inputs: usize,
        /// Configured outputs per turbine.
        n_outputs: usize,
    },
    /// A turbine entry is unusable.
    #[error("turbine {index}: {reason}")]
    InvalidTurbine {
        /// Position in the turbine list.
        index: usize,
        /// What was wrong.
        reason: String,
    },
    /// The inflow profile is unusable.
    #[error("invalid inflow: {reason}")]
    InvalidInflow {
        /// What was wrong.
        reason: String,
    },
}

/// Addressing and buffer contract violations.
#[derive(Debug, Error)]
pub enum CouplingError {
    /// The farm has no turbines.
    #[error("cannot allocate an empty farm")]
    NoTurbines,
    /// The process group description is inconsistent.
    #[error("rank {rank} is outside a group of size {size}")]
    InvalidWorld {
        /// Reported rank.
        rank: Rank,
        /// Reported group size.
        size: usize,
    },
    /// The turbine index is outside the farm.
    #[error("turbine {turbine} does not exist (farm has {n_turbines})")]
    UnknownTurbine {
        /// Requested turbine.
        turbine: TurbineId,
        /// Farm size.
        n_turbines: usize,
    },
    /// The turbine is owned by another rank.
    #[error("turbine {turbine} is not owned by rank {rank}")]
    NotLocallyOwned {
        /// Requested turbine.
        turbine: TurbineId,
        /// Rank that received the request.
        rank: Rank,
    },
    /// The turbine's solver has not reported node counts yet.
    #[error("turbine {turbine} is not initialised")]
    NotInitialized {
        /// Requested turbine.
        turbine: TurbineId,
    },
    /// A node index is past the end of its node set.
    #[error("turbine {turbine}: node {node} out of range ({len} nodes)")]
    NodeOutOfRange {
        /// Turbine addressed.
        turbine: TurbineId,
        /// Requested node.
        node: usize,
        /// Size of the node set.
        len: usize,
    },
    /// A solver buffer does not match the declared node counts.
    #[error("turbine {turbine}: {buffer} has {actual} entries, expected {expected}")]
    BufferLength {
        /// Turbine whose buffer is wrong.
        turbine: TurbineId,
        /// Buffer name.
        buffer: &'static str,
        /// Length implied by the node counts.
        expected: usize,
        /// Length found.
        actual: usize,
    },
    /// Interpolation from force nodes to sampling nodes failed.
    #[error("turbine {turbine}: {source}")]
    Interp {
        /// Turbine being interpolated.
        turbine: TurbineId,
        /// Underlying error.
        #[source]
        source: InterpError,
    },
    /// Node classification failed.
    #[error("turbine {turbine}: {source}")]
    Layout {
        /// Turbine addressed.
        turbine: TurbineId,
        /// Underlying error.
        #[source]
        source: LayoutError,
    },
}

/// Any failure of the coupling run.
#[derive(Debug, Error)]
pub enum CouplerError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Addressing or buffer contract violation.
    #[error(transparent)]
    Coupling(#[from] CouplingError),
    /// A solver failed at or above the abort level.
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// The farm controller failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),
    /// A collective operation failed.
    #[error(transparent)]
    Comm(#[from] CommError),
    /// Local turbines restarted from checkpoints of different steps.
    #[error("turbine {turbine} restarted at step {found}, others at {expected}")]
    RestartStepMismatch {
        /// Turbine that disagreed.
        turbine: TurbineId,
        /// Step recovered by the first local turbine.
        expected: StepId,
        /// Step recovered by `turbine`.
        found: StepId,
    },
    /// Ranks of the owning sub-group restarted from different steps.
    #[error("sub-group rank {rank} restarted at step {found}, rank 0 at {expected}")]
    RankStepMismatch {
        /// Sub-group rank that disagreed.
        rank: Rank,
        /// Step recovered by sub-group rank 0.
        expected: StepId,
        /// Step recovered by `rank`.
        found: StepId,
    },
    /// Another sub-group rank could not settle on a restart step.
    #[error("sub-group rank {rank} failed to agree on a restart step")]
    PeerRestartFailed {
        /// Sub-group rank that failed.
        rank: Rank,
    },
    /// An operation was called in the wrong run phase.
    #[error("{operation} is not valid in phase {phase:?}")]
    InvalidPhase {
        /// Operation attempted.
        operation: &'static str,
        /// Phase the coupler was in.
        phase: RunPhase,
    },
    /// Writing a diagnostic report failed.
    #[error("cannot write {}: {source}", path.display())]
    Report {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}
