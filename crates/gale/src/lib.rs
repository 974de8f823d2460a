//! Gale: distributed coupling of per-turbine solvers to a flow solver.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Gale sub-crates. For most users, adding `gale` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use gale::prelude::*;
//!
//! let config: CouplingConfig = r#"
//!     t_max = 1.0
//!     dt = 0.1
//!     checkpoint_interval = 5
//!
//!     [[turbines]]
//!     input_file = "t0.fst"
//!     base_pos = [0.0, 0.0, 0.0]
//!     hub_pos = [0.0, 0.0, 90.0]
//!     force_pts_blade = 10
//!
//!     [[turbines]]
//!     input_file = "t1.fst"
//!     base_pos = [500.0, 0.0, 0.0]
//!     hub_pos = [500.0, 0.0, 90.0]
//!     force_pts_blade = 10
//! "#
//! .parse()
//! .unwrap();
//! config.validate().unwrap();
//!
//! // Rank 1 of three owns turbine 1; rank 2 owns nothing.
//! let alloc = TurbineAllocation::round_robin(2, 3, Rank(1)).unwrap();
//! assert_eq!(alloc.local_turbines(), &[TurbineId(1)]);
//! assert_eq!(alloc.owning_ranks(), vec![Rank(0), Rank(1)]);
//! assert_eq!(config.final_step(), StepId(10));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `gale-core` | IDs, geometry, node layouts, turbine descriptors |
//! | [`interp`] | `gale-interp` | Force-to-sampling node interpolation |
//! | [`comm`] | `gale-comm` | Communicator trait and in-process backends |
//! | [`solver`] | `gale-solver` | Turbine solver trait, buffers and statuses |
//! | [`controller`] | `gale-controller` | Farm controllers and their restart files |
//! | [`engine`] | `gale-engine` | Allocation, exchange and the coupling loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and IDs (`gale-core`).
///
/// Contains [`types::TurbineId`], [`types::NodeLayout`] and the fixed node
/// ordering every buffer follows.
pub use gale_core as types;

/// Spatial interpolation (`gale-interp`).
///
/// [`interp::interpolate_turbine`] maps force-node values onto the
/// velocity sampling nodes of one turbine.
pub use gale_interp as interp;

/// Process-group communication (`gale-comm`).
///
/// The [`comm::Communicator`] trait with [`comm::SingleProcess`] and the
/// threaded [`comm::ThreadComm`].
pub use gale_comm as comm;

/// Turbine solver interface (`gale-solver`).
///
/// [`solver::TurbineSolver`] is the main extension point for wrapping an
/// aeroelastic code.
pub use gale_solver as solver;

/// Farm controllers (`gale-controller`).
pub use gale_controller as controller;

/// The coupling engine (`gale-engine`).
///
/// [`engine::Coupler`] drives allocation, time zero, stepping,
/// checkpointing and finalisation on each rank.
pub use gale_engine as engine;

/// Common imports for typical Gale usage.
///
/// ```rust
/// use gale::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use gale_core::{
        NodeCounts, NodeType, Orientation, Rank, StepId, TurbineDescriptor, TurbineId, Vec3,
    };

    // Communication
    pub use gale_comm::{Communicator, SingleProcess, ThreadComm};

    // Solver interface
    pub use gale_solver::{
        Reported, RestartInfo, Severity, SolverFactory, SolverInputs, SolverOutputs, SolverSetup,
        SolverStatus, TurbineSolver,
    };

    // Controllers
    pub use gale_controller::{Controller, ControllerConfig, SuperController};

    // Errors
    pub use gale_comm::CommError;
    pub use gale_controller::ControllerError;
    pub use gale_engine::{ConfigError, CouplerError, CouplingError};
    pub use gale_solver::SolverError;

    // Engine
    pub use gale_engine::{
        Coupler, CouplingConfig, InflowConfig, RunPhase, StepMetrics, StepReport,
        TurbineAllocation,
    };
}
