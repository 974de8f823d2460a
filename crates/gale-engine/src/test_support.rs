//! Helpers shared by unit tests in this crate.

use gale_core::LocalIndex;
use gale_solver::{SolverSetup, TurbineSolver};
use gale_test_utils::{descriptor, CallLog, MockConfig, MockTurbineSolver};

use crate::exchange::LocalTurbine;

/// A mock turbine `id`, initialised and bound with the given controller
/// arity.
pub(crate) fn bound_turbine(id: usize, n_inputs: usize, n_outputs: usize) -> LocalTurbine {
    let d = descriptor(id);
    let mut solver = MockTurbineSolver::new(d.clone(), MockConfig::default(), CallLog::new());
    let setup = SolverSetup {
        turbine: &d,
        t_max: 1.0,
        dt: 0.1,
        n_controller_inputs: n_inputs,
        n_controller_outputs: n_outputs,
    };
    let counts = solver.init(&setup).value;
    let mut t = LocalTurbine::new(d, LocalIndex(0), Box::new(solver));
    t.bind(counts, n_inputs, n_outputs).unwrap();
    t
}
