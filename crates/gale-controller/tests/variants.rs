//! Driving controllers through the closed `Controller` set.

use gale_controller::{Controller, ControllerConfig, ControllerError, SuperController};
use gale_core::StepId;

/// Outputs each turbine's first input doubled.
struct Doubler {
    n_inputs: usize,
    n_outputs: usize,
}

impl SuperController for Doubler {
    fn name(&self) -> &str {
        "doubler"
    }

    fn init(&mut self, _n: usize, n_inputs: usize, n_outputs: usize) -> Result<(), ControllerError> {
        self.n_inputs = n_inputs;
        self.n_outputs = n_outputs;
        Ok(())
    }

    fn compute_outputs(&mut self, inputs: &[f64], outputs: &mut [f64]) -> Result<(), ControllerError> {
        for (row_in, row_out) in inputs
            .chunks_exact(self.n_inputs)
            .zip(outputs.chunks_exact_mut(self.n_outputs))
        {
            row_out.fill(2.0 * row_in[0]);
        }
        Ok(())
    }

    fn update_states(&mut self, _inputs: &[f64]) -> Result<(), ControllerError> {
        Ok(())
    }

    fn write_restart(&mut self, _step: StepId) -> Result<(), ControllerError> {
        Err(ControllerError::Plugin {
            name: "doubler".into(),
            reason: "stateless".into(),
        })
    }

    fn read_restart(&mut self, _step: StepId) -> Result<(), ControllerError> {
        Ok(())
    }
}

#[test]
fn external_controller_is_driven_through_dyn() {
    let mut c = Controller::external(Box::new(Doubler {
        n_inputs: 0,
        n_outputs: 0,
    }));
    assert!(c.is_enabled());
    assert_eq!(c.name(), "doubler");

    let sc = c.as_dyn_mut().unwrap();
    sc.init(2, 1, 2).unwrap();
    let mut out = vec![0.0; 4];
    sc.compute_outputs(&[1.5, -1.0], &mut out).unwrap();
    assert_eq!(out, vec![3.0, 3.0, -2.0, -2.0]);
    assert!(sc.write_restart(StepId(1)).is_err());
}

#[test]
fn farm_average_round_trips_through_restart_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = ControllerConfig::FarmAverage {
        relaxation: 1.0,
        restart_dir: dir.path().to_path_buf(),
    };

    let mut first = Controller::load(&config).unwrap();
    let sc = first.as_dyn_mut().unwrap();
    sc.init(2, 1, 1).unwrap();
    sc.update_states(&[4.0, 6.0]).unwrap();
    sc.write_restart(StepId(10)).unwrap();

    let mut second = Controller::load(&config).unwrap();
    let sc = second.as_dyn_mut().unwrap();
    sc.init(2, 1, 1).unwrap();
    sc.read_restart(StepId(10)).unwrap();
    let mut out = vec![0.0; 2];
    sc.compute_outputs(&[0.0, 0.0], &mut out).unwrap();
    assert_eq!(out, vec![5.0, 5.0]);
}
