//! Recording farm controller.

use std::sync::{Arc, Mutex};

use gale_controller::{ControllerError, SuperController};
use gale_core::StepId;

/// One call observed by a [`RecordingController`].
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerCall {
    Init {
        n_turbines: usize,
        n_inputs: usize,
        n_outputs: usize,
    },
    Compute {
        inputs: Vec<f64>,
    },
    Update {
        inputs: Vec<f64>,
    },
    WriteRestart(StepId),
    ReadRestart(StepId),
}

/// Shared, cloneable log of controller calls.
#[derive(Clone, Debug, Default)]
pub struct ControllerLog(Arc<Mutex<Vec<ControllerCall>>>);

impl ControllerLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: ControllerCall) {
        self.0.lock().unwrap().push(call);
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<ControllerCall> {
        self.0.lock().unwrap().clone()
    }
}

/// Logs every call and writes `100 * turbine + output` into each output.
pub struct RecordingController {
    log: ControllerLog,
    n_outputs: usize,
}

impl RecordingController {
    pub fn new(log: ControllerLog) -> Self {
        Self { log, n_outputs: 0 }
    }
}

impl SuperController for RecordingController {
    fn name(&self) -> &str {
        "recording"
    }

    fn init(
        &mut self,
        n_turbines: usize,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Result<(), ControllerError> {
        self.n_outputs = n_outputs;
        self.log.push(ControllerCall::Init {
            n_turbines,
            n_inputs,
            n_outputs,
        });
        Ok(())
    }

    fn compute_outputs(
        &mut self,
        inputs: &[f64],
        outputs: &mut [f64],
    ) -> Result<(), ControllerError> {
        self.log.push(ControllerCall::Compute {
            inputs: inputs.to_vec(),
        });
        for (t, row) in outputs.chunks_exact_mut(self.n_outputs).enumerate() {
            for (j, out) in row.iter_mut().enumerate() {
                *out = 100.0 * t as f64 + j as f64;
            }
        }
        Ok(())
    }

    fn update_states(&mut self, inputs: &[f64]) -> Result<(), ControllerError> {
        self.log.push(ControllerCall::Update {
            inputs: inputs.to_vec(),
        });
        Ok(())
    }

    fn write_restart(&mut self, step: StepId) -> Result<(), ControllerError> {
        self.log.push(ControllerCall::WriteRestart(step));
        Ok(())
    }

    fn read_restart(&mut self, step: StepId) -> Result<(), ControllerError> {
        self.log.push(ControllerCall::ReadRestart(step));
        Ok(())
    }
}
