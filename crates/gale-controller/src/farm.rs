//! Built-in farm-average controller.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use gale_core::StepId;

use crate::codec::RestartImage;
use crate::controller::SuperController;
use crate::error::ControllerError;

/// Relaxes each input channel toward its farm-wide mean.
///
/// State is one value per input channel. `update_states` moves channel
/// `k` toward the mean of column `k` across turbines by `relaxation`.
/// `compute_outputs` writes channel `j mod n_inputs` into output `j` of
/// every turbine.
#[derive(Clone, Debug)]
pub struct FarmAverage {
    relaxation: f64,
    restart_dir: PathBuf,
    dims: Option<Dims>,
    state: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Dims {
    n_turbines: usize,
    n_inputs: usize,
    n_outputs: usize,
}

impl FarmAverage {
    /// Create an uninitialised controller.
    pub fn new(relaxation: f64, restart_dir: PathBuf) -> Result<Self, ControllerError> {
        if !(relaxation > 0.0 && relaxation <= 1.0) {
            return Err(ControllerError::InvalidConfig {
                reason: format!("relaxation must be in (0, 1], got {relaxation}"),
            });
        }
        Ok(Self {
            relaxation,
            restart_dir,
            dims: None,
            state: Vec::new(),
        })
    }

    /// Current per-channel state.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Path of the restart file for `step`.
    pub fn restart_path(&self, step: StepId) -> PathBuf {
        restart_path(&self.restart_dir, step)
    }

    fn dims(&self) -> Result<Dims, ControllerError> {
        self.dims.ok_or_else(|| ControllerError::NotInitialized {
            name: self.name().to_string(),
        })
    }
}

fn restart_path(dir: &Path, step: StepId) -> PathBuf {
    dir.join(format!("farm_average.{step}.sc"))
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ControllerError> {
    if expected != actual {
        return Err(ControllerError::Dimension {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

impl SuperController for FarmAverage {
    fn name(&self) -> &str {
        "farm_average"
    }

    fn init(
        &mut self,
        n_turbines: usize,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Result<(), ControllerError> {
        if n_turbines == 0 || n_inputs == 0 || n_outputs == 0 {
            return Err(ControllerError::InvalidConfig {
                reason: format!(
                    "farm_average needs turbines, inputs and outputs; got {n_turbines}/{n_inputs}/{n_outputs}"
                ),
            });
        }
        self.dims = Some(Dims {
            n_turbines,
            n_inputs,
            n_outputs,
        });
        self.state = vec![0.0; n_inputs];
        Ok(())
    }

    fn compute_outputs(
        &mut self,
        inputs: &[f64],
        outputs: &mut [f64],
    ) -> Result<(), ControllerError> {
        let d = self.dims()?;
        check_len("controller inputs", d.n_turbines * d.n_inputs, inputs.len())?;
        check_len("controller outputs", d.n_turbines * d.n_outputs, outputs.len())?;
        for row in outputs.chunks_exact_mut(d.n_outputs) {
            for (j, out) in row.iter_mut().enumerate() {
                *out = self.state[j % d.n_inputs];
            }
        }
        Ok(())
    }

    fn update_states(&mut self, inputs: &[f64]) -> Result<(), ControllerError> {
        let d = self.dims()?;
        check_len("controller inputs", d.n_turbines * d.n_inputs, inputs.len())?;
        let mut mean = vec![0.0; d.n_inputs];
        for row in inputs.chunks_exact(d.n_inputs) {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = d.n_turbines as f64;
        for (s, m) in self.state.iter_mut().zip(&mean) {
            *s += self.relaxation * (m / n - *s);
        }
        Ok(())
    }

    fn write_restart(&mut self, step: StepId) -> Result<(), ControllerError> {
        let d = self.dims()?;
        let path = self.restart_path(step);
        let image = RestartImage {
            step,
            n_turbines: d.n_turbines,
            n_inputs: d.n_inputs,
            n_outputs: d.n_outputs,
            state: self.state.clone(),
        };
        let mut w = BufWriter::new(File::create(&path)?);
        image.encode(&mut w)?;
        w.flush()?;
        tracing::info!(path = %path.display(), step = step.0, "controller restart written");
        Ok(())
    }

    fn read_restart(&mut self, step: StepId) -> Result<(), ControllerError> {
        let d = self.dims()?;
        let path = self.restart_path(step);
        let image = RestartImage::decode(&mut BufReader::new(File::open(&path)?))?;
        if image.step != step {
            return Err(ControllerError::StepMismatch {
                expected: step.0,
                found: image.step.0,
            });
        }
        check_len("restart turbines", d.n_turbines, image.n_turbines)?;
        check_len("restart inputs", d.n_inputs, image.n_inputs)?;
        check_len("restart outputs", d.n_outputs, image.n_outputs)?;
        check_len("restart state", d.n_inputs, image.state.len())?;
        self.state = image.state;
        tracing::info!(path = %path.display(), step = step.0, "controller restart read");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(dir: &Path) -> FarmAverage {
        let mut c = FarmAverage::new(0.5, dir.to_path_buf()).unwrap();
        c.init(2, 2, 3).unwrap();
        c
    }

    #[test]
    fn uninitialised_use_fails() {
        let mut c = FarmAverage::new(1.0, PathBuf::from(".")).unwrap();
        assert!(matches!(
            c.update_states(&[1.0]),
            Err(ControllerError::NotInitialized { .. })
        ));
    }

    #[test]
    fn zero_arity_rejected() {
        let mut c = FarmAverage::new(1.0, PathBuf::from(".")).unwrap();
        assert!(c.init(2, 0, 1).is_err());
    }

    #[test]
    fn update_relaxes_toward_column_mean() {
        let mut c = farm(Path::new("."));
        // column means: (1+3)/2 = 2, (10+30)/2 = 20
        c.update_states(&[1.0, 10.0, 3.0, 30.0]).unwrap();
        assert_eq!(c.state(), &[1.0, 10.0]);
        c.update_states(&[1.0, 10.0, 3.0, 30.0]).unwrap();
        assert_eq!(c.state(), &[1.5, 15.0]);
    }

    #[test]
    fn outputs_cycle_through_channels() {
        let mut c = farm(Path::new("."));
        c.update_states(&[2.0, 4.0, 2.0, 4.0]).unwrap();
        let mut out = vec![0.0; 6];
        c.compute_outputs(&[0.0; 4], &mut out).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn wrong_buffer_size_rejected() {
        let mut c = farm(Path::new("."));
        let mut out = vec![0.0; 5];
        assert!(matches!(
            c.compute_outputs(&[0.0; 4], &mut out),
            Err(ControllerError::Dimension { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn restart_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = farm(dir.path());
        a.update_states(&[1.0, 10.0, 3.0, 30.0]).unwrap();
        a.write_restart(StepId(40)).unwrap();
        assert!(dir.path().join("farm_average.40.sc").exists());

        let mut b = farm(dir.path());
        b.read_restart(StepId(40)).unwrap();
        assert_eq!(b.state(), a.state());
    }

    #[test]
    fn restart_with_other_dims_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = farm(dir.path());
        a.write_restart(StepId(5)).unwrap();

        let mut b = FarmAverage::new(0.5, dir.path().to_path_buf()).unwrap();
        b.init(3, 2, 3).unwrap();
        assert!(matches!(
            b.read_restart(StepId(5)),
            Err(ControllerError::Dimension { what: "restart turbines", .. })
        ));
    }

    #[test]
    fn missing_restart_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = farm(dir.path());
        assert!(matches!(
            c.read_restart(StepId(9)),
            Err(ControllerError::Io(_))
        ));
    }
}
