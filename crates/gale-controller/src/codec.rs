//! Binary restart image for built-in controllers.
//!
//! Layout, all integers little-endian:
//!
//! | field        | type        |
//! |--------------|-------------|
//! | magic        | `b"GLSC"`   |
//! | version      | `u8`        |
//! | step         | `u64`       |
//! | n_turbines   | `u32`       |
//! | n_inputs     | `u32`       |
//! | n_outputs    | `u32`       |
//! | state length | `u32`       |
//! | state        | `f64` × len |

use std::io::{Read, Write};

use gale_core::StepId;

use crate::error::ControllerError;
use crate::{FORMAT_VERSION, MAGIC};

/// Controller state as persisted at a checkpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct RestartImage {
    /// Step the image was written at.
    pub step: StepId,
    /// Number of turbines the controller was initialised for.
    pub n_turbines: usize,
    /// Inputs per turbine.
    pub n_inputs: usize,
    /// Outputs per turbine.
    pub n_outputs: usize,
    /// Controller-defined internal state.
    pub state: Vec<f64>,
}

fn write_u32_le(w: &mut dyn Write, v: usize) -> Result<(), ControllerError> {
    let v = u32::try_from(v).map_err(|_| ControllerError::InvalidConfig {
        reason: format!("dimension {v} does not fit the restart format"),
    })?;
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u32_le(r: &mut dyn Read) -> Result<usize, ControllerError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf) as usize)
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, ControllerError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

impl RestartImage {
    /// Serialize the image.
    pub fn encode(&self, w: &mut dyn Write) -> Result<(), ControllerError> {
        w.write_all(&MAGIC)?;
        w.write_all(&[FORMAT_VERSION])?;
        w.write_all(&self.step.0.to_le_bytes())?;
        write_u32_le(w, self.n_turbines)?;
        write_u32_le(w, self.n_inputs)?;
        write_u32_le(w, self.n_outputs)?;
        write_u32_le(w, self.state.len())?;
        for v in &self.state {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    /// Deserialize an image, checking magic and version.
    pub fn decode(r: &mut dyn Read) -> Result<Self, ControllerError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(ControllerError::InvalidMagic);
        }
        let mut version = [0u8; 1];
        r.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(ControllerError::UnsupportedVersion { found: version[0] });
        }

        let step = StepId(read_u64_le(r)?);
        let n_turbines = read_u32_le(r)?;
        let n_inputs = read_u32_le(r)?;
        let n_outputs = read_u32_le(r)?;
        let len = read_u32_le(r)?;
        let mut state = Vec::with_capacity(len.min(1 << 16));
        let mut buf = [0u8; 8];
        for _ in 0..len {
            r.read_exact(&mut buf)?;
            state.push(f64::from_le_bytes(buf));
        }
        Ok(Self {
            step,
            n_turbines,
            n_inputs,
            n_outputs,
            state,
        })
    }
}
