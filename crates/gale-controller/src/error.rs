//! Controller errors.

use std::io;

use thiserror::Error;

/// Errors raised while loading or driving a farm controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The controller configuration is unusable.
    #[error("invalid controller configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
    /// An entry point was called before `init()`.
    #[error("controller `{name}` used before init")]
    NotInitialized {
        /// Controller name.
        name: String,
    },
    /// A buffer or restart image has the wrong size.
    #[error("{what}: expected {expected}, got {actual}")]
    Dimension {
        /// Which quantity disagreed.
        what: &'static str,
        /// Size the controller was initialised with.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },
    /// A restart file belongs to a different step.
    #[error("restart file holds step {found}, expected {expected}")]
    StepMismatch {
        /// Step requested.
        expected: u64,
        /// Step stored in the file.
        found: u64,
    },
    /// A restart file does not start with the expected magic bytes.
    #[error("invalid magic bytes (expected b\"GLSC\")")]
    InvalidMagic,
    /// A restart file was written by an unsupported format version.
    #[error("unsupported restart format version {found}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u8,
    },
    /// An externally supplied controller failed.
    #[error("controller `{name}` failed: {reason}")]
    Plugin {
        /// Controller name.
        name: String,
        /// Failure description.
        reason: String,
    },
    /// I/O error reading or writing a restart file.
    #[error("restart file I/O: {0}")]
    Io(#[from] io::Error),
}
