use thiserror::Error;

use crate::alarm::AlarmKind;
use crate::device::DeviceError;

/// Errors reported synchronously by the mutating operations of the core.
///
/// None of these are fatal: a failed mutation leaves the registry unchanged,
/// and nothing in this taxonomy can abort a scan tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("tag id already exists: {0}")]
    DuplicateId(String),

    #[error("alarm ({kind} @ {limit}) already defined on tag {tag}")]
    DuplicateAlarm {
        tag: String,
        kind: AlarmKind,
        limit: f64,
    },

    #[error("no such tag: {0}")]
    NotFound(String),

    #[error("tag is not an output: {0}")]
    NotAnOutput(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
