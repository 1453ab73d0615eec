use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("unknown I/O address: {0}")]
    UnknownAddress(String),
}

/// Contract the acquisition core holds with the field device.
///
/// Digital inputs reuse the analog read path; interpreting the result as a
/// discrete level is the caller's job. A read failure is transient from the
/// core's point of view: the sample is skipped and retried on the next due
/// tick. A real transport would wrap timeout/retry around this boundary.
pub trait FieldDevice: Send {
    /// Advance the device's internal process by `dt_s` seconds.
    fn step(&mut self, dt_s: f64);

    fn read_analog(&self, address: &str) -> Result<f64, DeviceError>;

    fn write_output(&mut self, address: &str, value: f64) -> Result<(), DeviceError>;

    fn is_healthy(&self) -> bool;
}
