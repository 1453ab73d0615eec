use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use crate::device::{DeviceError, FieldDevice};

/// Signal shape generated for a simulated input address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `offset + amplitude * sin(2π t / period_s)`.
    Sine {
        amplitude: f64,
        period_s: f64,
        offset: f64,
    },
    /// Ramp from 0 to `span`, wrapping every `period_s`.
    Sawtooth { span: f64, period_s: f64 },
    /// 0/1 toggling every half `period_s`; digital-style point.
    Square { period_s: f64 },
    Constant(f64),
}

impl Waveform {
    fn sample(&self, t_s: f64) -> f64 {
        match *self {
            Self::Sine {
                amplitude,
                period_s,
                offset,
            } => offset + amplitude * (TAU * t_s / period_s).sin(),
            Self::Sawtooth { span, period_s } => span * (t_s % period_s) / period_s,
            Self::Square { period_s } => {
                if (t_s % period_s) < period_s / 2.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Constant(v) => v,
        }
    }
}

/// In-process stand-in for the field device.
///
/// A fixed address map of waveform generators is advanced by [`step`];
/// writing an address latches the written value, which overrides the
/// generator on subsequent reads (a held output register). Only the
/// read/write contract is load-bearing; the waveform shapes are arbitrary.
///
/// [`step`]: FieldDevice::step
#[derive(Debug, Clone)]
pub struct SimulatedPlc {
    elapsed_s: f64,
    points: BTreeMap<String, Waveform>,
    written: HashMap<String, f64>,
}

impl SimulatedPlc {
    pub fn new() -> Self {
        let mut points = BTreeMap::new();
        points.insert(
            "ADDR001".to_string(),
            Waveform::Sine {
                amplitude: 50.0,
                period_s: 60.0,
                offset: 50.0,
            },
        );
        points.insert(
            "ADDR002".to_string(),
            Waveform::Sawtooth {
                span: 10.0,
                period_s: 30.0,
            },
        );
        points.insert("ADDR003".to_string(), Waveform::Square { period_s: 10.0 });
        points.insert(
            "ADDR004".to_string(),
            Waveform::Sine {
                amplitude: 2.0,
                period_s: 15.0,
                offset: 4.0,
            },
        );
        Self {
            elapsed_s: 0.0,
            points,
            written: HashMap::new(),
        }
    }

    /// Register (or replace) a generated input point.
    pub fn insert_point(&mut self, address: impl Into<String>, waveform: Waveform) {
        self.points.insert(address.into(), waveform);
    }

    /// Addresses with a configured generator, in address order.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }
}

impl Default for SimulatedPlc {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldDevice for SimulatedPlc {
    fn step(&mut self, dt_s: f64) {
        self.elapsed_s += dt_s.max(0.0);
    }

    fn read_analog(&self, address: &str) -> Result<f64, DeviceError> {
        if let Some(value) = self.written.get(address) {
            return Ok(*value);
        }
        self.points
            .get(address)
            .map(|w| w.sample(self.elapsed_s))
            .ok_or_else(|| DeviceError::UnknownAddress(address.to_string()))
    }

    fn write_output(&mut self, address: &str, value: f64) -> Result<(), DeviceError> {
        self.written.insert(address.to_string(), value);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.elapsed_s.is_finite()
    }
}
