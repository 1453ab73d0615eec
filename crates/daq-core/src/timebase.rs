use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Clock pair for the acquisition core: monotonic microseconds drive scan
/// scheduling, wall-clock microseconds stamp alarm and audit records.
#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    origin: Instant,
}

impl TimeBase {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Monotonic microseconds since this timebase was created.
    pub fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    /// Wall-clock microseconds since the Unix epoch.
    pub fn unix_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let tb = TimeBase::new();
        let a = tb.now_us();
        let b = tb.now_us();
        assert!(b >= a);
    }
}
