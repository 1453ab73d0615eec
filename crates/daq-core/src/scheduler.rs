use std::collections::HashMap;

use crate::alarm::AlarmEngine;
use crate::device::FieldDevice;
use crate::registry::TagRegistry;
use crate::tag::TagCategory;

/// Cumulative counters across the scheduler's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub ticks: u64,
    pub samples_taken: u64,
    pub read_failures: u64,
    pub alarms_raised: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickSummary {
    pub sampled: usize,
    pub read_failures: usize,
    pub alarms_raised: usize,
}

/// Samples every enabled input tag at its own cadence from one shared tick.
///
/// Last-sample bookkeeping is private to the scheduler and keyed by tag id.
/// Entries for tags that have since been removed are ignored and swept on
/// [`ScanScheduler::prune`]; callers that remove tags should also call
/// [`ScanScheduler::forget`].
#[derive(Debug, Default)]
pub struct ScanScheduler {
    last_sample_us: HashMap<String, u64>,
    stats: ScanStats,
}

impl ScanScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one scan pass at monotonic time `now_us`.
    ///
    /// Eligible tags (input category, scanning enabled, nonzero period) are
    /// sampled when never sampled before or when a full period has elapsed.
    /// A device read failure skips that tag for this tick without advancing
    /// its last-sample time; the sweep continues with the remaining tags.
    /// Analog-input samples are handed to the alarm engine before the tick
    /// completes for that tag.
    pub fn tick(
        &mut self,
        now_us: u64,
        unix_us: u64,
        registry: &mut TagRegistry,
        device: &dyn FieldDevice,
        engine: &AlarmEngine,
    ) -> TickSummary {
        let mut summary = TickSummary::default();
        self.stats.ticks += 1;

        for id in registry.tag_ids() {
            let Some(tag) = registry.get(&id) else {
                continue;
            };
            let category = tag.category();
            let Some(scan) = tag.scan() else {
                continue;
            };
            if !scan.enabled || scan.period_s == 0 {
                continue;
            }

            let due = match self.last_sample_us.get(&id) {
                None => true,
                Some(&last) => now_us.saturating_sub(last) >= u64::from(scan.period_s) * 1_000_000,
            };
            if !due {
                continue;
            }

            let raw = match device.read_analog(tag.io_address()) {
                Ok(v) => v,
                Err(err) => {
                    log::warn!("scan of {id} skipped: {err}");
                    summary.read_failures += 1;
                    self.stats.read_failures += 1;
                    continue;
                }
            };

            // Digital inputs share the analog read path; interpret the raw
            // level as a discrete 0/1.
            let value = if category.is_digital() {
                if raw >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            } else {
                raw
            };

            self.last_sample_us.insert(id.clone(), now_us);
            registry.record_sample(&id, value);
            summary.sampled += 1;
            self.stats.samples_taken += 1;

            if category == TagCategory::AnalogInput {
                if let Some(tag) = registry.get(&id) {
                    let fired = engine.evaluate_tag(tag, value, now_us, unix_us);
                    summary.alarms_raised += fired;
                    self.stats.alarms_raised += fired as u64;
                }
            }
        }

        summary
    }

    /// Drop the bookkeeping entry for a removed tag.
    pub fn forget(&mut self, tag_id: &str) {
        self.last_sample_us.remove(tag_id);
    }

    /// Sweep bookkeeping entries whose tag no longer exists.
    pub fn prune(&mut self, registry: &TagRegistry) {
        self.last_sample_us
            .retain(|id, _| registry.get(id).is_some());
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}
