use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::notify::NotificationChannel;
use crate::registry::TagRegistry;
use crate::tag::Tag;

/// Threshold direction of an alarm definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    High,
    HighHigh,
    Low,
    LowLow,
}

impl AlarmKind {
    /// High-side kinds trip when the value reaches or exceeds the limit,
    /// low-side kinds when it reaches or falls below it.
    pub fn is_high_side(self) -> bool {
        matches!(self, Self::High | Self::HighHigh)
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "HIGH",
            Self::HighHigh => "HIGHHIGH",
            Self::Low => "LOW",
            Self::LowLow => "LOWLOW",
        })
    }
}

/// A configured threshold attached to an analog input tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    pub kind: AlarmKind,
    pub limit: f64,
    pub message: String,
}

impl AlarmDefinition {
    pub fn new(kind: AlarmKind, limit: f64, message: impl Into<String>) -> Self {
        Self {
            kind,
            limit,
            message: message.into(),
        }
    }

    pub fn is_tripped_by(&self, value: f64) -> bool {
        if self.kind.is_high_side() {
            value >= self.limit
        } else {
            value <= self.limit
        }
    }

    /// Identifier encoding kind and limit, e.g. `HIGH@80`.
    pub fn alarm_id(&self) -> String {
        format!("{}@{}", self.kind, self.limit)
    }
}

/// Runtime record of a threshold crossing.
///
/// Published to the notification channel and forgotten; keeping history is
/// the listener's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatedAlarm {
    pub alarm_id: String,
    pub tag_name: String,
    pub message: String,
    /// Monotonic microseconds at the evaluating tick.
    pub timestamp_us: u64,
    /// Wall-clock microseconds since the Unix epoch.
    pub unix_us: u64,
}

/// Evaluates sampled analog-input values against their tag's alarm
/// definitions and publishes one activation per satisfied definition.
///
/// Evaluation is level-triggered: a sample that still satisfies a definition
/// re-fires the same alarm. There is no hysteresis or acknowledgment state.
pub struct AlarmEngine {
    channel: Arc<NotificationChannel>,
}

impl AlarmEngine {
    pub fn new(channel: Arc<NotificationChannel>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<NotificationChannel> {
        &self.channel
    }

    /// Attach a definition to an analog input tag. At most one definition per
    /// (kind, limit) pair may exist on a tag.
    pub fn add_definition(
        &self,
        registry: &mut TagRegistry,
        tag_id: &str,
        kind: AlarmKind,
        limit: f64,
        message: impl Into<String>,
    ) -> Result<(), CoreError> {
        registry.add_alarm_definition(tag_id, AlarmDefinition::new(kind, limit, message))
    }

    /// Remove the definition matching (kind, limit). `false` when there is no
    /// such tag or no such definition.
    pub fn remove_definition(
        &self,
        registry: &mut TagRegistry,
        tag_id: &str,
        kind: AlarmKind,
        limit: f64,
    ) -> bool {
        registry.remove_alarm_definition(tag_id, kind, limit)
    }

    /// Evaluate a fresh sample for the named analog input tag. Returns how
    /// many activations were published.
    pub fn evaluate(
        &self,
        registry: &TagRegistry,
        tag_id: &str,
        value: f64,
        timestamp_us: u64,
        unix_us: u64,
    ) -> Result<usize, CoreError> {
        let tag = registry
            .get(tag_id)
            .ok_or_else(|| CoreError::NotFound(tag_id.to_string()))?;
        if tag.category() != crate::tag::TagCategory::AnalogInput {
            return Err(CoreError::Validation(
                "alarms are only valid on analog input tags".to_string(),
            ));
        }
        Ok(self.evaluate_tag(tag, value, timestamp_us, unix_us))
    }

    /// Evaluate against a tag already in hand (the scheduler's path). Every
    /// activation is published, in definition order, before this returns.
    pub fn evaluate_tag(&self, tag: &Tag, value: f64, timestamp_us: u64, unix_us: u64) -> usize {
        let mut fired = 0;
        for definition in tag.alarms() {
            if definition.is_tripped_by(value) {
                self.channel.publish(&ActivatedAlarm {
                    alarm_id: definition.alarm_id(),
                    tag_name: tag.id().to_string(),
                    message: definition.message.clone(),
                    timestamp_us,
                    unix_us,
                });
                fired += 1;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{TagCategory, TagSpec};
    use std::sync::Mutex;

    fn registry_with_analog_input() -> TagRegistry {
        let mut registry = TagRegistry::new();
        let mut spec = TagSpec::new("FT-101", TagCategory::AnalogInput, "ADDR001");
        spec.high_limit = 100.0;
        spec.units = "m3/h".to_string();
        spec.scan_period_s = 1;
        spec.scan_enabled = true;
        registry.add_tag(spec).unwrap();
        registry
    }

    fn engine_with_log() -> (AlarmEngine, Arc<Mutex<Vec<ActivatedAlarm>>>) {
        let channel = Arc::new(NotificationChannel::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        channel.subscribe("test", move |alarm: &ActivatedAlarm| {
            sink.lock().unwrap().push(alarm.clone());
        });
        (AlarmEngine::new(channel), log)
    }

    #[test]
    fn high_alarm_fires_at_and_above_limit() {
        let mut registry = registry_with_analog_input();
        let (engine, log) = engine_with_log();
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 80.0, "flow high")
            .unwrap();

        for (value, expected) in [(70.0, 0), (85.0, 1), (90.0, 1), (75.0, 0), (80.0, 1)] {
            let fired = engine
                .evaluate(&registry, "FT-101", value, 0, 0)
                .unwrap();
            assert_eq!(fired, expected, "value {value}");
        }
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn low_alarm_fires_at_and_below_limit() {
        let mut registry = registry_with_analog_input();
        let (engine, log) = engine_with_log();
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::Low, 10.0, "flow low")
            .unwrap();

        assert_eq!(engine.evaluate(&registry, "FT-101", 5.0, 0, 0).unwrap(), 1);
        assert_eq!(engine.evaluate(&registry, "FT-101", 10.0, 0, 0).unwrap(), 1);
        assert_eq!(engine.evaluate(&registry, "FT-101", 15.0, 0, 0).unwrap(), 0);

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].alarm_id, "LOW@10");
        assert_eq!(log[0].tag_name, "FT-101");
        assert_eq!(log[0].message, "flow low");
    }

    #[test]
    fn activations_follow_definition_order() {
        let mut registry = registry_with_analog_input();
        let (engine, log) = engine_with_log();
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 80.0, "high")
            .unwrap();
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::HighHigh, 95.0, "very high")
            .unwrap();

        let fired = engine.evaluate(&registry, "FT-101", 97.0, 42, 0).unwrap();
        assert_eq!(fired, 2);

        let log = log.lock().unwrap();
        assert_eq!(log[0].alarm_id, "HIGH@80");
        assert_eq!(log[1].alarm_id, "HIGHHIGH@95");
        assert_eq!(log[1].timestamp_us, 42);
    }

    #[test]
    fn duplicate_kind_limit_pair_rejected() {
        let mut registry = registry_with_analog_input();
        let (engine, _) = engine_with_log();
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 80.0, "first")
            .unwrap();

        let err = engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 80.0, "second")
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAlarm { .. }));

        // Same kind at a different limit is a distinct definition.
        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 90.0, "third")
            .unwrap();
        assert_eq!(registry.get("FT-101").unwrap().alarms().len(), 2);
    }

    #[test]
    fn remove_nonexistent_definition_returns_false() {
        let mut registry = registry_with_analog_input();
        let (engine, _) = engine_with_log();
        assert!(!engine.remove_definition(&mut registry, "FT-101", AlarmKind::High, 80.0));
        assert!(!engine.remove_definition(&mut registry, "NO-SUCH", AlarmKind::High, 80.0));

        engine
            .add_definition(&mut registry, "FT-101", AlarmKind::High, 80.0, "high")
            .unwrap();
        assert!(engine.remove_definition(&mut registry, "FT-101", AlarmKind::High, 80.0));
        assert!(registry.get("FT-101").unwrap().alarms().is_empty());
    }

    #[test]
    fn definitions_rejected_outside_analog_inputs() {
        let mut registry = TagRegistry::new();
        let mut spec = TagSpec::new("LS-201", TagCategory::DigitalInput, "ADDR003");
        spec.scan_period_s = 1;
        spec.scan_enabled = true;
        registry.add_tag(spec).unwrap();

        let (engine, _) = engine_with_log();
        let err = engine
            .add_definition(&mut registry, "LS-201", AlarmKind::High, 0.5, "nope")
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = engine
            .add_definition(&mut registry, "NO-SUCH", AlarmKind::High, 0.5, "nope")
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn evaluate_unknown_tag_is_not_found() {
        let registry = TagRegistry::new();
        let (engine, _) = engine_with_log();
        let err = engine.evaluate(&registry, "NO-SUCH", 1.0, 0, 0).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
