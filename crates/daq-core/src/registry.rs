use std::collections::BTreeMap;

use crate::alarm::{AlarmDefinition, AlarmKind};
use crate::error::CoreError;
use crate::tag::{Tag, TagCategory, TagSpec};

/// Owns the id -> tag mapping and enforces the per-category construction
/// rules. Iteration order is the tag id order, so snapshots and scan sweeps
/// are deterministic.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: BTreeMap<String, Tag>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a tag. A failed call leaves the registry unchanged.
    pub fn add_tag(&mut self, spec: TagSpec) -> Result<(), CoreError> {
        if self.tags.contains_key(&spec.id) {
            return Err(CoreError::DuplicateId(spec.id));
        }
        let tag = Tag::from_spec(spec)?;
        log::debug!("tag added: {} ({:?})", tag.id(), tag.category());
        self.tags.insert(tag.id().to_string(), tag);
        Ok(())
    }

    /// Remove a tag and, implicitly, any alarm definitions it owns.
    pub fn remove_tag(&mut self, id: &str) -> bool {
        let removed = self.tags.remove(id).is_some();
        if removed {
            log::debug!("tag removed: {id}");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Ids in iteration order. The scheduler sweeps over this so it can take
    /// per-tag mutable borrows inside the loop.
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Write a value to an output tag. Returns the tag's I/O address so the
    /// caller can forward the write to the field device. Fails without
    /// touching the tag when `id` does not name an output.
    pub fn set_output_value(&mut self, id: &str, value: f64) -> Result<String, CoreError> {
        if !value.is_finite() {
            return Err(CoreError::Validation(
                "output value must be finite".to_string(),
            ));
        }
        let tag = self
            .tags
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        match tag.category() {
            TagCategory::DigitalOutput => tag.set_value(value),
            TagCategory::AnalogOutput => {
                tag.set_value(value);
                tag.set_initial_value(value);
            }
            _ => return Err(CoreError::NotAnOutput(id.to_string())),
        }
        Ok(tag.io_address().to_string())
    }

    /// Store a freshly scanned input sample.
    pub(crate) fn record_sample(&mut self, id: &str, value: f64) {
        if let Some(tag) = self.tags.get_mut(id) {
            tag.set_value(value);
        }
    }

    /// Attach an alarm definition to an analog input tag. At most one
    /// definition per (kind, limit) pair.
    pub fn add_alarm_definition(
        &mut self,
        tag_id: &str,
        definition: AlarmDefinition,
    ) -> Result<(), CoreError> {
        let tag = self
            .tags
            .get_mut(tag_id)
            .ok_or_else(|| CoreError::NotFound(tag_id.to_string()))?;
        let alarms = tag.alarms_mut().ok_or_else(|| {
            CoreError::Validation("alarms are only valid on analog input tags".to_string())
        })?;
        if alarms
            .iter()
            .any(|a| a.kind == definition.kind && a.limit == definition.limit)
        {
            return Err(CoreError::DuplicateAlarm {
                tag: tag_id.to_string(),
                kind: definition.kind,
                limit: definition.limit,
            });
        }
        alarms.push(definition);
        Ok(())
    }

    /// Remove the definition matching (kind, limit). `false` when nothing
    /// matched, including an unknown or non-analog-input tag.
    pub fn remove_alarm_definition(&mut self, tag_id: &str, kind: AlarmKind, limit: f64) -> bool {
        let Some(tag) = self.tags.get_mut(tag_id) else {
            return false;
        };
        let Some(alarms) = tag.alarms_mut() else {
            return false;
        };
        let before = alarms.len();
        alarms.retain(|a| !(a.kind == kind && a.limit == limit));
        alarms.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analog_output(id: &str) -> TagSpec {
        let mut spec = TagSpec::new(id, TagCategory::AnalogOutput, "ADDR011");
        spec.high_limit = 100.0;
        spec.units = "%".to_string();
        spec.initial_value = 25.0;
        spec
    }

    #[test]
    fn duplicate_id_rejected_and_registry_unchanged() {
        let mut registry = TagRegistry::new();
        registry.add_tag(analog_output("VLV-302")).unwrap();

        let mut second = analog_output("VLV-302");
        second.io_address = "ADDR012".to_string();
        let err = registry.add_tag(second).unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("VLV-302".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("VLV-302").unwrap().io_address(), "ADDR011");
    }

    #[test]
    fn invalid_spec_leaves_registry_unchanged() {
        let mut registry = TagRegistry::new();
        let mut spec = TagSpec::new("DI-1", TagCategory::DigitalInput, "ADDR003");
        spec.units = "bar".to_string();
        assert!(registry.add_tag(spec).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = TagRegistry::new();
        registry.add_tag(analog_output("VLV-302")).unwrap();
        assert!(registry.remove_tag("VLV-302"));
        assert!(!registry.remove_tag("VLV-302"));
        assert!(registry.is_empty());
    }

    #[test]
    fn set_output_value_on_outputs() {
        let mut registry = TagRegistry::new();
        registry.add_tag(analog_output("VLV-302")).unwrap();
        registry
            .add_tag(TagSpec::new("PUMP-301", TagCategory::DigitalOutput, "ADDR010"))
            .unwrap();

        let addr = registry.set_output_value("VLV-302", 60.0).unwrap();
        assert_eq!(addr, "ADDR011");
        let tag = registry.get("VLV-302").unwrap();
        assert_eq!(tag.value(), 60.0);
        assert_eq!(tag.initial_value(), Some(60.0));

        let addr = registry.set_output_value("PUMP-301", 1.0).unwrap();
        assert_eq!(addr, "ADDR010");
        assert_eq!(registry.get("PUMP-301").unwrap().value(), 1.0);
    }

    #[test]
    fn set_output_value_rejects_inputs() {
        let mut registry = TagRegistry::new();
        let mut spec = TagSpec::new("FT-101", TagCategory::AnalogInput, "ADDR001");
        spec.high_limit = 100.0;
        spec.units = "m3/h".to_string();
        registry.add_tag(spec).unwrap();

        let err = registry.set_output_value("FT-101", 42.0).unwrap_err();
        assert_eq!(err, CoreError::NotAnOutput("FT-101".to_string()));
        assert_eq!(registry.get("FT-101").unwrap().value(), 0.0);

        let err = registry.set_output_value("NO-SUCH", 42.0).unwrap_err();
        assert_eq!(err, CoreError::NotFound("NO-SUCH".to_string()));
    }

    #[test]
    fn set_output_value_rejects_non_finite() {
        let mut registry = TagRegistry::new();
        registry.add_tag(analog_output("VLV-302")).unwrap();
        assert!(matches!(
            registry.set_output_value("VLV-302", f64::NAN),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(registry.get("VLV-302").unwrap().value(), 25.0);
    }

    #[test]
    fn removing_tag_drops_its_alarms() {
        let mut registry = TagRegistry::new();
        let mut spec = TagSpec::new("FT-101", TagCategory::AnalogInput, "ADDR001");
        spec.high_limit = 100.0;
        spec.units = "m3/h".to_string();
        registry.add_tag(spec).unwrap();
        registry
            .add_alarm_definition(
                "FT-101",
                AlarmDefinition::new(AlarmKind::High, 80.0, "flow high"),
            )
            .unwrap();

        assert!(registry.remove_tag("FT-101"));
        assert!(!registry.remove_alarm_definition("FT-101", AlarmKind::High, 80.0));
    }
}
