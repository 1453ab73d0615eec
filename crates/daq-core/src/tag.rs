use serde::{Deserialize, Serialize};

use crate::alarm::AlarmDefinition;
use crate::error::CoreError;

/// The four I/O categories a tag can belong to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    DigitalInput,
    DigitalOutput,
    AnalogInput,
    AnalogOutput,
}

impl TagCategory {
    pub fn is_input(self) -> bool {
        matches!(self, Self::DigitalInput | Self::AnalogInput)
    }

    pub fn is_output(self) -> bool {
        !self.is_input()
    }

    pub fn is_analog(self) -> bool {
        matches!(self, Self::AnalogInput | Self::AnalogOutput)
    }

    pub fn is_digital(self) -> bool {
        !self.is_analog()
    }
}

/// Scan cadence of an input tag. `period_s == 0` or `enabled == false`
/// freezes the tag at its last written value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub period_s: u32,
    pub enabled: bool,
}

/// Normal operating band of an analog tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

/// Flat construction request and persistence form of a tag.
///
/// Carries every field any category might use; [`Tag::from_spec`] enforces
/// which combinations are legal for the requested category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub io_address: String,
    pub category: TagCategory,
    #[serde(default)]
    pub scan_period_s: u32,
    #[serde(default)]
    pub scan_enabled: bool,
    #[serde(default)]
    pub low_limit: f64,
    #[serde(default)]
    pub high_limit: f64,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub initial_value: f64,
}

impl TagSpec {
    /// Spec with every category-dependent field at its zero value.
    pub fn new(id: &str, category: TagCategory, io_address: &str) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            io_address: io_address.to_string(),
            category,
            scan_period_s: 0,
            scan_enabled: false,
            low_limit: 0.0,
            high_limit: 0.0,
            units: String::new(),
            initial_value: 0.0,
        }
    }
}

/// Category-dependent payload. Each variant carries only the fields legal for
/// that category, so an analog-only field cannot exist on a digital tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagKind {
    DigitalInput {
        scan: ScanSettings,
    },
    DigitalOutput,
    AnalogInput {
        band: Band,
        units: String,
        scan: ScanSettings,
        alarms: Vec<AlarmDefinition>,
    },
    AnalogOutput {
        band: Band,
        units: String,
        initial_value: f64,
    },
}

/// A named I/O point bound to a field-device address.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    id: String,
    description: String,
    io_address: String,
    value: f64,
    kind: TagKind,
}

fn invalid(rule: &str) -> CoreError {
    CoreError::Validation(rule.to_string())
}

impl Tag {
    /// Validate `spec` against the legality table for its category and build
    /// the corresponding variant. The first violated rule is reported.
    pub fn from_spec(spec: TagSpec) -> Result<Self, CoreError> {
        let category = spec.category;

        if spec.id.trim().is_empty() {
            return Err(invalid("tag id must not be empty"));
        }
        if spec.io_address.trim().is_empty() {
            return Err(invalid("I/O address must not be empty"));
        }
        if category.is_digital() {
            if !spec.units.is_empty() {
                return Err(invalid("units are only valid on analog tags"));
            }
            if spec.low_limit != 0.0 || spec.high_limit != 0.0 {
                return Err(invalid("low/high limits are only valid on analog tags"));
            }
        }
        if category.is_output() && (spec.scan_period_s != 0 || spec.scan_enabled) {
            return Err(invalid("scan settings are only valid on input tags"));
        }
        if category != TagCategory::AnalogOutput && spec.initial_value != 0.0 {
            return Err(invalid("initial value is only valid on analog output tags"));
        }
        if category.is_analog() {
            if !spec.low_limit.is_finite() || !spec.high_limit.is_finite() {
                return Err(invalid("low/high limits must be finite"));
            }
            if spec.low_limit > spec.high_limit {
                return Err(invalid("low limit must not exceed high limit"));
            }
        }
        if !spec.initial_value.is_finite() {
            return Err(invalid("initial value must be finite"));
        }

        let scan = ScanSettings {
            period_s: spec.scan_period_s,
            enabled: spec.scan_enabled,
        };
        let band = Band {
            low: spec.low_limit,
            high: spec.high_limit,
        };

        let kind = match category {
            TagCategory::DigitalInput => TagKind::DigitalInput { scan },
            TagCategory::DigitalOutput => TagKind::DigitalOutput,
            TagCategory::AnalogInput => TagKind::AnalogInput {
                band,
                units: spec.units,
                scan,
                alarms: Vec::new(),
            },
            TagCategory::AnalogOutput => TagKind::AnalogOutput {
                band,
                units: spec.units,
                initial_value: spec.initial_value,
            },
        };

        let value = match kind {
            TagKind::AnalogOutput { initial_value, .. } => initial_value,
            _ => 0.0,
        };

        Ok(Self {
            id: spec.id,
            description: spec.description,
            io_address: spec.io_address,
            value,
            kind,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn io_address(&self) -> &str {
        &self.io_address
    }

    /// Latest sampled (inputs) or commanded (outputs) value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn category(&self) -> TagCategory {
        match self.kind {
            TagKind::DigitalInput { .. } => TagCategory::DigitalInput,
            TagKind::DigitalOutput => TagCategory::DigitalOutput,
            TagKind::AnalogInput { .. } => TagCategory::AnalogInput,
            TagKind::AnalogOutput { .. } => TagCategory::AnalogOutput,
        }
    }

    pub fn kind(&self) -> &TagKind {
        &self.kind
    }

    pub fn scan(&self) -> Option<ScanSettings> {
        match self.kind {
            TagKind::DigitalInput { scan } | TagKind::AnalogInput { scan, .. } => Some(scan),
            _ => None,
        }
    }

    pub fn band(&self) -> Option<Band> {
        match self.kind {
            TagKind::AnalogInput { band, .. } | TagKind::AnalogOutput { band, .. } => Some(band),
            _ => None,
        }
    }

    pub fn units(&self) -> Option<&str> {
        match &self.kind {
            TagKind::AnalogInput { units, .. } | TagKind::AnalogOutput { units, .. } => {
                Some(units.as_str())
            }
            _ => None,
        }
    }

    pub fn initial_value(&self) -> Option<f64> {
        match self.kind {
            TagKind::AnalogOutput { initial_value, .. } => Some(initial_value),
            _ => None,
        }
    }

    /// Alarm definitions in insertion order; empty for anything but an
    /// analog input.
    pub fn alarms(&self) -> &[AlarmDefinition] {
        match &self.kind {
            TagKind::AnalogInput { alarms, .. } => alarms,
            _ => &[],
        }
    }

    pub(crate) fn alarms_mut(&mut self) -> Option<&mut Vec<AlarmDefinition>> {
        match &mut self.kind {
            TagKind::AnalogInput { alarms, .. } => Some(alarms),
            _ => None,
        }
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub(crate) fn set_initial_value(&mut self, value: f64) {
        if let TagKind::AnalogOutput { initial_value, .. } = &mut self.kind {
            *initial_value = value;
        }
    }

    /// Flat form for persistence. `from_spec(to_spec())` reproduces the tag
    /// minus its alarms, which the snapshot carries separately.
    pub fn to_spec(&self) -> TagSpec {
        let mut spec = TagSpec::new(&self.id, self.category(), &self.io_address);
        spec.description = self.description.clone();
        if let Some(scan) = self.scan() {
            spec.scan_period_s = scan.period_s;
            spec.scan_enabled = scan.enabled;
        }
        if let Some(band) = self.band() {
            spec.low_limit = band.low;
            spec.high_limit = band.high;
        }
        if let Some(units) = self.units() {
            spec.units = units.to_string();
        }
        if let Some(initial) = self.initial_value() {
            spec.initial_value = initial;
        }
        spec
    }
}
