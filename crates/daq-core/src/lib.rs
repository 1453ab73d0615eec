//! In-memory SCADA acquisition core: a registry of typed I/O tags, a scan
//! scheduler driven by one shared tick, threshold alarms on analog inputs,
//! and a notification channel for activated alarms. The field device behind
//! the tags is an injected [`FieldDevice`]; a waveform simulator is provided.

pub mod alarm;
pub mod device;
pub mod device_sim;
pub mod error;
pub mod notify;
pub mod persist;
pub mod registry;
pub mod scheduler;
pub mod tag;
mod tag_proptest;
pub mod timebase;

pub use alarm::{ActivatedAlarm, AlarmDefinition, AlarmEngine, AlarmKind};
pub use device::{DeviceError, FieldDevice};
pub use device_sim::{SimulatedPlc, Waveform};
pub use error::CoreError;
pub use notify::NotificationChannel;
pub use persist::{ConfigStore, JsonFileStore, PersistError, RegistrySnapshot};
pub use registry::TagRegistry;
pub use scheduler::{ScanScheduler, ScanStats, TickSummary};
pub use tag::{Band, ScanSettings, Tag, TagCategory, TagKind, TagSpec};
pub use timebase::TimeBase;
