mod app;
mod config;
mod logging;
pub mod telemetry;

pub use app::{run, run_from_args};
pub use config::RuntimeConfig;
