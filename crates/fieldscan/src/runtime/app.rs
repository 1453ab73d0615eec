use crate::infra::audit::{AuditEventType, AuditLogger};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use daq_core::{
    ActivatedAlarm, AlarmDefinition, AlarmEngine, AlarmKind, ConfigStore, FieldDevice,
    JsonFileStore, NotificationChannel, RegistrySnapshot, ScanScheduler, ScanStats, SimulatedPlc,
    TagCategory, TagSpec, TimeBase,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub fn run_from_args() {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return;
    }
    run(config);
}

pub fn run(config: RuntimeConfig) {
    // Initialize tracing; the guard keeps the file sink alive.
    let _log_guard = init_tracing(config.json_logs, config.log_file.as_deref());

    // Initialize metrics
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let timebase = TimeBase::new();

    // Initialize audit logger if enabled
    let audit_logger = init_audit_logger(config.audit_path.as_ref());
    if let Some(ref logger) = audit_logger {
        let _ = logger.log_event(
            timebase.now_us(),
            timebase.unix_us(),
            AuditEventType::SystemStart,
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "tick_ms": config.tick_ms,
                "config": config.config_path.as_ref().map(|p| p.display().to_string()),
            }),
        );
    }

    // Load the tag/alarm configuration, or fall back to the built-in demo set.
    let store = config.config_path.clone().map(JsonFileStore::new);
    let snapshot = match &store {
        Some(store) => store
            .load()
            .expect("Failed to load tag configuration"),
        None => {
            info!("No --config given, using demo configuration");
            demo_snapshot()
        }
    };
    let mut registry = snapshot
        .restore()
        .expect("Tag configuration failed validation");
    telemetry::TAGS_CONFIGURED.set(registry.len() as i64);
    info!(
        tags = registry.len(),
        alarms = snapshot.alarms.values().map(Vec::len).sum::<usize>(),
        "Configuration loaded"
    );
    if let Some(ref logger) = audit_logger {
        let _ = logger.log_event(
            timebase.now_us(),
            timebase.unix_us(),
            AuditEventType::ConfigLoaded,
            serde_json::json!({ "tags": registry.len() }),
        );
        for tag in registry.iter() {
            let _ = logger.log_event(
                timebase.now_us(),
                timebase.unix_us(),
                AuditEventType::TagAdded,
                serde_json::json!({
                    "tag": tag.id(),
                    "category": format!("{:?}", tag.category()),
                    "io_address": tag.io_address(),
                }),
            );
        }
    }

    // Wire alarm listeners: operator log, metrics, audit trail.
    let channel = Arc::new(NotificationChannel::new());
    channel.subscribe("operator-log", |alarm: &ActivatedAlarm| {
        warn!(
            tag = %alarm.tag_name,
            alarm_id = %alarm.alarm_id,
            message = %alarm.message,
            "Alarm activated"
        );
    });
    channel.subscribe("metrics", |_: &ActivatedAlarm| {
        telemetry::ALARMS_ACTIVATED.inc();
    });
    if let Some(logger) = audit_logger.clone() {
        channel.subscribe("audit", move |alarm: &ActivatedAlarm| {
            let _ = logger.log_event(
                alarm.timestamp_us,
                alarm.unix_us,
                AuditEventType::AlarmActivated,
                serde_json::json!({
                    "tag": alarm.tag_name,
                    "alarm_id": alarm.alarm_id,
                    "message": alarm.message,
                }),
            );
        });
    }

    let engine = AlarmEngine::new(Arc::clone(&channel));
    let mut device = SimulatedPlc::new();

    // Demo mode also exercises the output path: command the valve and
    // forward the write to the device.
    if config.config_path.is_none() {
        match registry.set_output_value("VLV-302", 40.0) {
            Ok(address) => {
                if let Err(err) = device.write_output(&address, 40.0) {
                    warn!(error = %err, "Output write not forwarded");
                }
                if let Some(ref logger) = audit_logger {
                    let _ = logger.log_event(
                        timebase.now_us(),
                        timebase.unix_us(),
                        AuditEventType::OutputWritten,
                        serde_json::json!({ "tag": "VLV-302", "value": 40.0 }),
                    );
                }
            }
            Err(err) => warn!(error = %err, "Demo output write rejected"),
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_scan = Arc::clone(&stop);
    let tick = Duration::from_millis(config.tick_ms);

    info!(tick_ms = config.tick_ms, "Starting scan loop");

    let scan_handle = thread::spawn(move || {
        let mut scheduler = ScanScheduler::new();
        let dt_s = tick.as_secs_f64();

        while !stop_scan.load(Ordering::Relaxed) {
            let started = Instant::now();

            device.step(dt_s);
            let summary = scheduler.tick(
                timebase.now_us(),
                timebase.unix_us(),
                &mut registry,
                &device,
                &engine,
            );

            telemetry::TICKS_EXECUTED.inc();
            telemetry::SAMPLES_TAKEN.inc_by(summary.sampled as u64);
            telemetry::READ_FAILURES.inc_by(summary.read_failures as u64);
            telemetry::TICK_DURATION_US.observe(started.elapsed().as_micros() as f64);

            if !device.is_healthy() {
                warn!("Field device reports unhealthy state");
            }

            if let Some(remaining) = tick.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        (registry, scheduler.stats().clone())
    });

    info!("fieldscan running");

    if let Some(seconds) = config.run_seconds {
        info!(seconds, "Running for limited duration");
        thread::sleep(Duration::from_secs(seconds));
    } else {
        // No duration given: scan until the process is killed.
        loop {
            thread::sleep(Duration::from_secs(3600));
        }
    }

    stop.store(true, Ordering::Relaxed);
    let (registry, stats) = scan_handle
        .join()
        .expect("Scan thread panicked");
    log_stats(&stats);

    if let Some(store) = store {
        let snapshot = RegistrySnapshot::capture(&registry);
        match store.save(&snapshot) {
            Ok(()) => {
                info!(path = %store.path().display(), "Configuration saved");
                if let Some(ref logger) = audit_logger {
                    let _ = logger.log_event(
                        timebase.now_us(),
                        timebase.unix_us(),
                        AuditEventType::ConfigSaved,
                        serde_json::json!({ "tags": snapshot.tags.len() }),
                    );
                }
            }
            Err(err) => warn!(error = %err, "Failed to save configuration"),
        }
    }

    if let Some(ref logger) = audit_logger {
        let _ = logger.log_event(
            timebase.now_us(),
            timebase.unix_us(),
            AuditEventType::SystemShutdown,
            serde_json::json!({
                "ticks": stats.ticks,
                "samples_taken": stats.samples_taken,
                "alarms_raised": stats.alarms_raised,
            }),
        );
    }
}

fn log_stats(stats: &ScanStats) {
    info!(
        ticks = stats.ticks,
        samples_taken = stats.samples_taken,
        read_failures = stats.read_failures,
        alarms_raised = stats.alarms_raised,
        "Run complete"
    );
}

/// Tag set matching the simulator's built-in addresses, used when no
/// configuration file is given.
fn demo_snapshot() -> RegistrySnapshot {
    let mut snapshot = RegistrySnapshot::default();

    let mut ft = TagSpec::new("FT-101", TagCategory::AnalogInput, "ADDR001");
    ft.description = "Feed flow".to_string();
    ft.high_limit = 100.0;
    ft.units = "m3/h".to_string();
    ft.scan_period_s = 2;
    ft.scan_enabled = true;
    snapshot.tags.push(ft);

    let mut ti = TagSpec::new("TI-102", TagCategory::AnalogInput, "ADDR004");
    ti.description = "Reactor pressure".to_string();
    ti.low_limit = 1.0;
    ti.high_limit = 7.0;
    ti.units = "bar".to_string();
    ti.scan_period_s = 1;
    ti.scan_enabled = true;
    snapshot.tags.push(ti);

    let mut ls = TagSpec::new("LS-201", TagCategory::DigitalInput, "ADDR003");
    ls.description = "Tank level switch".to_string();
    ls.scan_period_s = 1;
    ls.scan_enabled = true;
    snapshot.tags.push(ls);

    let mut pump = TagSpec::new("PUMP-301", TagCategory::DigitalOutput, "ADDR010");
    pump.description = "Feed pump run command".to_string();
    snapshot.tags.push(pump);

    let mut valve = TagSpec::new("VLV-302", TagCategory::AnalogOutput, "ADDR011");
    valve.description = "Feed valve position".to_string();
    valve.high_limit = 100.0;
    valve.units = "%".to_string();
    valve.initial_value = 25.0;
    snapshot.tags.push(valve);

    snapshot.alarms.insert(
        "FT-101".to_string(),
        vec![
            AlarmDefinition::new(AlarmKind::High, 85.0, "Feed flow high"),
            AlarmDefinition::new(AlarmKind::HighHigh, 95.0, "Feed flow very high"),
            AlarmDefinition::new(AlarmKind::Low, 5.0, "Feed flow low"),
        ],
    );
    snapshot.alarms.insert(
        "TI-102".to_string(),
        vec![AlarmDefinition::new(
            AlarmKind::High,
            5.5,
            "Reactor pressure high",
        )],
    );

    snapshot
}

fn init_audit_logger(audit_path: Option<&PathBuf>) -> Option<Arc<AuditLogger>> {
    audit_path.map(|path| match AuditLogger::new(path) {
        Ok(logger) => {
            info!(path = %path.display(), "Audit logging enabled");
            Arc::new(logger)
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to initialize audit logger");
            panic!("Audit logging requested but failed to initialize: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_snapshot_restores_cleanly() {
        let snapshot = demo_snapshot();
        let registry = snapshot.restore().unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get("FT-101").unwrap().alarms().len(), 3);
        assert_eq!(registry.get("VLV-302").unwrap().initial_value(), Some(25.0));
    }

    #[test]
    fn demo_addresses_exist_on_the_simulator() {
        let plc = SimulatedPlc::new();
        let registry = demo_snapshot().restore().unwrap();
        for tag in registry.iter() {
            if tag.category().is_input() {
                assert!(
                    plc.read_analog(tag.io_address()).is_ok(),
                    "no generator for {}",
                    tag.io_address()
                );
            }
        }
    }
}
