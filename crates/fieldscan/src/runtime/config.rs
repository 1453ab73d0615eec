use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub config_path: Option<PathBuf>,
    pub tick_ms: u64,
    pub json_logs: bool,
    pub log_file: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub audit_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            config_path: None,
            tick_ms: 500,
            json_logs: false,
            log_file: None,
            metrics_addr: None,
            audit_path: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    if i + 1 < args.len() {
                        cfg.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--tick-ms" => {
                    if i + 1 < args.len() {
                        cfg.tick_ms = args[i + 1].parse().unwrap_or(500).max(1);
                        i += 1;
                    }
                }
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-file" => {
                    if i + 1 < args.len() {
                        cfg.log_file = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--audit-log" => {
                    if i + 1 < args.len() {
                        cfg.audit_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"fieldscan - SCADA data-acquisition and alarm core

USAGE:
    fieldscan [OPTIONS]

OPTIONS:
    --config <PATH>         Tag/alarm configuration file (JSON); loaded at
                            startup, saved back at shutdown. Without it a
                            built-in demo configuration is used.
    --tick-ms <MS>          Scan tick interval in milliseconds [default: 500]
    --run-seconds <SECS>    Run for a fixed duration then exit
    --json-logs             Output logs in JSON format (for log aggregation)
    --log-file <PATH>       Also write logs to a file (non-blocking)
    --metrics-addr <ADDR>   Enable Prometheus metrics server (e.g., 0.0.0.0:9090)
    --audit-log <PATH>      Enable audit logging to specified JSONL file
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,fieldscan=trace)

EXAMPLES:
    # Demo configuration with metrics
    fieldscan --metrics-addr 0.0.0.0:9090

    # Production-style run
    fieldscan --config /etc/fieldscan/tags.json --json-logs --audit-log /var/log/fieldscan/audit.jsonl

    # Short test run
    fieldscan --run-seconds 10 --tick-ms 250
"#
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("fieldscan")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[]));
        assert_eq!(cfg.tick_ms, 500);
        assert!(cfg.config_path.is_none());
        assert!(!cfg.show_help);
    }

    #[test]
    fn parses_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[
            "--config",
            "tags.json",
            "--tick-ms",
            "250",
            "--run-seconds",
            "10",
            "--json-logs",
            "--metrics-addr",
            "0.0.0.0:9090",
            "--audit-log",
            "audit.jsonl",
        ]));
        assert_eq!(cfg.config_path, Some(PathBuf::from("tags.json")));
        assert_eq!(cfg.tick_ms, 250);
        assert_eq!(cfg.run_seconds, Some(10));
        assert!(cfg.json_logs);
        assert_eq!(cfg.metrics_addr.as_deref(), Some("0.0.0.0:9090"));
        assert_eq!(cfg.audit_path, Some(PathBuf::from("audit.jsonl")));
    }

    #[test]
    fn zero_tick_is_clamped() {
        let cfg = RuntimeConfig::from_args(&args(&["--tick-ms", "0"]));
        assert_eq!(cfg.tick_ms, 1);
    }
}
