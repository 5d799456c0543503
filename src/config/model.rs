//! Configuration: an optional YAML file (`sentinel.yml`, path overridable
//! via `SENTINEL_CONFIG`) with every key overridable by environment
//! variable, so the bot can also run from a bare `.env`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ent::{AlertPolicy, Thresholds};
use crate::core::probe::ProbeTarget;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to parse config file {path}: {source}")]
    File {
        path: String,
        source: serde_yaml::Error,
    },
}

/// Raw shape of the YAML file. Everything optional; env vars fill the rest.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    token: Option<String>,
    channel_id: Option<String>,
    label: Option<String>,
    server_host: Option<String>,
    server_port: Option<u16>,
    process_name: Option<String>,
    log_file: Option<String>,
    cpu_warn: Option<f32>,
    ram_warn: Option<f32>,
    check_interval_ms: Option<u64>,
    alert_delete_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    log_freshness_secs: Option<u64>,
    maintenance_file: Option<String>,
    state_file: Option<String>,
    alerts: AlertPolicy,
}

#[derive(Debug)]
pub struct Config {
    pub token: String,
    pub channel_id: String,
    pub target: ProbeTarget,
    pub target_label: String,
    pub thresholds: Thresholds,
    pub alert_policy: AlertPolicy,
    pub check_interval: Duration,
    pub alert_delete_after: Duration,
    pub connect_timeout: Duration,
    pub log_freshness: Duration,
    pub maintenance_file: PathBuf,
    pub state_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        let path = env::var("SENTINEL_CONFIG").unwrap_or_else(|_| "sentinel.yml".to_string());
        let file = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_yaml::from_str(&raw).map_err(|source| ConfigError::File {
                path: path.clone(),
                source,
            })?,
            Err(_) => FileConfig::default(),
        };
        Self::resolve(file, &|key| env::var(key).ok())
    }

    fn resolve(
        file: FileConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        let token = env("DISCORD_TOKEN")
            .or(file.token)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let channel_id = env("CHANNEL_ID")
            .or(file.channel_id)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CHANNEL_ID"))?;

        let host = env("SERVER_HOST").or(file.server_host);
        let port = parse(env("SERVER_PORT"), "SERVER_PORT")?.or(file.server_port);
        let process_name = env("PROCESS_NAME").or(file.process_name);
        let log_file = env("LOG_FILE").or(file.log_file);

        let target = match (host, process_name, log_file) {
            (Some(host), _, _) => {
                let port = port.ok_or(ConfigError::Missing("SERVER_PORT"))?;
                ProbeTarget::Tcp { host, port }
            }
            (None, Some(name), _) => ProbeTarget::Process { name },
            (None, None, Some(path)) => ProbeTarget::LogFile {
                path: PathBuf::from(path),
            },
            (None, None, None) => ProbeTarget::LocalOnly,
        };
        let target_label = env("TARGET_LABEL").or(file.label).unwrap_or_else(|| {
            match &target {
                ProbeTarget::Tcp { host, port } => format!("{host}:{port}"),
                ProbeTarget::Process { name } => name.clone(),
                ProbeTarget::LogFile { path } => path.display().to_string(),
                ProbeTarget::LocalOnly => "localhost".to_string(),
            }
        });

        let defaults = Thresholds::default();
        let thresholds = Thresholds {
            cpu_warn: parse(env("CPU_WARN"), "CPU_WARN")?
                .or(file.cpu_warn)
                .unwrap_or(defaults.cpu_warn),
            ram_warn: parse(env("RAM_WARN"), "RAM_WARN")?
                .or(file.ram_warn)
                .unwrap_or(defaults.ram_warn),
        };
        percent_check(thresholds.cpu_warn, "CPU_WARN")?;
        percent_check(thresholds.ram_warn, "RAM_WARN")?;

        let check_interval_ms = parse(env("CHECK_INTERVAL"), "CHECK_INTERVAL")?
            .or(file.check_interval_ms)
            .unwrap_or(30_000);
        if check_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "CHECK_INTERVAL",
                reason: "must be greater than zero".to_string(),
            });
        }
        let alert_delete_ms = parse(env("ALERT_DELETE_MS"), "ALERT_DELETE_MS")?
            .or(file.alert_delete_ms)
            .unwrap_or(15_000);

        Ok(Config {
            token,
            channel_id,
            target,
            target_label,
            thresholds,
            alert_policy: file.alerts,
            check_interval: Duration::from_millis(check_interval_ms),
            alert_delete_after: Duration::from_millis(alert_delete_ms),
            connect_timeout: Duration::from_millis(file.connect_timeout_ms.unwrap_or(3_000)),
            log_freshness: Duration::from_secs(file.log_freshness_secs.unwrap_or(120)),
            maintenance_file: PathBuf::from(
                env("MAINTENANCE_FILE")
                    .or(file.maintenance_file)
                    .unwrap_or_else(|| "./maintenance".to_string()),
            ),
            state_file: PathBuf::from(
                env("STATE_FILE")
                    .or(file.state_file)
                    .unwrap_or_else(|| "./state.json".to_string()),
            ),
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.parse().map_err(|_| ConfigError::Invalid {
                key,
                reason: format!("cannot parse {raw:?}"),
            })
        })
        .transpose()
}

fn percent_check(value: f32, key: &'static str) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("{value} is not a percentage (0-100)"),
        })
    }
}
