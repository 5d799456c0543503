//! Health sampling. Every failure path here degrades to "not reachable";
//! the monitor must never crash because the target did.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use sysinfo::System;
use tokio::net::TcpStream;
use tokio::time;

use crate::core::ent::HealthReading;

/// What reachability means for this deployment.
#[derive(Debug, Clone)]
pub enum ProbeTarget {
    /// TCP connect to host:port within the timeout.
    Tcp { host: String, port: u16 },
    /// Case-insensitive substring match against the process list. An empty
    /// name counts as always running.
    Process { name: String },
    /// File modified within the freshness window.
    LogFile { path: PathBuf },
    /// No external target; only local resource thresholds matter.
    LocalOnly,
}

pub struct Probe {
    target: ProbeTarget,
    connect_timeout: Duration,
    log_freshness: Duration,
    maintenance_file: PathBuf,
}

impl Probe {
    pub fn new(
        target: ProbeTarget,
        connect_timeout: Duration,
        log_freshness: Duration,
        maintenance_file: PathBuf,
    ) -> Probe {
        Probe {
            target,
            connect_timeout,
            log_freshness,
            maintenance_file,
        }
    }

    pub async fn sample(&self) -> HealthReading {
        if self.maintenance_file.exists() {
            tracing::debug!(
                "maintenance flag {} present, skipping checks",
                self.maintenance_file.display()
            );
            return HealthReading {
                reachable: true,
                cpu_percent: 0.0,
                ram_percent: 0.0,
                uptime_secs: 0,
                platform: String::new(),
                maintenance: true,
            };
        }

        let reachable = self.check_reachable().await;
        let (cpu_percent, ram_percent) = sample_resources().await;
        HealthReading {
            reachable,
            cpu_percent,
            ram_percent,
            uptime_secs: System::uptime(),
            platform: System::long_os_version().unwrap_or_default(),
            maintenance: false,
        }
    }

    async fn check_reachable(&self) -> bool {
        match &self.target {
            ProbeTarget::Tcp { host, port } => {
                let addr = format!("{host}:{port}");
                match time::timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
                    Ok(Ok(_)) => true,
                    Ok(Err(err)) => {
                        tracing::debug!("tcp probe {addr} failed: {err}");
                        false
                    }
                    Err(_) => {
                        tracing::debug!("tcp probe {addr} timed out");
                        false
                    }
                }
            }
            ProbeTarget::Process { name } => process_running(name),
            ProbeTarget::LogFile { path } => {
                match std::fs::metadata(path).and_then(|meta| meta.modified()) {
                    Ok(modified) => SystemTime::now()
                        .duration_since(modified)
                        .map(|age| age <= self.log_freshness)
                        .unwrap_or(true),
                    Err(err) => {
                        tracing::debug!("log probe {} failed: {err}", path.display());
                        false
                    }
                }
            }
            ProbeTarget::LocalOnly => true,
        }
    }
}

fn process_running(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    let needle = name.to_lowercase();
    let mut sys = System::new();
    sys.refresh_processes();
    sys.processes()
        .values()
        .any(|proc| proc.name().to_lowercase().contains(&needle))
}

/// CPU% needs two time-separated samples; a single snapshot of cumulative
/// tick counters only yields an average since boot.
async fn sample_resources() -> (f32, f32) {
    let mut sys = System::new();
    sys.refresh_cpu();
    time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu = sys.global_cpu_info().cpu_usage();
    let ram = if sys.total_memory() == 0 {
        0.0
    } else {
        sys.used_memory() as f32 / sys.total_memory() as f32 * 100.0
    };
    (cpu, ram)
}
