use serde::{Deserialize, Serialize};

/// One immutable health snapshot, produced fresh each cycle.
#[derive(Debug, Clone)]
pub struct HealthReading {
    pub reachable: bool,
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub uptime_secs: u64,
    pub platform: String,
    /// Set when the maintenance flag file is present; overrides everything else.
    pub maintenance: bool,
}

impl HealthReading {
    /// Reading used when the process is shutting down and the dashboard
    /// should show a final DOWN state.
    pub fn offline() -> HealthReading {
        HealthReading {
            reachable: false,
            cpu_percent: 0.0,
            ram_percent: 0.0,
            uptime_secs: 0,
            platform: String::new(),
            maintenance: false,
        }
    }
}

/// Displayed status of the monitored target. Transitions are compared by
/// equality only; there is no severity ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusLevel {
    Ok,
    Warn,
    Down,
    Maintenance,
}

/// What survives a restart: the dashboard message handle and the last
/// status we reported. Read once at cycle start, written once at cycle end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(default, rename = "lastStatus")]
    pub last_status: Option<StatusLevel>,
}

/// Rendered content for one cycle. No identity beyond the cycle that made it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPayload {
    pub content: String,
    pub color: u32,
}

/// Warning thresholds for the resource check, percent 0-100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub cpu_warn: f32,
    pub ram_warn: f32,
}

impl Default for Thresholds {
    fn default() -> Thresholds {
        Thresholds {
            cpu_warn: 80.0,
            ram_warn: 85.0,
        }
    }
}

/// Which status transitions deserve a broadcast alert. The dashboard edit
/// happens every cycle regardless.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Alert when the new status is Warn or Down.
    pub on_degrade: bool,
    /// Alert when the status comes back to Ok.
    pub on_recovery: bool,
    /// Alert when entering maintenance.
    pub on_maintenance: bool,
}

impl Default for AlertPolicy {
    fn default() -> AlertPolicy {
        AlertPolicy {
            on_degrade: true,
            on_recovery: false,
            on_maintenance: false,
        }
    }
}

impl AlertPolicy {
    /// An alert fires only on a known previous status, an actual change,
    /// and a new status the policy cares about.
    pub fn should_alert(&self, new: StatusLevel, previous: Option<StatusLevel>) -> bool {
        let Some(previous) = previous else {
            return false;
        };
        if new == previous {
            return false;
        }
        match new {
            StatusLevel::Warn | StatusLevel::Down => self.on_degrade,
            StatusLevel::Ok => self.on_recovery,
            StatusLevel::Maintenance => self.on_maintenance,
        }
    }
}
