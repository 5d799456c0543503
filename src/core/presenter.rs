//! Renders a status level and its metrics into message content. Pure
//! transform, no I/O, so it is testable without a live Discord connection.

use chrono::{DateTime, Utc};

use crate::core::ent::*;

const COLOR_GREEN: u32 = 0x2ecc71;
const COLOR_YELLOW: u32 = 0xf1c40f;
const COLOR_RED: u32 = 0xe74c3c;
const COLOR_BLUE: u32 = 0x3498db;

fn headline(level: StatusLevel) -> (&'static str, &'static str, u32) {
    match level {
        StatusLevel::Ok => ("🟢", "Operational", COLOR_GREEN),
        StatusLevel::Warn => ("🟡", "Degraded performance", COLOR_YELLOW),
        StatusLevel::Down => ("🔴", "Down", COLOR_RED),
        StatusLevel::Maintenance => ("🔧", "Under maintenance", COLOR_BLUE),
    }
}

pub fn render(
    level: StatusLevel,
    reading: &HealthReading,
    target: &str,
    now: DateTime<Utc>,
) -> DisplayPayload {
    let (emoji, title, color) = headline(level);
    let mut content = format!("{emoji} **{target}** — {title}\n");
    // Metrics only make sense while the host answered the probe.
    if reading.reachable && !reading.maintenance {
        content.push_str(&format!(
            "CPU: {:.0}% | RAM: {:.0}% | Uptime: {}\n",
            reading.cpu_percent,
            reading.ram_percent,
            format_uptime(reading.uptime_secs),
        ));
        if !reading.platform.is_empty() {
            content.push_str(&format!("Platform: {}\n", reading.platform));
        }
    }
    content.push_str(&format!(
        "Last updated: {}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    DisplayPayload { content, color }
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(reachable: bool) -> HealthReading {
        HealthReading {
            reachable,
            cpu_percent: 12.4,
            ram_percent: 56.7,
            uptime_secs: 90_061,
            platform: "Ubuntu 22.04".to_string(),
            maintenance: false,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn ok_payload_carries_metrics() {
        let payload = render(StatusLevel::Ok, &reading(true), "game-server", at());
        assert!(payload.content.contains("🟢"));
        assert!(payload.content.contains("game-server"));
        assert!(payload.content.contains("CPU: 12%"));
        assert!(payload.content.contains("RAM: 57%"));
        assert!(payload.content.contains("1d 1h 1m"));
        assert!(payload.content.contains("2026-02-01 12:30:00 UTC"));
        assert_eq!(payload.color, COLOR_GREEN);
    }

    #[test]
    fn down_payload_omits_metrics() {
        let payload = render(StatusLevel::Down, &reading(false), "game-server", at());
        assert!(payload.content.contains("🔴"));
        assert!(!payload.content.contains("CPU"));
        assert_eq!(payload.color, COLOR_RED);
    }

    #[test]
    fn maintenance_payload() {
        let mut r = reading(true);
        r.maintenance = true;
        let payload = render(StatusLevel::Maintenance, &r, "game-server", at());
        assert!(payload.content.contains("maintenance"));
        assert!(!payload.content.contains("CPU"));
    }

    #[test]
    fn render_is_pure() {
        let r = reading(true);
        let a = render(StatusLevel::Warn, &r, "t", at());
        let b = render(StatusLevel::Warn, &r, "t", at());
        assert_eq!(a, b);
    }

    #[test]
    fn short_uptime_formats() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
    }
}
