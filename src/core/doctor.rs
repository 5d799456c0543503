use crate::core::ent::*;

/// Turns a health reading into a displayed status using configured
/// thresholds. Stateless: the same reading always yields the same level,
/// so a borderline reading can flap between cycles.
pub struct Doctor {
    thresholds: Thresholds,
}

impl Doctor {
    pub fn new(thresholds: Thresholds) -> Doctor {
        Doctor { thresholds }
    }

    pub fn classify(&self, reading: &HealthReading) -> StatusLevel {
        if reading.maintenance {
            return StatusLevel::Maintenance;
        }
        if !reading.reachable {
            return StatusLevel::Down;
        }
        if reading.cpu_percent >= self.thresholds.cpu_warn
            || reading.ram_percent >= self.thresholds.ram_warn
        {
            return StatusLevel::Warn;
        }
        StatusLevel::Ok
    }
}
