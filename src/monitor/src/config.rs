use core::time::Duration;

use crate::state::{Co2Band, Co2Ppm};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Thresholds {
    // Readings below this are green
    pub low: Co2Ppm,

    // Readings at or above this are red
    pub high: Co2Ppm,
}

impl Thresholds {
    pub fn classify(&self, co2: Co2Ppm) -> Co2Band {
        if co2 < self.low {
            Co2Band::Low
        } else if co2 < self.high {
            Co2Band::Medium
        } else {
            Co2Band::High
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            low: Co2Ppm::new(1000),
            high: Co2Ppm::new(2000),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MonitorConfig {
    // How often the CO2 sensor is read and the lights updated
    pub measurement_interval: Duration,

    // How often a reading is kept for the chart
    pub snapshot_interval: Duration,

    // Master switch state at boot
    pub lights_enabled: bool,

    pub thresholds: Thresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            measurement_interval: Duration::from_secs(2),
            snapshot_interval: Duration::from_secs(60),
            lights_enabled: true,
            thresholds: Thresholds::default(),
        }
    }
}
