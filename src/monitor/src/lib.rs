mod config;
mod error;
mod history;
mod ports;
mod state;

pub mod ccs811;
pub mod dht22;
pub mod http;
pub mod poll;
pub mod render;
pub mod router;
pub mod transport;

pub use config::{MonitorConfig, Thresholds};
pub use error::{ActuatorError, HttpError, MonitorError, RenderError, SensorError};
pub use history::{HistoryBuffer, HistoryEntry, HISTORY_CAPACITY};
pub use poll::{Devices, LoopContext, Monitor, Phase};
pub use ports::{AirQualitySensor, ClimateSensor, Clock, CpuProbe, Indicator, MonotonicClock};
pub use state::{
    ActuatorState, AirQuality, ClimateReading, Co2Band, Co2Ppm, CpuInformation, Humidity,
    LightPattern, Temperature, Tvoc, ALL_OFF,
};

/// Band of a CO2 reading with the standard 1000/2000 ppm breakpoints.
pub fn classify(co2: Co2Ppm) -> Co2Band {
    Thresholds::default().classify(co2)
}
