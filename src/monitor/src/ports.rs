//! Capabilities the poll loop and request handlers consume.
//!
//! The firmware implements these over ESP-IDF drivers; tests use fakes.

use std::time::Instant;

use crate::error::{ActuatorError, SensorError};
use crate::state::{AirQuality, ClimateReading, CpuInformation, LightPattern};

/// CO2/TVOC sensor.
pub trait AirQualitySensor {
    /// Whether a new result is waiting.
    fn data_ready(&mut self) -> Result<bool, SensorError>;

    /// The most recent result, fetching a new one if it is ready.
    ///
    /// Returns `None` until the sensor has produced its first result.
    fn read(&mut self) -> Result<Option<AirQuality>, SensorError>;
}

/// Temperature/humidity sensor.
pub trait ClimateSensor {
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}

/// The traffic light and its master LED.
pub trait Indicator {
    fn set_lights(&mut self, pattern: LightPattern) -> Result<(), ActuatorError>;

    fn set_master(&mut self, on: bool) -> Result<(), ActuatorError>;
}

/// Readings about the chip itself.
pub trait CpuProbe {
    fn information(&mut self) -> CpuInformation;
}

/// Monotonic time in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// [`Clock`] counting from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl<T: AirQualitySensor + ?Sized> AirQualitySensor for &mut T {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        (**self).data_ready()
    }

    fn read(&mut self) -> Result<Option<AirQuality>, SensorError> {
        (**self).read()
    }
}

impl<T: ClimateSensor + ?Sized> ClimateSensor for &mut T {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        (**self).read()
    }
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn set_lights(&mut self, pattern: LightPattern) -> Result<(), ActuatorError> {
        (**self).set_lights(pattern)
    }

    fn set_master(&mut self, on: bool) -> Result<(), ActuatorError> {
        (**self).set_master(on)
    }
}

impl<T: CpuProbe + ?Sized> CpuProbe for &mut T {
    fn information(&mut self) -> CpuInformation {
        (**self).information()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
