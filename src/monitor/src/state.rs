use core::fmt;

use serde::Serialize;

// CO2 concentration in parts per million
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Co2Ppm(pub u16);

impl Co2Ppm {
    pub fn new(value: u16) -> Self {
        Self(value)
    }
}

impl From<Co2Ppm> for u16 {
    fn from(value: Co2Ppm) -> u16 {
        value.0
    }
}

impl fmt::Display for Co2Ppm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Total volatile organic compounds in parts per billion
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Tvoc(pub u16);

impl Tvoc {
    pub fn new(value: u16) -> Self {
        Self(value)
    }
}

impl From<Tvoc> for u16 {
    fn from(value: Tvoc) -> u16 {
        value.0
    }
}

impl fmt::Display for Tvoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Temperature in degrees celcius
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Temperature(pub f32);

impl Temperature {
    pub fn new(value: f32) -> Self {
        Self(value)
    }
}

impl From<Temperature> for f32 {
    fn from(value: Temperature) -> f32 {
        value.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// Relative humidity in percent
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Humidity(pub f32);

impl Humidity {
    pub fn new(value: f32) -> Self {
        Self(value)
    }
}

impl From<Humidity> for f32 {
    fn from(value: Humidity) -> f32 {
        value.0
    }
}

impl fmt::Display for Humidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// One result from the CO2/TVOC sensor.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AirQuality {
    pub co2: Co2Ppm,
    pub tvoc: Tvoc,
}

/// One result from the temperature/humidity sensor.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ClimateReading {
    pub temperature: Temperature,
    pub humidity: Humidity,
}

/// Indicator activation, in output order red, yellow, green.
pub type LightPattern = [bool; 3];

pub const ALL_OFF: LightPattern = [false, false, false];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Co2Band {
    Low,
    Medium,
    High,
}

impl Co2Band {
    pub fn pattern(self) -> LightPattern {
        match self {
            Co2Band::Low => [false, false, true],
            Co2Band::Medium => [false, true, false],
            Co2Band::High => [true, false, false],
        }
    }

    /// Colour shown on the dashboard.
    pub fn name(self) -> &'static str {
        match self {
            Co2Band::Low => "green",
            Co2Band::Medium => "yellow",
            Co2Band::High => "red",
        }
    }
}

impl fmt::Display for Co2Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ActuatorState {
    pub enabled: bool,
    pub lights: LightPattern,
}

impl ActuatorState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lights: ALL_OFF,
        }
    }

    /// Pattern to drive for `band`, honouring the master switch.
    pub fn pattern_for(&self, band: Co2Band) -> LightPattern {
        if self.enabled {
            band.pattern()
        } else {
            ALL_OFF
        }
    }

    /// Label of the current master state, as shown on the page.
    pub fn label(&self) -> &'static str {
        if self.enabled {
            "ON"
        } else {
            "OFF"
        }
    }

    /// Label of the state a toggle would switch to.
    pub fn toggle_label(&self) -> &'static str {
        if self.enabled {
            "off"
        } else {
            "on"
        }
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        ActuatorState::new(true)
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize)]
pub struct CpuInformation {
    // Degrees celcius
    pub temperature: Option<f32>,
    // Hertz
    pub frequency: Option<u32>,
    // Volts
    pub voltage: Option<f32>,
}
