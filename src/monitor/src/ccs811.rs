//! CCS811 register map and frame decoding.
//!
//! Bus access lives in the firmware; this only knows the bytes.

use crate::error::SensorError;
use crate::state::{AirQuality, Co2Ppm, Tvoc};

pub const DEFAULT_ADDRESS: u8 = 0x5a;
pub const HARDWARE_ID: u8 = 0x81;

pub mod register {
    pub const STATUS: u8 = 0x00;
    pub const MEAS_MODE: u8 = 0x01;
    pub const ALG_RESULT_DATA: u8 = 0x02;
    pub const HW_ID: u8 = 0x20;
    pub const ERROR_ID: u8 = 0xe0;
    pub const APP_START: u8 = 0xf4;
    pub const SW_RESET: u8 = 0xff;
}

/// Magic sequence written to `SW_RESET`.
pub const RESET_SEQUENCE: [u8; 4] = [0x11, 0xe5, 0x72, 0x8a];

/// Length of the `ALG_RESULT_DATA` block up to and including `ERROR_ID`.
pub const RESULT_LEN: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    pub fn error(self) -> bool {
        self.0 & 0b0000_0001 != 0
    }

    pub fn data_ready(self) -> bool {
        self.0 & 0b0000_1000 != 0
    }

    pub fn app_valid(self) -> bool {
        self.0 & 0b0001_0000 != 0
    }

    pub fn firmware_mode(self) -> bool {
        self.0 & 0b1000_0000 != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveMode {
    Idle,
    ConstantPower1s,
    Pulse10s,
    LowPower60s,
    ConstantPower250ms,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasMode {
    pub drive_mode: DriveMode,
    pub interrupt_on_data_ready: bool,
    pub interrupt_on_threshold: bool,
}

impl Default for MeasMode {
    fn default() -> Self {
        MeasMode {
            drive_mode: DriveMode::ConstantPower1s,
            interrupt_on_data_ready: false,
            interrupt_on_threshold: false,
        }
    }
}

impl From<DriveMode> for u8 {
    fn from(mode: DriveMode) -> u8 {
        let value: u8 = match mode {
            DriveMode::Idle => 0b000,
            DriveMode::ConstantPower1s => 0b001,
            DriveMode::Pulse10s => 0b010,
            DriveMode::LowPower60s => 0b011,
            DriveMode::ConstantPower250ms => 0b100,
        };
        value << 4
    }
}

impl From<MeasMode> for u8 {
    fn from(mode: MeasMode) -> u8 {
        u8::from(mode.drive_mode)
            | u8::from(mode.interrupt_on_data_ready) << 3
            | u8::from(mode.interrupt_on_threshold) << 2
    }
}

/// Decode `ALG_RESULT_DATA`: eCO2, TVOC, status, error id.
pub fn decode_result(frame: &[u8; RESULT_LEN]) -> Result<AirQuality, SensorError> {
    let status = Status(frame[4]);
    if status.error() {
        return Err(SensorError::Device(frame[5]));
    }

    Ok(AirQuality {
        co2: Co2Ppm::new(u16::from_be_bytes([frame[0], frame[1]])),
        tvoc: Tvoc::new(u16::from_be_bytes([frame[2], frame[3]])),
    })
}
