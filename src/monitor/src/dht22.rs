//! DHT22 frame decoding.
//!
//! The sensor answers a start pulse with 40 bits. Every bit is a ~50µs low
//! followed by a high whose length carries the value: ~26µs for 0, ~70µs for 1.

use crate::error::SensorError;
use crate::state::{ClimateReading, Humidity, Temperature};

pub const FRAME_BITS: usize = 40;

/// High pulses longer than this are ones.
pub const ONE_THRESHOLD_US: u32 = 48;

/// Minimum time between two reads.
pub const MIN_READ_INTERVAL_MS: u32 = 2000;

/// Pack measured high-pulse lengths into the five frame bytes.
pub fn bits_to_frame(high_us: &[u32; FRAME_BITS]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (index, duration) in high_us.iter().enumerate() {
        if *duration > ONE_THRESHOLD_US {
            frame[index / 8] |= 0x80 >> (index % 8);
        }
    }
    frame
}

pub fn decode_frame(frame: &[u8; 5]) -> Result<ClimateReading, SensorError> {
    let checksum = frame[..4]
        .iter()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte));
    if checksum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;

    let magnitude = f32::from(u16::from_be_bytes([frame[2] & 0x7f, frame[3]])) / 10.0;
    let temperature = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateReading {
        temperature: Temperature::new(temperature),
        humidity: Humidity::new(humidity),
    })
}
