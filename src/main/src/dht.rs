use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_svc::hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, Level, PinDriver},
};
use esp_idf_svc::sys::EspError;
use log::*;
use monitor::dht22::{bits_to_frame, decode_frame, FRAME_BITS, MIN_READ_INTERVAL_MS};
use monitor::{ClimateReading, ClimateSensor, SensorError};

/// DHT22 on a single open-drain data line.
pub struct Dht22<'d> {
    pin: PinDriver<'d, AnyIOPin, InputOutput>,
    last: Option<(Instant, ClimateReading)>,
}

impl<'d> Dht22<'d> {
    pub fn new(pin: AnyIOPin) -> Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_high()?;
        Ok(Dht22 { pin, last: None })
    }

    fn sample(&mut self) -> Result<ClimateReading, SensorError> {
        self.pin.set_low().map_err(gpio_error)?;
        Ets::delay_us(1200);
        self.pin.set_high().map_err(gpio_error)?;

        // Response: ~80µs low, ~80µs high
        self.wait_while(Level::High, 100)?;
        self.wait_while(Level::Low, 100)?;
        self.wait_while(Level::High, 100)?;

        let mut high_us = [0u32; FRAME_BITS];
        for duration in high_us.iter_mut() {
            self.wait_while(Level::Low, 80)?;
            *duration = self.wait_while(Level::High, 100)?;
        }

        decode_frame(&bits_to_frame(&high_us))
    }

    /// Microseconds the line stayed at `level`.
    fn wait_while(&self, level: Level, timeout_us: u32) -> Result<u32, SensorError> {
        let start = Instant::now();
        let mut elapsed = 0;
        while self.pin.get_level() == level {
            elapsed = start.elapsed().as_micros() as u32;
            if elapsed > timeout_us {
                return Err(SensorError::Timeout);
            }
        }
        Ok(elapsed)
    }
}

fn gpio_error(e: EspError) -> SensorError {
    warn!("DHT22 data line failed: {}", e);
    SensorError::Bus
}

impl ClimateSensor for Dht22<'_> {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let min_interval = Duration::from_millis(MIN_READ_INTERVAL_MS.into());
        if let Some((at, reading)) = self.last {
            if at.elapsed() < min_interval {
                return Ok(reading);
            }
        }

        let reading = self.sample()?;
        debug!("DHT22: {} °C, {} %", reading.temperature, reading.humidity);
        self.last = Some((Instant::now(), reading));
        Ok(reading)
    }
}
