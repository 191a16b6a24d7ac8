use esp_idf_svc::hal::{
    peripheral::Peripheral,
    temp_sensor::{TempSensor, TempSensorConfig, TempSensorDriver},
};
use log::*;
use monitor::{CpuInformation, CpuProbe};

/// Die temperature and clock of the chip the firmware runs on.
///
/// The ESP32-C3 cannot measure its own supply rail, so `voltage` stays empty.
pub struct Cpu<'d> {
    sensor: Option<TempSensorDriver<'d>>,
}

impl<'d> Cpu<'d> {
    pub fn new(temp_sensor: impl Peripheral<P = TempSensor> + 'd) -> Self {
        let sensor = TempSensorDriver::new(&TempSensorConfig::default(), temp_sensor)
            .and_then(|mut driver| driver.enable().map(|_| driver));

        match sensor {
            Ok(driver) => Cpu {
                sensor: Some(driver),
            },
            Err(e) => {
                warn!("CPU temperature sensor unavailable: {}", e);
                Cpu { sensor: None }
            }
        }
    }

    fn temperature(&self) -> Option<f32> {
        let sensor = self.sensor.as_ref()?;
        match sensor.get_celsius() {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                debug!("CPU temperature read failed: {}", e);
                None
            }
        }
    }
}

fn frequency() -> u32 {
    let mhz = unsafe { esp_idf_svc::sys::esp_rom_get_cpu_ticks_per_us() };
    mhz * 1_000_000
}

impl CpuProbe for Cpu<'_> {
    fn information(&mut self) -> CpuInformation {
        CpuInformation {
            temperature: self.temperature(),
            frequency: Some(frequency()),
            voltage: None,
        }
    }
}
