use anyhow::Result;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Level, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use log::*;
use monitor::{ActuatorError, Indicator, LightPattern};

/// Red, yellow and green lights plus the master-enable LED.
pub struct TrafficLight<'d> {
    lights: [PinDriver<'d, AnyOutputPin, Output>; 3],
    master: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> TrafficLight<'d> {
    pub fn new(
        red: AnyOutputPin,
        yellow: AnyOutputPin,
        green: AnyOutputPin,
        master: AnyOutputPin,
    ) -> Result<Self> {
        let mut lights = [
            PinDriver::output(red)?,
            PinDriver::output(yellow)?,
            PinDriver::output(green)?,
        ];
        for light in lights.iter_mut() {
            light.set_low()?;
        }

        let mut master = PinDriver::output(master)?;
        master.set_low()?;

        Ok(TrafficLight { lights, master })
    }
}

fn gpio_error(e: EspError) -> ActuatorError {
    error!("Failed to drive light: {}", e);
    ActuatorError::Gpio
}

impl Indicator for TrafficLight<'_> {
    fn set_lights(&mut self, pattern: LightPattern) -> Result<(), ActuatorError> {
        for (light, on) in self.lights.iter_mut().zip(pattern) {
            light.set_level(Level::from(on)).map_err(gpio_error)?;
        }
        Ok(())
    }

    fn set_master(&mut self, on: bool) -> Result<(), ActuatorError> {
        match (on, self.master.is_set_high()) {
            (true, false) => {
                info!("Turning on master LED");
                self.master.set_high().map_err(gpio_error)?;
            }
            (false, true) => {
                info!("Turning off master LED");
                self.master.set_low().map_err(gpio_error)?;
            }
            (desired, _) => {
                debug!("Master LED is already {}", if desired { "on" } else { "off" });
            }
        }
        Ok(())
    }
}
