use anyhow::{bail, Result};
use esp_idf_svc::hal::{
    delay::{self, FreeRtos},
    gpio::AnyIOPin,
    i2c::{I2c, I2cConfig, I2cDriver},
    peripheral::Peripheral,
    prelude::FromValueType,
};
use esp_idf_svc::sys::EspError;
use log::*;
use monitor::ccs811::{
    decode_result, register, MeasMode, Status, DEFAULT_ADDRESS, HARDWARE_ID, RESET_SEQUENCE,
    RESULT_LEN,
};
use monitor::{AirQuality, AirQualitySensor, SensorError};

// Standard mode; the sensor stretches the clock while it wakes up
const BAUDRATE_KHZ: u32 = 100;

/// CCS811 on its own I2C bus.
pub struct Ccs811<'d> {
    driver: I2cDriver<'d>,
    address: u8,
    // The sensor only hands out each result once
    last: Option<AirQuality>,
}

impl<'d> Ccs811<'d> {
    pub fn new(
        i2c: impl Peripheral<P = impl I2c> + 'd,
        sda: AnyIOPin,
        scl: AnyIOPin,
    ) -> Result<Self> {
        let config = I2cConfig::new().baudrate(BAUDRATE_KHZ.kHz().into());
        let driver = I2cDriver::new(i2c, sda, scl, &config)?;

        let mut sensor = Ccs811 {
            driver,
            address: DEFAULT_ADDRESS,
            last: None,
        };
        sensor.init()?;
        Ok(sensor)
    }

    fn init(&mut self) -> Result<()> {
        let mut reset = [register::SW_RESET; 1 + RESET_SEQUENCE.len()];
        reset[1..].copy_from_slice(&RESET_SEQUENCE);
        self.driver.write(self.address, &reset, delay::BLOCK)?;
        FreeRtos::delay_ms(20);

        let hardware_id = self.read_register(register::HW_ID)?;
        if hardware_id != HARDWARE_ID {
            bail!("Unexpected CCS811 hardware id {:#04x}", hardware_id);
        }

        if !Status(self.read_register(register::STATUS)?).app_valid() {
            bail!("CCS811 has no valid application firmware");
        }
        self.driver
            .write(self.address, &[register::APP_START], delay::BLOCK)?;
        FreeRtos::delay_ms(20);
        if !Status(self.read_register(register::STATUS)?).firmware_mode() {
            bail!("CCS811 did not enter application mode");
        }

        let mode = MeasMode::default();
        self.driver
            .write(self.address, &[register::MEAS_MODE, u8::from(mode)], delay::BLOCK)?;
        info!("CCS811 measuring in {:?} mode", mode.drive_mode);
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, EspError> {
        let mut buf: [u8; 1] = [0; 1];
        self.driver
            .write_read(self.address, &[register], &mut buf, delay::BLOCK)?;
        Ok(buf[0])
    }

    fn status(&mut self) -> Result<Status, SensorError> {
        let status = Status(self.read_register(register::STATUS).map_err(bus_error)?);
        if status.error() {
            let code = self
                .read_register(register::ERROR_ID)
                .map_err(bus_error)?;
            return Err(SensorError::Device(code));
        }
        Ok(status)
    }
}

fn bus_error(e: EspError) -> SensorError {
    warn!("CCS811 transfer failed: {}", e);
    SensorError::Bus
}

impl AirQualitySensor for Ccs811<'_> {
    fn data_ready(&mut self) -> Result<bool, SensorError> {
        Ok(self.status()?.data_ready())
    }

    fn read(&mut self) -> Result<Option<AirQuality>, SensorError> {
        if self.status()?.data_ready() {
            let mut frame = [0u8; RESULT_LEN];
            self.driver
                .write_read(
                    self.address,
                    &[register::ALG_RESULT_DATA],
                    &mut frame,
                    delay::BLOCK,
                )
                .map_err(bus_error)?;
            self.last = Some(decode_result(&frame)?);
        }
        Ok(self.last)
    }
}
