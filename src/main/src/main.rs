use core::time::Duration;

use anyhow::Result;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{
        delay::FreeRtos,
        prelude::Peripherals,
    },
    nvs::EspDefaultNvsPartition,
};
use log::*;
use monitor::render::{missing_placeholders, StaticTemplate};
use monitor::transport::TcpTransport;
use monitor::{Devices, Monitor, MonotonicClock};

mod ccs811;
mod config;
mod cpu;
mod dht;
mod indicator;
mod wifi;

use ccs811::Ccs811;
use config::Config;
use cpu::Cpu;
use dht::Dht22;
use indicator::TrafficLight;
use wifi::Wifi;

const INDEX_HTML: &str = include_str!("../static/index.html");

// Longest one client may hold up the loop, well inside the measurement interval
const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = Config::read()?;
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let indicator = TrafficLight::new(
        pins.gpio2.into(),
        pins.gpio1.into(),
        pins.gpio0.into(),
        pins.gpio10.into(),
    )?;

    let air = Ccs811::new(peripherals.i2c0, pins.gpio6.into(), pins.gpio7.into())?;
    let climate = Dht22::new(pins.gpio3.into())?;
    let cpu = Cpu::new(peripherals.temp_sensor);

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = Wifi::connect(
        peripherals.modem,
        sysloop,
        Some(nvs),
        config.wifi_ssid,
        config.wifi_psk,
    )?;
    let ip = wifi.wait_for_connected()?;

    let missing = missing_placeholders(INDEX_HTML);
    if !missing.is_empty() {
        warn!("Dashboard template does not use {:?}", missing);
    }

    let mut transport = TcpTransport::bind(("0.0.0.0", config.http_port), REQUEST_TIMEOUT)?;
    info!("Dashboard at http://{}:{}/", ip, config.http_port);

    let devices = Devices {
        air,
        climate,
        indicator,
        cpu,
    };
    let mut monitor = Monitor::new(
        config.monitor,
        devices,
        MonotonicClock::new(),
        Box::new(StaticTemplate(INDEX_HTML)),
    );

    // Yield every iteration so lower priority tasks and the idle watchdog get to run
    monitor.run(&mut transport, || FreeRtos::delay_ms(10))?;

    drop(wifi);
    Ok(())
}
