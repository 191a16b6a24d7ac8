use anyhow::{anyhow, Result};
use esp_idf_svc::ipv4::Ipv4Addr;
use esp_idf_svc::hal::{delay::FreeRtos, modem::WifiModemPeripheral, peripheral::Peripheral};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};
use log::*;

/// Station-mode wifi. Dropping it disconnects.
pub struct Wifi<'d> {
    esp_wifi: EspWifi<'d>,
}

impl<'d> Wifi<'d> {
    pub fn connect(
        modem: impl Peripheral<P = impl WifiModemPeripheral + 'd> + 'd,
        sysloop: EspSystemEventLoop,
        partition: Option<EspDefaultNvsPartition>,
        ssid: &str,
        psk: &str,
    ) -> Result<Wifi<'d>> {
        let mut wifi = EspWifi::new(modem, sysloop, partition)?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| anyhow!("Could not parse SSID into Wifi config"))?,
            password: psk
                .try_into()
                .map_err(|_| anyhow!("Could not parse PSK into Wifi config"))?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        }))?;

        info!("Connecting to wifi {}", ssid);
        wifi.start()?;
        wifi.connect()?;

        Ok(Wifi { esp_wifi: wifi })
    }

    /// Block until the station has an address and return it.
    pub fn wait_for_connected(&self) -> Result<Ipv4Addr> {
        loop {
            FreeRtos::delay_ms(250);
            if self.esp_wifi.is_up()? {
                break;
            }
        }

        let ip = self.esp_wifi.sta_netif().get_ip_info()?.ip;
        info!("Connected to wifi with address {}", ip);

        Ok(ip)
    }
}
