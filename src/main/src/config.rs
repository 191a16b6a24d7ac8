use core::time::Duration;

use anyhow::{bail, Result};
use monitor::MonitorConfig;

#[toml_cfg::toml_config]
pub struct TomlConfig {
    #[default("")]
    wifi_ssid: &'static str,
    #[default("")]
    wifi_psk: &'static str,
    #[default(80)]
    http_port: u16,
    #[default(2000)]
    measurement_interval_ms: u64,
    #[default(60000)]
    snapshot_interval_ms: u64,
}

pub struct Config {
    pub wifi_ssid: &'static str,
    pub wifi_psk: &'static str,
    pub http_port: u16,
    pub monitor: MonitorConfig,
}

impl Config {
    pub fn read() -> Result<Self> {
        Config::try_from(TOML_CONFIG)
    }
}

impl TryFrom<TomlConfig> for Config {
    type Error = anyhow::Error;

    fn try_from(config: TomlConfig) -> Result<Self> {
        if config.wifi_ssid.is_empty() {
            bail!("wifi_ssid is not set in cfg.toml");
        }
        if config.wifi_psk.is_empty() {
            bail!("wifi_psk is not set in cfg.toml");
        }
        if config.measurement_interval_ms == 0 || config.snapshot_interval_ms == 0 {
            bail!("Intervals in cfg.toml must be greater than zero");
        }

        Ok(Config {
            wifi_ssid: config.wifi_ssid,
            wifi_psk: config.wifi_psk,
            http_port: config.http_port,
            monitor: MonitorConfig {
                measurement_interval: Duration::from_millis(config.measurement_interval_ms),
                snapshot_interval: Duration::from_millis(config.snapshot_interval_ms),
                ..MonitorConfig::default()
            },
        })
    }
}
