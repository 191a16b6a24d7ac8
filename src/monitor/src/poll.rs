//! The sampling and control loop.
//!
//! One thread does everything: it waits for the CO2 sensor, then on every
//! iteration re-reads the sensor when the measurement interval has passed,
//! keeps a snapshot when the snapshot interval has passed and answers at most
//! one HTTP request.

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{ActuatorError, MonitorError};
use crate::history::HistoryBuffer;
use crate::http::{Request, Response};
use crate::ports::{AirQualitySensor, ClimateSensor, Clock, CpuProbe, Indicator};
use crate::render::{render, PageState, TemplateSource};
use crate::router::{dashboard, Dashboard, Router};
use crate::state::{ActuatorState, Co2Band, Co2Ppm, CpuInformation};
use crate::transport::{Poll, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForSensorReady,
    Running,
}

/// Everything the loop remembers between iterations.
#[derive(Debug, Clone)]
pub struct LoopContext {
    pub phase: Phase,
    pub last_measurement: Option<f64>,
    pub last_snapshot: Option<f64>,
    pub co2: Option<Co2Ppm>,
    pub band: Option<Co2Band>,
    pub actuator: ActuatorState,
    pub history: HistoryBuffer,
}

impl LoopContext {
    pub fn new(config: &MonitorConfig) -> Self {
        LoopContext {
            phase: Phase::WaitingForSensorReady,
            last_measurement: None,
            last_snapshot: None,
            co2: None,
            band: None,
            actuator: ActuatorState::new(config.lights_enabled),
            history: HistoryBuffer::new(config.thresholds),
        }
    }
}

/// The hardware the loop drives.
pub struct Devices<A, C, I, P> {
    pub air: A,
    pub climate: C,
    pub indicator: I,
    pub cpu: P,
}

pub struct Monitor<A, C, I, P, K> {
    config: MonitorConfig,
    devices: Devices<A, C, I, P>,
    clock: K,
    template: Box<dyn TemplateSource>,
    context: LoopContext,
}

impl<A, C, I, P, K> Monitor<A, C, I, P, K>
where
    A: AirQualitySensor,
    C: ClimateSensor,
    I: Indicator,
    P: CpuProbe,
    K: Clock,
{
    pub fn new(
        config: MonitorConfig,
        devices: Devices<A, C, I, P>,
        clock: K,
        template: Box<dyn TemplateSource>,
    ) -> Self {
        let context = LoopContext::new(&config);
        Monitor {
            config,
            devices,
            clock,
            template,
            context,
        }
    }

    pub fn context(&self) -> &LoopContext {
        &self.context
    }

    /// Wait for the first CO2 result and record it.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        self.devices
            .indicator
            .set_master(self.context.actuator.enabled)?;

        info!("Waiting for CO2 sensor");
        while !self.devices.air.data_ready()? {}

        let now = self.clock.now();
        let co2 = self.devices.air.read()?.map(|reading| reading.co2);
        self.context.history.append(now, co2);
        self.context.co2 = co2;
        self.context.phase = Phase::Running;
        info!("CO2 sensor ready, first reading {:?}", co2);
        Ok(())
    }

    /// One iteration of the running loop.
    pub fn step<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        router: &Router<Self>,
    ) -> Result<Poll, MonitorError> {
        let now = self.clock.now();

        if is_due(self.context.last_measurement, now, self.config.measurement_interval) {
            self.measure()?;
            self.context.last_measurement = Some(now);
        }

        if is_due(self.context.last_snapshot, now, self.config.snapshot_interval) {
            self.context.history.append(now, self.context.co2);
            self.context.last_snapshot = Some(now);
            debug!("Snapshot {:?} at {:.1}s", self.context.co2, now);
        }

        let poll = transport.poll(&mut |request: &Request| router.dispatch(self, request))?;
        Ok(poll)
    }

    /// Run until `stop` returns true, calling `idle` after every iteration.
    ///
    /// Transient network errors are logged and the loop carries on. The
    /// transport is stopped whenever the loop ends.
    pub fn run_until<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        mut idle: impl FnMut(),
        mut stop: impl FnMut() -> bool,
    ) -> Result<(), MonitorError> {
        let router = dashboard::<Self>();
        debug!("Routes: {:?}", router.paths().collect::<Vec<_>>());

        let result = self.run_loop(transport, &router, &mut idle, &mut stop);
        transport.stop();
        result
    }

    /// Run forever; only returns on a fatal error.
    pub fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        idle: impl FnMut(),
    ) -> Result<(), MonitorError> {
        self.run_until(transport, idle, || false)
    }

    fn run_loop<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        router: &Router<Self>,
        idle: &mut impl FnMut(),
        stop: &mut impl FnMut() -> bool,
    ) -> Result<(), MonitorError> {
        if self.context.phase == Phase::WaitingForSensorReady {
            self.start()?;
        }

        while !stop() {
            match self.step(transport, router) {
                Ok(_) => {}
                Err(e) if e.is_transient() => warn!("{}", e),
                Err(e) => {
                    error!("Monitor loop failed: {}", e);
                    return Err(e);
                }
            }
            idle();
        }

        info!("Monitor loop stopped");
        Ok(())
    }

    fn measure(&mut self) -> Result<(), MonitorError> {
        let Some(reading) = self.devices.air.read()? else {
            debug!("No CO2 reading yet");
            return Ok(());
        };

        let band = self.config.thresholds.classify(reading.co2);
        let pattern = self.context.actuator.pattern_for(band);
        self.devices.indicator.set_lights(pattern)?;

        if self.context.band != Some(band) {
            info!("CO2 {} ppm is {}", reading.co2, band);
        }
        self.context.co2 = Some(reading.co2);
        self.context.band = Some(band);
        self.context.actuator.lights = pattern;
        Ok(())
    }
}

fn is_due(last: Option<f64>, now: f64, interval: Duration) -> bool {
    match last {
        Some(last) => now >= last + interval.as_secs_f64(),
        None => true,
    }
}

impl<A, C, I, P, K> Dashboard for Monitor<A, C, I, P, K>
where
    A: AirQualitySensor,
    C: ClimateSensor,
    I: Indicator,
    P: CpuProbe,
    K: Clock,
{
    fn page(&mut self) -> Response {
        let air = self.devices.air.read().unwrap_or_else(|e| {
            warn!("CO2 sensor unavailable: {}", e);
            None
        });
        let climate = match self.devices.climate.read() {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Climate sensor unavailable: {}", e);
                None
            }
        };

        let state = PageState {
            actuator: self.context.actuator,
            cpu_temperature: self.devices.cpu.information().temperature,
            air,
            band: air.map(|reading| self.config.thresholds.classify(reading.co2)),
            climate,
            history: &self.context.history,
        };

        match render(&state, self.template.as_ref()) {
            Ok(page) => Response::html(page),
            Err(e) => {
                error!("Failed to render page: {}", e);
                Response::internal_error()
            }
        }
    }

    fn set_lights_enabled(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        self.devices.indicator.set_master(enabled)?;
        self.context.actuator.enabled = enabled;
        info!("Lights switched {}", self.context.actuator.label());
        Ok(())
    }

    fn cpu_information(&mut self) -> CpuInformation {
        self.devices.cpu.information()
    }
}
