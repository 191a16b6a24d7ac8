//! Poll loop behaviour against fake sensors, lights, clock and transport.

use std::io;

use monitor::render::{StaticTemplate, TemplateSource};
use monitor::router::{dashboard, Router};
use monitor::{
    classify, ActuatorError, Co2Band, Co2Ppm, Devices, HistoryBuffer, Monitor, MonitorConfig,
    MonitorError, Phase, SensorError, ALL_OFF,
};

use crate::fakes::{
    FakeAir, FakeClimate, FakeCpu, ManualClock, RecordingIndicator, ScriptedTransport,
    UnreadableTemplate,
};

type TestMonitor = Monitor<FakeAir, FakeClimate, RecordingIndicator, FakeCpu, ManualClock>;

const PAGE: &str = "{state} {co2} {co2_level} {temperature} {humidity} {cpu_temperature}";

struct Rig {
    monitor: TestMonitor,
    router: Router<TestMonitor>,
    air: FakeAir,
    climate: FakeClimate,
    indicator: RecordingIndicator,
    clock: ManualClock,
}

fn rig_with(config: MonitorConfig, template: Box<dyn TemplateSource>) -> Rig {
    let air = FakeAir::with_co2(1500);
    let climate = FakeClimate::new(21.5, 40.0);
    let indicator = RecordingIndicator::default();
    let clock = ManualClock::default();

    let devices = Devices {
        air: air.clone(),
        climate: climate.clone(),
        indicator: indicator.clone(),
        cpu: FakeCpu,
    };
    let monitor = Monitor::new(config, devices, clock.clone(), template);

    Rig {
        monitor,
        router: dashboard::<TestMonitor>(),
        air,
        climate,
        indicator,
        clock,
    }
}

fn rig() -> Rig {
    rig_with(MonitorConfig::default(), Box::new(StaticTemplate(PAGE)))
}

impl Rig {
    fn step(&mut self, transport: &mut ScriptedTransport) {
        self.monitor.step(transport, &self.router).unwrap();
    }

    fn step_at(&mut self, seconds: f64, transport: &mut ScriptedTransport) {
        self.clock.set(seconds);
        self.step(transport);
    }
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_spins_until_sensor_ready() {
    let mut rig = rig();
    rig.air.not_ready_for(3);

    assert_eq!(rig.monitor.context().phase, Phase::WaitingForSensorReady);
    rig.monitor.start().unwrap();

    assert_eq!(rig.air.ready_polls(), 4);
    assert_eq!(rig.monitor.context().phase, Phase::Running);
    assert_eq!(rig.monitor.context().history.len(), 1);
    assert_eq!(rig.indicator.master(), Some(true));
}

#[test]
fn start_without_reading_records_nothing() {
    let mut rig = rig();
    rig.air.clear();

    rig.monitor.start().unwrap();

    assert!(rig.monitor.context().history.is_empty());
    assert_eq!(rig.monitor.context().co2, None);
}

// ── Measurement ───────────────────────────────────────────────

#[test]
fn measures_once_per_interval() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    assert_eq!(rig.indicator.light_updates(), 1);

    rig.step_at(1.9, &mut transport);
    assert_eq!(rig.indicator.light_updates(), 1);

    rig.step_at(2.0, &mut transport);
    assert_eq!(rig.indicator.light_updates(), 2);

    rig.step_at(3.0, &mut transport);
    assert_eq!(rig.indicator.light_updates(), 2);

    rig.step_at(4.5, &mut transport);
    assert_eq!(rig.indicator.light_updates(), 3);
    assert_eq!(rig.monitor.context().last_measurement, Some(4.5));
}

#[test]
fn lights_follow_band() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    assert_eq!(rig.indicator.last_lights(), Some([false, true, false]));
    assert_eq!(rig.monitor.context().band, Some(Co2Band::Medium));

    rig.air.set_co2(2500);
    rig.step_at(2.0, &mut transport);
    assert_eq!(rig.indicator.last_lights(), Some([true, false, false]));

    rig.air.set_co2(500);
    rig.step_at(4.0, &mut transport);
    assert_eq!(rig.indicator.last_lights(), Some([false, false, true]));
    assert_eq!(rig.monitor.context().actuator.lights, [false, false, true]);
}

#[test]
fn disabled_lights_stay_off() {
    let config = MonitorConfig {
        lights_enabled: false,
        ..MonitorConfig::default()
    };
    let mut rig = rig_with(config, Box::new(StaticTemplate(PAGE)));
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);

    assert_eq!(rig.indicator.master(), Some(false));
    assert_eq!(rig.indicator.last_lights(), Some(ALL_OFF));
    assert_eq!(rig.monitor.context().band, Some(Co2Band::Medium));
}

#[test]
fn missing_reading_leaves_lights_alone() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();
    rig.step_at(0.0, &mut transport);

    rig.air.clear();
    rig.step_at(2.0, &mut transport);

    assert_eq!(rig.indicator.light_updates(), 1);
    assert_eq!(rig.monitor.context().co2, Some(Co2Ppm::new(1500)));
}

// ── Snapshots ─────────────────────────────────────────────────

#[test]
fn snapshots_once_per_minute() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();

    for seconds in [0.0, 30.0, 60.0, 90.0, 120.0] {
        rig.step_at(seconds, &mut transport);
    }

    let timestamps: Vec<f64> = rig
        .monitor
        .context()
        .history
        .iter()
        .map(|entry| entry.timestamp)
        .collect();
    assert_eq!(timestamps, vec![0.0, 0.0, 60.0, 120.0]);
}

#[test]
fn snapshots_classify_low_medium_high() {
    let mut history = HistoryBuffer::default();
    history.append(0.0, Some(Co2Ppm::new(500)));
    history.append(60.0, Some(Co2Ppm::new(1500)));
    history.append(120.0, Some(Co2Ppm::new(2500)));

    let bands: Vec<Co2Band> = history.iter().map(|entry| classify(entry.co2)).collect();
    assert_eq!(bands, vec![Co2Band::Low, Co2Band::Medium, Co2Band::High]);
}

#[test]
fn loop_snapshots_track_readings() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.air.clear();
    rig.monitor.start().unwrap();

    for (seconds, co2) in [(0.0, 500), (60.0, 1500), (120.0, 2500)] {
        rig.air.set_co2(co2);
        rig.step_at(seconds, &mut transport);
    }

    let history = &rig.monitor.context().history;
    assert_eq!(history.len(), 3);
    let bands: Vec<Co2Band> = history.iter().map(|entry| classify(entry.co2)).collect();
    assert_eq!(bands, vec![Co2Band::Low, Co2Band::Medium, Co2Band::High]);
}

// ── Requests ──────────────────────────────────────────────────

#[test]
fn services_one_request_per_iteration() {
    let mut rig = rig();
    let mut transport =
        ScriptedTransport::new([ScriptedTransport::get("/"), ScriptedTransport::get("/")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    assert_eq!(transport.responses.len(), 1);

    rig.step_at(0.5, &mut transport);
    assert_eq!(transport.responses.len(), 2);
    assert_eq!(transport.polls, 2);
}

#[test]
fn page_shows_current_state() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([ScriptedTransport::get("/")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);

    let response = transport.last_response();
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/html");
    assert_eq!(response.body, "ON 1500 yellow 21.5 40.0 36.6");
}

#[test]
fn page_without_climate_reading() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([ScriptedTransport::get("/")]);
    rig.monitor.start().unwrap();
    rig.climate.fail();

    rig.step_at(0.0, &mut transport);

    assert_eq!(transport.last_response().body, "ON 1500 yellow None None 36.6");
}

#[test]
fn page_renders_identically_twice() {
    let mut rig = rig();
    let mut transport =
        ScriptedTransport::new([ScriptedTransport::get("/"), ScriptedTransport::get("/")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    rig.step_at(0.1, &mut transport);

    assert_eq!(transport.responses[0], transport.responses[1]);
}

#[test]
fn light_switch_requests() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([ScriptedTransport::get("/lightoff")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    assert!(transport.last_response().body.starts_with("OFF "));
    assert_eq!(rig.indicator.master(), Some(false));
    assert!(!rig.monitor.context().actuator.enabled);

    rig.step_at(2.0, &mut transport);
    assert_eq!(rig.indicator.last_lights(), Some(ALL_OFF));

    transport.push(ScriptedTransport::get("/lighton"));
    rig.step_at(2.5, &mut transport);
    assert!(transport.last_response().body.starts_with("ON "));
    assert_eq!(rig.indicator.master(), Some(true));

    rig.step_at(4.0, &mut transport);
    assert_eq!(rig.indicator.last_lights(), Some([false, true, false]));
}

#[test]
fn cpu_information_request() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([ScriptedTransport::get("/cpu-information/")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);

    let response = transport.last_response();
    assert_eq!(response.content_type, "application/json");
    assert_eq!(
        response.body,
        r#"{"temperature":36.6,"frequency":160000000,"voltage":3.3}"#
    );
}

#[test]
fn unknown_path_is_not_found() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([ScriptedTransport::get("/nope")]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);

    assert_eq!(transport.last_response().status, 404);
}

#[test]
fn missing_template_fails_only_the_request() {
    let mut rig = rig_with(
        MonitorConfig::default(),
        Box::new(UnreadableTemplate),
    );
    let mut transport = ScriptedTransport::new([
        ScriptedTransport::get("/"),
        ScriptedTransport::get("/cpu-information"),
    ]);
    rig.monitor.start().unwrap();

    rig.step_at(0.0, &mut transport);
    assert_eq!(transport.last_response().status, 500);

    rig.step_at(1.0, &mut transport);
    assert_eq!(transport.last_response().status, 200);
}

// ── Running and stopping ──────────────────────────────────────

#[test]
fn transient_network_errors_are_survived() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::new([
        crate::fakes::Scripted::Error(io::ErrorKind::ConnectionReset),
        ScriptedTransport::get("/"),
        crate::fakes::Scripted::Error(io::ErrorKind::TimedOut),
    ]);

    let mut iterations = 0;
    let mut idles = 0;
    let result = rig.monitor.run_until(
        &mut transport,
        || idles += 1,
        || {
            iterations += 1;
            iterations > 5
        },
    );

    assert!(result.is_ok());
    assert_eq!(transport.polls, 5);
    assert_eq!(idles, 5);
    assert_eq!(transport.responses.len(), 1);
    assert!(transport.stopped);
    assert_eq!(rig.monitor.context().phase, Phase::Running);
}

#[test]
fn sensor_failure_is_fatal() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();
    rig.air.fail_with(SensorError::Bus);

    let result = rig.monitor.run(&mut transport, || {});

    assert!(matches!(result, Err(MonitorError::Sensor(SensorError::Bus))));
    assert!(transport.stopped);
}

#[test]
fn actuator_failure_is_fatal() {
    let mut rig = rig();
    let mut transport = ScriptedTransport::default();
    rig.monitor.start().unwrap();
    rig.indicator.fail();

    let result = rig.monitor.run(&mut transport, || {});

    assert!(matches!(result, Err(MonitorError::Actuator(ActuatorError::Gpio))));
    assert!(transport.stopped);
}
