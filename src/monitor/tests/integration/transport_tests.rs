//! TCP transport over loopback.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use monitor::http::{Request, Response};
use monitor::render::StaticTemplate;
use monitor::router::dashboard;
use monitor::transport::{Poll, TcpTransport, Transport};
use monitor::{Devices, Monitor, MonitorConfig, MonitorError};

use crate::fakes::{FakeAir, FakeClimate, FakeCpu, ManualClock, RecordingIndicator};

const TIMEOUT: Duration = Duration::from_secs(2);

// Request budget for the slow-client tests
const BUDGET: Duration = Duration::from_millis(300);

fn bind() -> TcpTransport {
    TcpTransport::bind("127.0.0.1:0", TIMEOUT).unwrap()
}

fn send(addr: SocketAddr, raw: &'static str) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        reply
    })
}

fn poll_until_handled(
    transport: &mut TcpTransport,
    handler: &mut dyn FnMut(&Request) -> Response,
) {
    for _ in 0..200 {
        if transport.poll(handler).unwrap() == Poll::Handled {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("no connection arrived");
}

#[test]
fn idle_without_clients() {
    let mut transport = bind();
    let mut handler = |_: &Request| Response::text(200, "unused");

    assert_eq!(transport.poll(&mut handler).unwrap(), Poll::Idle);
}

#[test]
fn answers_get_request() {
    let mut transport = bind();
    let client = send(
        transport.local_addr().unwrap(),
        "GET /hello?x=1 HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );

    let mut seen = Vec::new();
    poll_until_handled(&mut transport, &mut |request: &Request| {
        seen.push(request.path.clone());
        Response::text(200, "hi")
    });

    let reply = client.join().unwrap();
    assert_eq!(seen, vec!["/hello".to_string()]);
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Length: 2\r\n"));
    assert!(reply.ends_with("\r\n\r\nhi"));
}

#[test]
fn malformed_request_is_bad_request() {
    let mut transport = bind();
    let client = send(transport.local_addr().unwrap(), "NONSENSE\r\n\r\n");

    let mut called = false;
    poll_until_handled(&mut transport, &mut |_: &Request| {
        called = true;
        Response::text(200, "unreachable")
    });

    assert!(!called);
    assert!(client.join().unwrap().starts_with("HTTP/1.1 400"));
}

#[test]
fn stop_releases_listener() {
    let mut transport = bind();
    assert!(transport.is_listening());

    transport.stop();

    assert!(!transport.is_listening());
    assert!(transport.local_addr().is_err());
    let mut handler = |_: &Request| Response::text(200, "unused");
    assert_eq!(transport.poll(&mut handler).unwrap(), Poll::Idle);
}

#[test]
fn monitor_serves_cpu_information_over_tcp() {
    let devices = Devices {
        air: FakeAir::with_co2(800),
        climate: FakeClimate::new(20.0, 50.0),
        indicator: RecordingIndicator::default(),
        cpu: FakeCpu,
    };
    let mut monitor = Monitor::new(
        MonitorConfig::default(),
        devices,
        ManualClock::default(),
        Box::new(StaticTemplate("{co2_level}")),
    );
    monitor.start().unwrap();
    let router = dashboard();

    let mut transport = bind();
    let client = send(
        transport.local_addr().unwrap(),
        "GET /cpu-information HTTP/1.1\r\n\r\n",
    );

    for _ in 0..200 {
        if monitor.step(&mut transport, &router).unwrap() == Poll::Handled {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let reply = client.join().unwrap();
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: application/json\r\n"));
    assert!(reply.ends_with(r#"{"temperature":36.6,"frequency":160000000,"voltage":3.3}"#));
}

/// Poll until a connection is accepted and return the outcome and how long
/// that last poll took.
fn poll_until_accepted(transport: &mut TcpTransport) -> (io::Result<Poll>, Duration) {
    let mut handler = |_: &Request| Response::text(200, "late");
    for _ in 0..200 {
        let started = Instant::now();
        let result = transport.poll(&mut handler);
        if !matches!(result, Ok(Poll::Idle)) {
            return (result, started.elapsed());
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("no connection arrived");
}

#[test]
fn slow_client_gets_one_budget_for_the_whole_head() {
    let mut transport = TcpTransport::bind("127.0.0.1:0", BUDGET).unwrap();
    let addr = transport.local_addr().unwrap();
    let client = thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        for byte in b"GET / HTTP/1.1\r\n\r\n" {
            thread::sleep(Duration::from_millis(100));
            if stream.write_all(&[*byte]).is_err() {
                break;
            }
        }
    });

    let (result, took) = poll_until_accepted(&mut transport);

    assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
    assert!(took < BUDGET * 3, "poll blocked for {:?}", took);
    client.join().unwrap();
}

#[test]
fn stalled_client_does_not_hold_up_measurements() {
    let indicator = RecordingIndicator::default();
    let clock = ManualClock::default();
    let devices = Devices {
        air: FakeAir::with_co2(1500),
        climate: FakeClimate::new(20.0, 50.0),
        indicator: indicator.clone(),
        cpu: FakeCpu,
    };
    let mut monitor = Monitor::new(
        MonitorConfig::default(),
        devices,
        clock.clone(),
        Box::new(StaticTemplate("{co2_level}")),
    );
    monitor.start().unwrap();
    let router = dashboard();

    let mut transport = TcpTransport::bind("127.0.0.1:0", BUDGET).unwrap();
    let addr = transport.local_addr().unwrap();
    let client = thread::spawn(move || {
        // Connect and never send anything
        let stream = TcpStream::connect(addr).unwrap();
        thread::sleep(Duration::from_secs(1));
        drop(stream);
    });

    let mut error = None;
    for _ in 0..200 {
        let started = Instant::now();
        match monitor.step(&mut transport, &router) {
            Ok(Poll::Idle) => thread::sleep(Duration::from_millis(10)),
            Ok(Poll::Handled) => panic!("a silent client was answered"),
            Err(e) => {
                assert!(started.elapsed() < BUDGET * 3);
                error = Some(e);
                break;
            }
        }
    }

    let error = error.expect("no connection arrived");
    assert!(error.is_transient());
    assert!(matches!(error, MonitorError::Io(ref e) if e.kind() == io::ErrorKind::TimedOut));
    assert_eq!(indicator.light_updates(), 1);

    clock.set(2.0);
    monitor.step(&mut transport, &router).unwrap();
    assert_eq!(indicator.light_updates(), 2);

    client.join().unwrap();
}
