//! Non-blocking HTTP listener serviced from the poll loop.
//!
//! Each poll accepts at most one connection, answers it and closes it. No
//! connection is ever kept open between polls, and a client gets one fixed
//! budget to deliver its whole request head.

use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::HttpError;
use crate::http::{Request, Response};

const MAX_HEAD_LEN: usize = 2048;
const END_OF_HEAD: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Nobody was waiting.
    Idle,
    /// One request was answered.
    Handled,
}

pub trait Transport {
    /// Service at most one pending request with `handler`.
    fn poll(&mut self, handler: &mut dyn FnMut(&Request) -> Response) -> io::Result<Poll>;

    /// Stop accepting connections.
    fn stop(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn poll(&mut self, handler: &mut dyn FnMut(&Request) -> Response) -> io::Result<Poll> {
        (**self).poll(handler)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

pub struct TcpTransport {
    listener: Option<TcpListener>,
    // Budget for receiving a whole request head
    request_timeout: Duration,
}

impl TcpTransport {
    /// Listen on `addr`. Port `0` picks a free port, see [`Self::local_addr`].
    ///
    /// `request_timeout` bounds how long one poll may wait on a client, so it
    /// should stay well below the measurement interval.
    pub fn bind(addr: impl ToSocketAddrs, request_timeout: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("HTTP: listening on {}", listener.local_addr()?);

        Ok(TcpTransport {
            listener: Some(listener),
            request_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.listener {
            Some(listener) => listener.local_addr(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "listener stopped")),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn serve(
        &self,
        mut stream: TcpStream,
        handler: &mut dyn FnMut(&Request) -> Response,
    ) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(Some(self.request_timeout))?;

        let head = read_head(&mut stream, self.request_timeout)?;
        let response = match head.and_then(|head| Request::parse(&head)) {
            Ok(request) => {
                debug!("HTTP: {:?} {}", request.method, request.path);
                handler(&request)
            }
            Err(e) => {
                warn!("HTTP: {}", e);
                Response::bad_request()
            }
        };

        response.write_to(&mut stream)
    }
}

impl Transport for TcpTransport {
    fn poll(&mut self, handler: &mut dyn FnMut(&Request) -> Response) -> io::Result<Poll> {
        let Some(listener) = &self.listener else {
            return Ok(Poll::Idle);
        };

        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Poll::Idle),
            Err(e) => return Err(e),
        };
        debug!("HTTP: connection from {}", peer);

        self.serve(stream, handler)?;
        Ok(Poll::Handled)
    }

    fn stop(&mut self) {
        if self.listener.take().is_some() {
            info!("HTTP: listener stopped");
        }
    }
}

/// A stream whose next read can be bounded in time.
trait TimedRead: Read {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl TimedRead for TcpStream {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout))
    }
}

/// Read until the blank line ending the request head, giving up once
/// `timeout` has passed in total.
fn read_head(
    stream: &mut impl TimedRead,
    timeout: Duration,
) -> io::Result<Result<String, HttpError>> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; MAX_HEAD_LEN];
    let mut len = 0;
    let mut end = None;

    while end.is_none() && len < buf.len() {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|remaining| !remaining.is_zero())
            .ok_or_else(head_timed_out)?;
        stream.set_timeout(remaining)?;

        let read = match stream.read(&mut buf[len..]) {
            Ok(read) => read,
            // Unix reports an expired read timeout as WouldBlock
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Err(head_timed_out()),
            Err(e) => return Err(e),
        };
        if read == 0 {
            break;
        }
        len += read;
        end = buf[..len]
            .windows(END_OF_HEAD.len())
            .position(|w| w == END_OF_HEAD)
            .map(|position| position + END_OF_HEAD.len());
    }

    let head = &buf[..end.unwrap_or(len)];
    if end.is_none() && len == buf.len() && !head.contains(&b'\n') {
        return Ok(Err(HttpError::HeadTooLarge));
    }
    Ok(Ok(String::from_utf8_lossy(head).into_owned()))
}

fn head_timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "request head not received in time")
}
