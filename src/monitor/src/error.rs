//! Error types for the monitor core.
//!
//! The poll loop only recovers from [`MonitorError::Io`]; everything else
//! ends the loop and is reported by the caller.

use core::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction failed.
    Bus,
    /// The sensor did not answer in time.
    Timeout,
    /// The frame checksum did not match.
    Checksum,
    /// The sensor reports an internal error.
    Device(u8),
    /// The sensor is not running its measurement firmware.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transaction failed"),
            Self::Timeout => write!(f, "sensor timed out"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Device(code) => write!(f, "sensor error 0x{code:02x}"),
            Self::NotReady => write!(f, "sensor application not running"),
        }
    }
}

impl std::error::Error for SensorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// A GPIO write failed.
    Gpio,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

#[derive(Debug)]
pub enum RenderError {
    /// The template could not be loaded.
    TemplateUnavailable(io::Error),
    /// `{` or `}` without a partner at the given byte offset.
    UnbalancedBrace(usize),
    /// A placeholder with no value.
    UnknownPlaceholder(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemplateUnavailable(e) => write!(f, "template unavailable: {e}"),
            Self::UnbalancedBrace(offset) => write!(f, "unbalanced brace at byte {offset}"),
            Self::UnknownPlaceholder(name) => write!(f, "unknown placeholder {{{name}}}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TemplateUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// No request line before the connection closed.
    Empty,
    /// The request line is not `METHOD TARGET VERSION`.
    MalformedRequestLine,
    /// The method is not one we recognise.
    UnsupportedMethod(String),
    /// The head did not fit the read buffer.
    HeadTooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty request"),
            Self::MalformedRequestLine => write!(f, "malformed request line"),
            Self::UnsupportedMethod(m) => write!(f, "unsupported method {m}"),
            Self::HeadTooLarge => write!(f, "request head too large"),
        }
    }
}

impl std::error::Error for HttpError {}

/// Anything that can stop one iteration of the poll loop.
#[derive(Debug)]
pub enum MonitorError {
    Sensor(SensorError),
    Actuator(ActuatorError),
    /// Network I/O; transient.
    Io(io::Error),
}

impl MonitorError {
    /// Whether the loop should log and carry on.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Io(e) => write!(f, "network: {e}"),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sensor(e) => Some(e),
            Self::Actuator(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<SensorError> for MonitorError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ActuatorError> for MonitorError {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<io::Error> for MonitorError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
