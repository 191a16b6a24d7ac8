//! Just enough HTTP/1.1 to answer a browser.

use std::io::{self, Write};

use embedded_svc::http::Method;

use crate::error::HttpError;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    // Target without query string
    pub path: String,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Request::new(Method::Get, path)
    }

    /// Parse the request line at the start of `head`. Headers are ignored.
    pub fn parse(head: &str) -> Result<Self, HttpError> {
        let line = head.lines().next().ok_or(HttpError::Empty)?;
        if line.trim().is_empty() {
            return Err(HttpError::Empty);
        }

        let mut parts = line.split_whitespace();
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(HttpError::MalformedRequestLine);
        };
        if !version.starts_with("HTTP/") {
            return Err(HttpError::MalformedRequestLine);
        }

        let method =
            parse_method(method).ok_or_else(|| HttpError::UnsupportedMethod(method.to_string()))?;
        let path = target.split(['?', '#']).next().unwrap_or_default();

        Ok(Request::new(method, path))
    }

    pub fn is_get(&self) -> bool {
        matches!(self.method, Method::Get)
    }
}

fn parse_method(method: &str) -> Option<Method> {
    let method = match method {
        "GET" => Method::Get,
        "HEAD" => Method::Head,
        "POST" => Method::Post,
        "PUT" => Method::Put,
        "DELETE" => Method::Delete,
        "PATCH" => Method::Patch,
        "OPTIONS" => Method::Options,
        "CONNECT" => Method::Connect,
        "TRACE" => Method::Trace,
        _ => return None,
    };
    Some(method)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn html(body: String) -> Self {
        Response {
            status: 200,
            content_type: "text/html",
            body,
        }
    }

    pub fn json(body: String) -> Self {
        Response {
            status: 200,
            content_type: "application/json",
            body,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Response {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }

    pub fn bad_request() -> Self {
        Response::text(400, "Bad Request")
    }

    pub fn not_found() -> Self {
        Response::text(404, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Response::text(405, "Method Not Allowed")
    }

    pub fn internal_error() -> Self {
        Response::text(500, "Internal Server Error")
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len()
        )?;
        writer.write_all(self.body.as_bytes())?;
        writer.flush()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}
