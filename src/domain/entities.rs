use crate::domain::errors::ClientError;
use crate::domain::value_objects::ParsedUrl;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{StatusCode, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP methods the client knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Methods for which a body is sent and content headers are derived
    pub fn carries_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl FromStr for Method {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(ClientError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents an HTTP request ready to be signed and sent
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: ParsedUrl,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Start offset and duration of one connection phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phase {
    /// Offset from the start of the request, `None` if the phase never ran
    pub start: Option<Duration>,
    pub duration: Duration,
}

/// Connection-lifecycle breakdown of a single request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceTimings {
    pub dns: Phase,
    pub connect: Phase,
    pub tls: Phase,
    pub total: Duration,
}

/// Represents an HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub elapsed: Duration,
    pub timings: TraceTimings,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            elapsed: Duration::ZERO,
            timings: TraceTimings::default(),
        }
    }
}
