use crate::domain::entities::{Method, Request};
use crate::domain::errors::ClientError;
use crate::domain::value_objects::{ParsedUrl, RequestBody};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use std::str::FromStr;

#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<ParsedUrl>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: &str) -> Result<Self, ClientError> {
        self.method = Some(Method::from_str(method)?);
        Ok(self)
    }

    pub fn url(mut self, url: ParsedUrl) -> Self {
        self.url = Some(url);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: &RequestBody) -> Self {
        self.body = body.bytes.clone();
        self
    }

    pub fn build(self) -> Result<Request, ClientError> {
        let method = self
            .method
            .ok_or_else(|| ClientError::Build("method is required".to_string()))?;
        let url = self
            .url
            .ok_or_else(|| ClientError::Build("URL is required".to_string()))?;

        // GET and friends never send a payload, even if stdin had data
        let body = if method.carries_body() || method == Method::Delete {
            self.body
        } else {
            Bytes::new()
        };

        Ok(Request {
            method,
            url,
            headers: self.headers,
            body,
        })
    }
}
