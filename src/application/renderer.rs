use crate::domain::entities::Response;
use crate::domain::errors::FormatError;
use hyper::StatusCode;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Parts of a response that can be printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Status,
    StatusCode,
    Headers,
    Body,
}

impl FromStr for Component {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Component::Status),
            "statuscode" => Ok(Component::StatusCode),
            "headers" => Ok(Component::Headers),
            "body" => Ok(Component::Body),
            _ => Err(FormatError::InvalidFormatSpecifier(s.trim().to_string())),
        }
    }
}

impl Component {
    /// Parses a comma separated component list such as `status,headers,body`
    pub fn parse_list(spec: &str) -> Result<Vec<Component>, FormatError> {
        spec.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Component::from_str)
            .collect()
    }

    pub fn defaults() -> Vec<Component> {
        vec![Component::Body]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatter {
    #[default]
    Text,
    Json,
}

/// Formatted output plus the fail-on-status verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    formatter: Formatter,
    components: Vec<Component>,
    fail_on_status: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Formatter::Text, Component::defaults(), false)
    }
}

impl Renderer {
    pub fn new(formatter: Formatter, components: Vec<Component>, fail_on_status: bool) -> Self {
        Self {
            formatter,
            components,
            fail_on_status,
        }
    }

    /// Builds a renderer from a component list string, rejecting unknown names
    pub fn from_spec(formatter: Formatter, spec: &str, fail_on_status: bool) -> Result<Self, FormatError> {
        Ok(Self::new(formatter, Component::parse_list(spec)?, fail_on_status))
    }

    pub fn render(&self, response: &Response) -> Rendered {
        let bytes = match self.formatter {
            Formatter::Text => self.render_text(response),
            Formatter::Json => self.render_json(response),
        };
        Rendered {
            bytes,
            failed: self.is_failure(response.status),
        }
    }

    pub fn is_failure(&self, status: StatusCode) -> bool {
        self.fail_on_status && status.as_u16() >= 400
    }

    fn render_text(&self, response: &Response) -> Vec<u8> {
        let mut out = Vec::new();
        for component in &self.components {
            match component {
                Component::Status => {
                    out.extend_from_slice(
                        format!("{:?} {}\n", response.version, status_line(response.status)).as_bytes(),
                    );
                }
                Component::StatusCode => {
                    out.extend_from_slice(format!("{}\n", response.status.as_u16()).as_bytes());
                }
                Component::Headers => {
                    for (name, value) in response.headers.iter() {
                        out.extend_from_slice(name.as_str().as_bytes());
                        out.extend_from_slice(b": ");
                        out.extend_from_slice(value.as_bytes());
                        out.push(b'\n');
                    }
                    out.push(b'\n');
                }
                Component::Body => {
                    let body = render_body(response);
                    out.extend_from_slice(&body);
                    if !body.is_empty() && !body.ends_with(b"\n") {
                        out.push(b'\n');
                    }
                }
            }
        }
        out
    }

    fn render_json(&self, response: &Response) -> Vec<u8> {
        let mut object = Map::new();
        for component in &self.components {
            match component {
                Component::Status => {
                    object.insert("status".into(), Value::String(status_line(response.status)));
                }
                Component::StatusCode => {
                    object.insert("statusCode".into(), Value::from(response.status.as_u16()));
                }
                Component::Headers => {
                    object.insert("headers".into(), headers_to_json(&response.headers));
                }
                Component::Body => {
                    let body = if is_empty_no_content(response) {
                        Value::Null
                    } else if is_json(&response.headers) {
                        serde_json::from_slice(&response.body).unwrap_or_else(|_| {
                            Value::String(String::from_utf8_lossy(&response.body).into_owned())
                        })
                    } else {
                        Value::String(String::from_utf8_lossy(&response.body).into_owned())
                    };
                    object.insert("body".into(), body);
                }
            }
        }

        let mut out = serde_json::to_vec_pretty(&Value::Object(object)).unwrap_or_default();
        out.push(b'\n');
        out
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

fn is_empty_no_content(response: &Response) -> bool {
    response.status == StatusCode::NO_CONTENT && !response.headers.contains_key(CONTENT_LENGTH)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}

fn render_body(response: &Response) -> Vec<u8> {
    if is_empty_no_content(response) {
        return Vec::new();
    }
    if is_json(&response.headers) {
        if let Ok(pretty) = serde_json::from_slice::<Value>(&response.body)
            .and_then(|json| serde_json::to_vec_pretty(&json))
        {
            return pretty;
        }
    }
    response.body.to_vec()
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        map.insert(name.as_str().to_string(), Value::Array(values));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use hyper::header::HeaderValue;

    fn response(status: u16, content_type: Option<&'static str>, body: &'static [u8]) -> Response {
        let mut response = Response::new(StatusCode::from_u16(status).unwrap());
        if let Some(ct) = content_type {
            response.headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        response.body = Bytes::from_static(body);
        response
    }

    #[test]
    fn unknown_component_is_rejected() {
        let err = Renderer::from_spec(Formatter::Text, "status,cookies", false).unwrap_err();
        assert_eq!(err, FormatError::InvalidFormatSpecifier("cookies".into()));
    }

    #[test]
    fn component_list_parsing() {
        assert_eq!(
            Component::parse_list("Status, statuscode,headers,body").unwrap(),
            vec![
                Component::Status,
                Component::StatusCode,
                Component::Headers,
                Component::Body
            ]
        );
    }

    #[test]
    fn json_body_is_pretty_printed() {
        let renderer = Renderer::default();
        let out = renderer.render(&response(200, Some("application/json; charset=utf-8"), br#"{"a":[1,2]}"#));
        let text = String::from_utf8(out.bytes).unwrap();
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ]\n}\n");
        assert!(!out.failed);
    }

    #[test]
    fn invalid_json_falls_back_to_raw_bytes() {
        let renderer = Renderer::default();
        let out = renderer.render(&response(200, Some("application/json"), b"{not json"));
        assert_eq!(out.bytes, b"{not json\n");
    }

    #[test]
    fn no_content_without_length_renders_nothing() {
        let renderer = Renderer::default();
        let out = renderer.render(&response(204, None, b""));
        assert!(out.bytes.is_empty());
    }

    #[test]
    fn status_and_headers_in_text_form() {
        let renderer = Renderer::from_spec(Formatter::Text, "status,statuscode,headers", false).unwrap();
        let out = renderer.render(&response(404, Some("text/plain"), b"missing"));
        let text = String::from_utf8(out.bytes).unwrap();
        assert_eq!(text, "HTTP/1.1 404 Not Found\n404\ncontent-type: text/plain\n\n");
    }

    #[test]
    fn fail_on_status_still_produces_output() {
        let renderer = Renderer::from_spec(Formatter::Text, "status,body", true).unwrap();
        let out = renderer.render(&response(500, Some("text/plain"), b"boom"));
        assert!(out.failed);
        assert!(!out.bytes.is_empty());
        assert!(String::from_utf8(out.bytes).unwrap().contains("boom"));
    }

    #[test]
    fn error_status_without_flag_does_not_fail() {
        let renderer = Renderer::default();
        assert!(!renderer.render(&response(503, None, b"")).failed);
        let strict = Renderer::new(Formatter::Text, Component::defaults(), true);
        assert!(!strict.is_failure(StatusCode::FOUND));
        assert!(strict.is_failure(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn json_formatter_builds_one_object() {
        let renderer = Renderer::from_spec(Formatter::Json, "statuscode,headers,body", false).unwrap();
        let out = renderer.render(&response(201, Some("application/json"), br#"{"id":7}"#));
        let value: Value = serde_json::from_slice(&out.bytes).unwrap();
        assert_eq!(value["statusCode"], 201);
        assert_eq!(value["headers"]["content-type"][0], "application/json");
        assert_eq!(value["body"]["id"], 7);
    }
}
