use crate::domain::entities::Method;
use crate::domain::errors::AssembleError;
use crate::domain::value_objects::{MimeHint, RequestBody};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Where the request body comes from. At most one source may be set.
#[derive(Debug, Clone, Default)]
pub struct DataOptions {
    /// Literal body text
    pub inline: Option<String>,
    /// Path to a body file; a path that does not exist is sent as literal text
    pub file: Option<String>,
    /// Read the body from standard input
    pub stdin: bool,
}

/// Assembles request headers and bodies from user input
pub struct RequestAssembler;

impl RequestAssembler {
    /// Parses a single `Name: Value` header
    pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), AssembleError> {
        let invalid = || AssembleError::InvalidHeaderFormat(raw.to_string());

        let (name, value) = raw.split_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }

        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
        Ok((name, value))
    }

    /// Builds the outgoing header set from `-H` arguments plus the default
    /// header string. Explicit headers win over defaults of the same name.
    pub fn build_headers(
        explicit: &[String],
        default_spec: Option<&str>,
    ) -> Result<HeaderMap, AssembleError> {
        let mut headers = HeaderMap::new();
        for raw in explicit {
            let (name, value) = Self::parse_header(raw)?;
            headers.append(name, value);
        }

        if let Some(spec) = default_spec {
            Self::merge_default_headers(&mut headers, spec)?;
        }
        Ok(headers)
    }

    /// Adds `name: value|name: value` defaults for names not already present.
    /// Applying the same defaults twice leaves the header set unchanged.
    pub fn merge_default_headers(headers: &mut HeaderMap, spec: &str) -> Result<(), AssembleError> {
        let mut defaults = HeaderMap::new();
        for entry in spec.split('|').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) = Self::parse_header(entry)?;
            defaults.append(name, value);
        }

        for name in defaults.keys() {
            if headers.contains_key(name) {
                continue;
            }
            for value in defaults.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Loads the body from exactly one source. Without an explicit source, a
    /// non-interactive `stdin` is read.
    pub fn build_body<R: Read>(
        options: &DataOptions,
        mut stdin: R,
        stdin_is_terminal: bool,
    ) -> Result<RequestBody, AssembleError> {
        let sources = [options.inline.is_some(), options.file.is_some(), options.stdin]
            .into_iter()
            .filter(|given| *given)
            .count();
        if sources > 1 {
            return Err(AssembleError::ConflictingBodySource);
        }

        if let Some(inline) = &options.inline {
            return Ok(RequestBody::new(inline.clone().into_bytes(), MimeHint::Unknown));
        }
        if let Some(file) = &options.file {
            return Self::read_file_or_literal(file);
        }
        if options.stdin || !stdin_is_terminal {
            let mut buf = Vec::new();
            stdin
                .read_to_end(&mut buf)
                .map_err(|source| AssembleError::Io {
                    source_name: "stdin".to_string(),
                    source,
                })?;
            return Ok(RequestBody::new(buf, MimeHint::Unknown));
        }
        Ok(RequestBody::empty())
    }

    fn read_file_or_literal(raw: &str) -> Result<RequestBody, AssembleError> {
        let path = Path::new(raw);
        match std::fs::read(path) {
            Ok(bytes) => Ok(RequestBody::new(bytes, MimeHint::from_path(path))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = raw, "body file not found, sending the argument as literal data");
                Ok(RequestBody::new(raw.to_string().into_bytes(), MimeHint::Unknown))
            }
            Err(source) => Err(AssembleError::Io {
                source_name: raw.to_string(),
                source,
            }),
        }
    }

    /// Sets `Content-Type` and `Content-Length` when absent, for methods that
    /// carry a body
    pub fn apply_content_headers(method: Method, headers: &mut HeaderMap, body: &RequestBody) {
        if !method.carries_body() {
            return;
        }

        if !body.is_empty() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(Self::content_type_for(body)));
        }
        if !headers.contains_key(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.bytes.len()));
        }
    }

    fn content_type_for(body: &RequestBody) -> &'static str {
        if let Some(content_type) = body.mime_hint.content_type() {
            return content_type;
        }
        if serde_json::from_slice::<Value>(&body.bytes).is_ok() {
            "application/json"
        } else if std::str::from_utf8(&body.bytes).is_ok() {
            "text/plain; charset=utf-8"
        } else {
            "application/octet-stream"
        }
    }
}
