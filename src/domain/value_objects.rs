use crate::domain::errors::ResolveError;
use hyper::body::Bytes;
use hyper::http::Uri;
use std::fmt;
use std::path::Path;

/// Represents a validated, absolute http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedUrl {
    scheme: String,
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
}

impl ParsedUrl {
    /// Parses an absolute URL string
    ///
    /// # Arguments
    /// * `input` - A URL that already carries an explicit scheme
    ///
    /// # Returns
    /// * `Ok(ParsedUrl)` - Validated URL with the effective port filled in
    /// * `Err(ResolveError)` - If the host is missing, the scheme is not
    ///   http/https or the string is not a valid URI
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| ResolveError::InvalidUrlFormat(input.to_string()))?;

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        if authority.is_empty() {
            return Err(ResolveError::MissingHost(input.to_string()));
        }

        let scheme = scheme.to_ascii_lowercase();
        let default_port = default_port(&scheme)
            .ok_or_else(|| ResolveError::InvalidScheme(scheme.clone()))?;
        let port = match explicit_port(authority) {
            None => default_port,
            Some(text) => match text.parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(ResolveError::InvalidUrlFormat(input.to_string())),
            },
        };

        let uri = format!("{scheme}://{rest}")
            .parse::<Uri>()
            .map_err(|_| ResolveError::InvalidUrlFormat(input.to_string()))?;

        let host = match uri.host() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(ResolveError::MissingHost(input.to_string())),
        };

        let path = match uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        Ok(ParsedUrl {
            port,
            query: uri.query().map(str::to_string),
            scheme,
            host,
            path,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    /// Host without IPv6 brackets, suitable for DNS lookup and TLS SNI
    pub fn bare_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Value for the `Host` header: the port is only included when it is not
    /// the scheme's default
    pub fn authority(&self) -> String {
        if Some(self.port) == default_port(&self.scheme) {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Origin-form request target (`/path?query`)
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority(), self.request_target())
    }
}

/// The text after the last `:` of `host:port`, ignoring userinfo and IPv6
/// brackets. An empty port (`host:`) counts as absent.
fn explicit_port(authority: &str) -> Option<&str> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let port = match host_port.rfind(']') {
        Some(end) => host_port[end + 1..].strip_prefix(':'),
        None => host_port.rsplit_once(':').map(|(_, port)| port),
    };
    port.filter(|p| !p.is_empty())
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Best-effort content type guess derived from a body file's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MimeHint {
    Html,
    Csv,
    Json,
    Xml,
    #[default]
    Unknown,
}

impl MimeHint {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("html") => MimeHint::Html,
            Some("csv") => MimeHint::Csv,
            Some("json") => MimeHint::Json,
            Some("xml") => MimeHint::Xml,
            _ => MimeHint::Unknown,
        }
    }

    pub fn content_type(self) -> Option<&'static str> {
        match self {
            MimeHint::Html => Some("text/html; charset=utf-8"),
            MimeHint::Csv => Some("text/csv; charset=utf-8"),
            MimeHint::Json => Some("application/json"),
            MimeHint::Xml => Some("application/xml"),
            MimeHint::Unknown => None,
        }
    }
}

/// Request payload together with its MIME hint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBody {
    pub bytes: Bytes,
    pub mime_hint: MimeHint,
}

impl RequestBody {
    pub fn new(bytes: impl Into<Bytes>, mime_hint: MimeHint) -> Self {
        Self {
            bytes: bytes.into(),
            mime_hint,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_default_port_and_root_path() {
        let url = ParsedUrl::parse("https://Example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.port(), 443);
        assert_eq!(url.path(), "/");
        assert_eq!(url.to_string(), "https://example.com/");
    }

    #[test]
    fn display_keeps_non_default_port_and_query() {
        let url = ParsedUrl::parse("http://localhost:8080/items?page=2").unwrap();
        assert_eq!(url.authority(), "localhost:8080");
        assert_eq!(url.query(), Some("page=2"));
        assert_eq!(url.request_target(), "/items?page=2");
        assert_eq!(url.to_string(), "http://localhost:8080/items?page=2");
    }

    #[test]
    fn explicit_default_port_is_omitted() {
        let url = ParsedUrl::parse("http://example.com:80/a").unwrap();
        assert_eq!(url.to_string(), "http://example.com/a");
    }

    #[test]
    fn rejects_ports_outside_the_valid_range() {
        for input in [
            "http://example.com:70000/x",
            "http://localhost:65536/a",
            "https://example.com:0/",
            "http://[::1]:99999/",
        ] {
            assert!(
                matches!(ParsedUrl::parse(input), Err(ResolveError::InvalidUrlFormat(_))),
                "{input} should be rejected"
            );
        }

        let url = ParsedUrl::parse("http://[::1]:8080/").unwrap();
        assert_eq!(url.port(), 8080);
        assert_eq!(url.bare_host(), "::1");
        assert_eq!(ParsedUrl::parse("http://example.com:65535/").unwrap().port(), 65535);
    }

    #[test]
    fn rejects_missing_host_and_foreign_scheme() {
        assert!(matches!(
            ParsedUrl::parse("http:///path"),
            Err(ResolveError::MissingHost(_))
        ));
        assert!(matches!(
            ParsedUrl::parse("ftp://example.com"),
            Err(ResolveError::InvalidScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[test]
    fn mime_hint_follows_extension() {
        assert_eq!(MimeHint::from_path(Path::new("a/b.JSON")), MimeHint::Json);
        assert_eq!(MimeHint::from_path(Path::new("page.html")), MimeHint::Html);
        assert_eq!(MimeHint::from_path(Path::new("rows.csv")), MimeHint::Csv);
        assert_eq!(MimeHint::from_path(Path::new("doc.xml")), MimeHint::Xml);
        assert_eq!(MimeHint::from_path(Path::new("notes.txt")), MimeHint::Unknown);
        assert_eq!(MimeHint::from_path(Path::new("Makefile")), MimeHint::Unknown);
    }
}
