use thiserror::Error;

/// Failures while turning a URL expression into a [`ParsedUrl`](super::value_objects::ParsedUrl)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("URL cannot be empty")]
    EmptyInput,

    #[error("unknown alias '{0}'")]
    UnknownAlias(String),

    #[error("URL contains alias placeholders but no aliases are available")]
    NoAliasesProvided,

    #[error("invalid URL format: '{0}'")]
    InvalidUrlFormat(String),

    #[error("URL has no host: '{0}'")]
    MissingHost(String),

    #[error("unsupported URL scheme '{0}', expected http or https")]
    InvalidScheme(String),
}

#[derive(Debug, Error)]
pub enum AliasError {
    #[error(
        "invalid alias name '{0}': must start with a letter or underscore and contain at most 20 word characters"
    )]
    InvalidAliasName(String),

    #[error("unknown alias '{0}'")]
    UnknownAlias(String),

    #[error("alias '{name}' does not point to a valid URL: {source}")]
    InvalidTarget {
        name: String,
        #[source]
        source: ResolveError,
    },

    #[error("alias file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("alias file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("invalid header format: '{0}'. Use 'Key: Value'")]
    InvalidHeaderFormat(String),

    #[error("only one body source may be given (inline data, file or stdin)")]
    ConflictingBodySource,

    #[error("failed to read request body from {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unsupported HTTP method: '{0}'")]
    UnsupportedMethod(String),

    #[error("failed to build HTTP request: {0}")]
    Build(String),

    #[error("DNS resolution failed for {host}: {source}")]
    Dns {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP request execution failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("invalid redirect location '{0}'")]
    InvalidRedirect(String),
}

#[derive(Debug, Error)]
pub enum SignError {
    #[error("AWS credentials not found: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")]
    MissingCredentials,

    #[error("header '{0}' is not valid UTF-8 and cannot be signed")]
    NonUtf8Header(String),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history index {index} is out of range ({len} entries)")]
    InvalidHistoryIndex { index: usize, len: usize },

    #[error("no history recorded yet")]
    NoHistory,

    #[error("history storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid format specifier '{0}', expected one of: status, statuscode, headers, body")]
    InvalidFormatSpecifier(String),
}
