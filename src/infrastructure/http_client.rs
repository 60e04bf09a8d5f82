use crate::application::services::HttpClient;
use crate::domain::entities::{Method as DomainMethod, Request, Response};
use crate::domain::errors::ClientError;
use crate::domain::settings::{ClientSettings, TlsOptions, TlsVersion};
use crate::domain::value_objects::ParsedUrl;
use crate::infrastructure::tracer::Tracer;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{
    AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST, HeaderMap, HeaderValue, LOCATION,
    USER_AGENT,
};
use hyper::{Method, Request as HyperRequest, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use tokio_native_tls::TlsConnector;
use tokio_native_tls::native_tls::{self, Identity, Protocol};

const MAX_REDIRECTS: usize = 10;
const DEFAULT_USER_AGENT: &str = concat!("shoot/", env!("CARGO_PKG_VERSION"));

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// Infrastructure implementation of HttpClient using Hyper
///
/// Every request gets its own connection so that DNS, TCP and TLS timings
/// can be observed. Nothing is pooled or retried.
pub struct HyperHttpClient {
    settings: ClientSettings,
    tls: TlsConnector,
}

impl HyperHttpClient {
    /// Builds the client, loading any client certificate up front
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let tls = TlsAdapter::connector(&settings.tls)?;
        Ok(Self { settings, tls })
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let exchange = self.execute_with_redirects(request);
        match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => exchange.await,
        }
    }
}

impl HyperHttpClient {
    async fn execute_with_redirects(&self, mut request: Request) -> Result<Response, ClientError> {
        let started = Instant::now();
        let mut redirects = 0;

        loop {
            let mut tracer = Tracer::new();
            let hyper_request = RequestAdapter::to_hyper_request(&request)?;
            let hyper_response = self
                .execute_http_request(&request.url, hyper_request, &mut tracer)
                .await?;

            if self.settings.follow_redirects && hyper_response.status().is_redirection() {
                if let Some(location) = RedirectAdapter::location(hyper_response.headers()) {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        return Err(ClientError::TooManyRedirects(MAX_REDIRECTS));
                    }
                    tracing::info!(status = %hyper_response.status(), %location, "following redirect");
                    request = RedirectAdapter::next_request(request, hyper_response.status(), &location)?;
                    continue;
                }
            }

            return ResponseAdapter::to_domain_response(hyper_response, started, &tracer).await;
        }
    }

    async fn execute_http_request(
        &self,
        url: &ParsedUrl,
        request: HyperRequest<Full<Bytes>>,
        tracer: &mut Tracer,
    ) -> Result<hyper::Response<Incoming>, ClientError> {
        let stream = self.connect(url, tracer).await?;
        let (mut sender, connection) =
            hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::debug!(error = %err, "connection closed with error");
            }
        });

        HeaderAdapter::log_request(&request);
        Ok(sender.send_request(request).await?)
    }

    async fn connect(&self, url: &ParsedUrl, tracer: &mut Tracer) -> Result<Box<dyn Io>, ClientError> {
        let host = url.bare_host();

        tracer.dns_start();
        let addrs: Vec<SocketAddr> = lookup_host((host, url.port()))
            .await
            .map_err(|source| ClientError::Dns {
                host: host.to_string(),
                source,
            })?
            .collect();
        tracer.dns_done();

        tracer.connect_start();
        let tcp = Self::connect_any(host, &addrs).await?;
        tracer.connect_done();

        if !url.is_https() {
            return Ok(Box::new(tcp));
        }

        tracer.tls_start();
        let tls = self
            .tls
            .connect(host, tcp)
            .await
            .map_err(|e| ClientError::Tls(e.to_string()))?;
        tracer.tls_done();
        Ok(Box::new(tls))
    }

    async fn connect_any(host: &str, addrs: &[SocketAddr]) -> Result<TcpStream, ClientError> {
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(source) => {
                    tracing::debug!(%addr, error = %source, "connect attempt failed");
                    last_error = Some(ClientError::Connect {
                        addr: addr.to_string(),
                        source,
                    });
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClientError::Dns {
            host: host.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        }))
    }
}

/// Adapter for converting domain requests to Hyper requests
struct RequestAdapter;

impl RequestAdapter {
    fn to_hyper_request(domain_request: &Request) -> Result<HyperRequest<Full<Bytes>>, ClientError> {
        let method = MethodAdapter::to_hyper_method(domain_request.method);
        let body = Full::new(domain_request.body.clone());

        let mut hyper_request = HyperRequest::builder()
            .method(method)
            .uri(domain_request.url.request_target())
            .body(body)
            .map_err(|e| ClientError::Build(e.to_string()))?;

        *hyper_request.headers_mut() = domain_request.headers.clone();
        HeaderAdapter::add_defaults(hyper_request.headers_mut(), &domain_request.url)?;
        Ok(hyper_request)
    }
}

/// Adapter for converting domain responses from Hyper responses
struct ResponseAdapter;

impl ResponseAdapter {
    async fn to_domain_response(
        hyper_response: hyper::Response<Incoming>,
        started: Instant,
        tracer: &Tracer,
    ) -> Result<Response, ClientError> {
        let (parts, body) = hyper_response.into_parts();
        HeaderAdapter::log_response(parts.status, &parts.headers);

        let body = body.collect().await?.to_bytes();
        let elapsed = started.elapsed();

        Ok(Response {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
            elapsed,
            timings: tracer.report(elapsed),
        })
    }
}

/// Adapter for converting domain HTTP methods to Hyper methods
struct MethodAdapter;

impl MethodAdapter {
    fn to_hyper_method(domain_method: DomainMethod) -> Method {
        match domain_method {
            DomainMethod::Get => Method::GET,
            DomainMethod::Post => Method::POST,
            DomainMethod::Put => Method::PUT,
            DomainMethod::Delete => Method::DELETE,
            DomainMethod::Patch => Method::PATCH,
            DomainMethod::Head => Method::HEAD,
            DomainMethod::Options => Method::OPTIONS,
        }
    }
}

/// Adapter for handling HTTP headers
struct HeaderAdapter;

impl HeaderAdapter {
    fn add_defaults(headers: &mut HeaderMap, url: &ParsedUrl) -> Result<(), ClientError> {
        if !headers.contains_key(HOST) {
            let host = HeaderValue::from_str(&url.authority())
                .map_err(|e| ClientError::Build(format!("invalid host header: {e}")))?;
            headers.insert(HOST, host);
        }
        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }
        Ok(())
    }

    fn log_request(request: &HyperRequest<Full<Bytes>>) {
        tracing::debug!("> {} {} HTTP/1.1", request.method(), request.uri());
        for (name, value) in request.headers() {
            tracing::debug!("> {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
    }

    fn log_response(status: StatusCode, headers: &HeaderMap) {
        tracing::debug!("< {}", status);
        for (name, value) in headers {
            tracing::debug!("< {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
    }
}

/// Adapter for following `Location` headers
struct RedirectAdapter;

impl RedirectAdapter {
    fn location(headers: &HeaderMap) -> Option<String> {
        headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn next_request(mut request: Request, status: StatusCode, location: &str) -> Result<Request, ClientError> {
        let invalid = || ClientError::InvalidRedirect(location.to_string());

        let base = url::Url::parse(&request.url.to_string()).map_err(|_| invalid())?;
        let target = base.join(location).map_err(|_| invalid())?;
        let next_url = ParsedUrl::parse(target.as_str()).map_err(|_| invalid())?;

        let switch_to_get = status == StatusCode::SEE_OTHER
            || (matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND)
                && !matches!(request.method, DomainMethod::Get | DomainMethod::Head));
        if switch_to_get {
            if request.method != DomainMethod::Head {
                request.method = DomainMethod::Get;
            }
            request.body = Bytes::new();
            request.headers.remove(CONTENT_TYPE);
            request.headers.remove(CONTENT_LENGTH);
        }

        let same_origin = next_url.scheme() == request.url.scheme()
            && next_url.authority() == request.url.authority();
        if !same_origin {
            request.headers.remove(HOST);
            request.headers.remove(AUTHORIZATION);
            request.headers.remove(COOKIE);
        }

        request.url = next_url;
        Ok(request)
    }
}

/// Builds the TLS connector from [`TlsOptions`]
struct TlsAdapter;

impl TlsAdapter {
    fn connector(options: &TlsOptions) -> Result<TlsConnector, ClientError> {
        let mut builder = native_tls::TlsConnector::builder();

        if let Some(min) = options.min_version {
            let protocol = Self::to_protocol(min).ok_or_else(|| {
                ClientError::Tls(format!("{min} as a minimum version is not supported by the native TLS backend"))
            })?;
            builder.min_protocol_version(Some(protocol));
        }
        if let Some(max) = options.max_version {
            // no upper bound when the newest version is allowed
            builder.max_protocol_version(Self::to_protocol(max));
        }

        if options.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }

        if let Some(cert) = &options.client_cert {
            let read = |path: &std::path::Path| {
                std::fs::read(path).map_err(|e| {
                    ClientError::Tls(format!("failed to read {}: {e}", path.display()))
                })
            };
            let identity = Identity::from_pkcs8(&read(&cert.cert_path)?, &read(&cert.key_path)?)
                .map_err(|e| ClientError::Tls(format!("invalid client certificate: {e}")))?;
            builder.identity(identity);
        }

        let connector = builder.build().map_err(|e| ClientError::Tls(e.to_string()))?;
        Ok(TlsConnector::from(connector))
    }

    fn to_protocol(version: TlsVersion) -> Option<Protocol> {
        match version {
            TlsVersion::Tls10 => Some(Protocol::Tlsv10),
            TlsVersion::Tls11 => Some(Protocol::Tlsv11),
            TlsVersion::Tls12 => Some(Protocol::Tlsv12),
            TlsVersion::Tls13 => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::ClientCert;

    fn request(method: DomainMethod, url: &str) -> Request {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        Request {
            method,
            url: ParsedUrl::parse(url).unwrap(),
            headers,
            body: Bytes::from_static(b"{}"),
        }
    }

    #[test]
    fn hyper_request_uses_origin_form_and_host_header() {
        let req = request(DomainMethod::Post, "http://localhost:8080/items?x=1");
        let hyper_req = RequestAdapter::to_hyper_request(&req).unwrap();

        assert_eq!(hyper_req.method(), &Method::POST);
        assert_eq!(hyper_req.uri().to_string(), "/items?x=1");
        assert_eq!(hyper_req.headers()[HOST], "localhost:8080");
        assert_eq!(hyper_req.headers()[USER_AGENT], DEFAULT_USER_AGENT);
        assert_eq!(hyper_req.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn see_other_switches_to_get_and_drops_body() {
        let req = request(DomainMethod::Post, "http://localhost:8080/items");
        let next = RedirectAdapter::next_request(req, StatusCode::SEE_OTHER, "/items/7").unwrap();

        assert_eq!(next.method, DomainMethod::Get);
        assert!(next.body.is_empty());
        assert!(!next.headers.contains_key(CONTENT_TYPE));
        assert_eq!(next.url.to_string(), "http://localhost:8080/items/7");
        assert!(next.headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn temporary_redirect_keeps_method_and_body() {
        let req = request(DomainMethod::Put, "http://localhost:8080/a");
        let next = RedirectAdapter::next_request(req, StatusCode::TEMPORARY_REDIRECT, "b").unwrap();
        assert_eq!(next.method, DomainMethod::Put);
        assert_eq!(&next.body[..], b"{}");
        assert_eq!(next.url.to_string(), "http://localhost:8080/b");
    }

    #[test]
    fn cross_origin_redirect_drops_credentials() {
        let req = request(DomainMethod::Get, "http://localhost:8080/a");
        let next =
            RedirectAdapter::next_request(req, StatusCode::FOUND, "https://other.example.com/z").unwrap();
        assert!(!next.headers.contains_key(AUTHORIZATION));
        assert_eq!(next.url.to_string(), "https://other.example.com/z");
    }

    #[test]
    fn unsupported_min_tls_is_rejected() {
        let options = TlsOptions {
            min_version: Some(TlsVersion::Tls13),
            ..Default::default()
        };
        assert!(matches!(TlsAdapter::connector(&options), Err(ClientError::Tls(_))));
    }

    #[test]
    fn missing_client_certificate_fails_at_construction() {
        let settings = ClientSettings::default().with_cert(Some(ClientCert {
            cert_path: "/nonexistent/client.pem".into(),
            key_path: "/nonexistent/client.key".into(),
        }));
        assert!(matches!(HyperHttpClient::new(settings), Err(ClientError::Tls(_))));
    }
}
