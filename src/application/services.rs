use crate::application::builders::assembler::{DataOptions, RequestAssembler};
use crate::application::builders::request_builder::RequestBuilder;
use crate::application::renderer::Renderer;
use crate::application::resolver::UrlResolver;
use crate::application::signer::Signer;
use crate::domain::alias::AliasTable;
use crate::domain::entities::{Method, Request, Response};
use crate::domain::errors::{AliasError, ClientError, HistoryError};
use crate::domain::settings::ClientSettings;
use anyhow::Result;
use async_trait::async_trait;
use hyper::StatusCode;
use std::io::{Read, Write};
use std::str::FromStr;
use tokio::task::JoinHandle;

/// Trait for HTTP clients to enable mocking and dependency inversion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    fn settings(&self) -> &ClientSettings;

    async fn send(&self, request: Request) -> Result<Response, ClientError>;
}

/// Source of the alias table, read at most once per invocation
pub trait AliasSource: Send + Sync {
    fn load(&self) -> Result<AliasTable, AliasError>;
}

/// Durable request log fed from a background task
pub trait HistorySink: Send + 'static {
    fn record(&mut self, request: &Request, settings: &ClientSettings) -> Result<(), HistoryError>;
}

/// What the user asked for, before any validation
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub method: String,
    pub url: String,
    pub headers: Vec<String>,
    pub default_headers: Option<String>,
    pub data: DataOptions,
}

/// Result of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    /// Fail-on-status triggered; output has already been written
    pub failed: bool,
    pub history_recorded: bool,
}

/// Application service for orchestrating HTTP request workflows
pub struct HttpRequestService {
    http_client: Box<dyn HttpClient>,
    signer: Signer,
    renderer: Renderer,
    aliases: Option<Box<dyn AliasSource>>,
    history: Option<Box<dyn HistorySink>>,
}

impl HttpRequestService {
    pub fn new(http_client: Box<dyn HttpClient>) -> Self {
        Self {
            http_client,
            signer: Signer::Noop,
            renderer: Renderer::default(),
            aliases: None,
            history: None,
        }
    }

    pub fn with_signer(self, signer: Signer) -> Self {
        Self { signer, ..self }
    }

    pub fn with_renderer(self, renderer: Renderer) -> Self {
        Self { renderer, ..self }
    }

    pub fn with_aliases(self, aliases: Box<dyn AliasSource>) -> Self {
        Self {
            aliases: Some(aliases),
            ..self
        }
    }

    pub fn with_history(self, history: Box<dyn HistorySink>) -> Self {
        Self {
            history: Some(history),
            ..self
        }
    }

    /// Validates the invocation and builds the request, reading the body from
    /// the process's standard input when needed
    pub fn prepare(&self, invocation: &Invocation) -> Result<Request> {
        let stdin = std::io::stdin();
        let is_terminal = std::io::IsTerminal::is_terminal(&stdin);
        self.prepare_with_stdin(invocation, stdin.lock(), is_terminal)
    }

    pub fn prepare_with_stdin<R: Read>(
        &self,
        invocation: &Invocation,
        stdin: R,
        stdin_is_terminal: bool,
    ) -> Result<Request> {
        let method = Method::from_str(&invocation.method)?;

        let aliases = self.load_aliases_for(&invocation.url)?;
        let url = UrlResolver::resolve(&invocation.url, aliases.as_ref())?;

        let mut headers = RequestAssembler::build_headers(
            &invocation.headers,
            invocation.default_headers.as_deref(),
        )?;
        let body = RequestAssembler::build_body(&invocation.data, stdin, stdin_is_terminal)?;
        RequestAssembler::apply_content_headers(method, &mut headers, &body);

        let mut request = RequestBuilder::new()
            .method(method.as_str())?
            .url(url)
            .headers(headers)
            .body(&body)
            .build()?;

        self.signer.sign(&mut request)?;
        Ok(request)
    }

    fn load_aliases_for(&self, raw_url: &str) -> Result<Option<AliasTable>> {
        if !UrlResolver::has_placeholders(raw_url) {
            return Ok(None);
        }
        match &self.aliases {
            Some(source) => Ok(Some(source.load()?)),
            None => Ok(None),
        }
    }

    /// Sends a prepared request. History is recorded on a blocking task while
    /// the request is in flight and is awaited before returning.
    pub async fn send_request<W: Write>(&mut self, request: Request, out: &mut W) -> Result<Outcome> {
        let history_task = self.spawn_history(&request);

        let result = self.send_and_render(request, out).await;
        let history_recorded = Self::join_history(history_task).await;

        let (status, failed) = result?;
        Ok(Outcome {
            status,
            failed,
            history_recorded,
        })
    }

    async fn send_and_render<W: Write>(&self, request: Request, out: &mut W) -> Result<(StatusCode, bool)> {
        let response = self.http_client.send(request).await?;
        tracing::info!(
            status = %response.status,
            elapsed_ms = response.elapsed.as_millis() as u64,
            "response received"
        );

        let rendered = self.renderer.render(&response);
        out.write_all(&rendered.bytes)?;
        out.flush()?;
        Ok((response.status, rendered.failed))
    }

    fn spawn_history(&mut self, request: &Request) -> Option<JoinHandle<Result<(), HistoryError>>> {
        let mut sink = self.history.take()?;
        let request = request.clone();
        let settings = self.http_client.settings().clone();
        Some(tokio::task::spawn_blocking(move || {
            sink.record(&request, &settings)
        }))
    }

    async fn join_history(task: Option<JoinHandle<Result<(), HistoryError>>>) -> bool {
        let Some(task) = task else {
            return false;
        };
        match task.await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "failed to record request history");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "history task did not complete");
                false
            }
        }
    }
}
