use crate::application::builders::assembler::DataOptions;
use crate::application::renderer::{Formatter, Renderer};
use crate::application::services::{HttpRequestService, Invocation};
use crate::application::signer::{DEFAULT_AWS_SERVICE, Signer};
use crate::domain::errors::{
    AliasError, AssembleError, ClientError, FormatError, HistoryError, ResolveError,
};
use crate::domain::settings::{ClientCert, ClientSettings, TlsVersion};
use crate::infrastructure::alias_store::FileAliasStore;
use crate::infrastructure::config::Config;
use crate::infrastructure::history::HistoryRecorder;
use crate::infrastructure::http_client::HyperHttpClient;
use crate::infrastructure::output;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// CLI configuration for shoot
#[derive(Parser, Debug)]
#[command(name = "shoot", version)]
#[command(about = "shoot: send one HTTP request, see what comes back", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// URL, shorthand (`:3000/users`, `example.com`) or alias expression (`{api}/users`)
    #[arg(required = true)]
    pub url: Option<String>,

    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Request header as `Name: Value`, repeatable
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Inline request body
    #[arg(short = 'd', long = "data")]
    pub body: Option<String>,

    /// Read the body from a file (sent as literal text if the file does not exist)
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Read the body from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Response parts to print: status, statuscode, headers, body
    #[arg(short = 'p', long = "print", default_value = "body")]
    pub print: String,

    /// Print the response as a JSON document
    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 when the response status is 400 or above
    #[arg(long)]
    pub fail: bool,

    /// Write the rendered response to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(short, long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Follow redirects
    #[arg(short = 'L', long)]
    pub follow: bool,

    /// Skip TLS certificate and hostname verification
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// PEM client certificate
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,

    /// PEM (PKCS#8) private key for --cert
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,

    #[arg(long, value_name = "VERSION")]
    pub tls_min: Option<TlsVersion>,

    #[arg(long, value_name = "VERSION")]
    pub tls_max: Option<TlsVersion>,

    /// Sign the request with AWS Signature V4
    #[arg(long)]
    pub aws_sigv4: bool,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    #[arg(long, default_value = DEFAULT_AWS_SERVICE)]
    pub aws_service: String,

    /// Do not record this request in the history log
    #[arg(long)]
    pub no_history: bool,

    /// More logging on stderr (-v timings, -vv headers)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage URL aliases used as `{name}` in URLs
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Inspect or clear the request history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AliasAction {
    /// Add or replace an alias
    Set { name: String, url: String },
    /// Remove an alias
    Rm { name: String },
    /// List aliases
    Ls,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List recorded requests, oldest first
    Ls,
    /// Show one request (default: the latest)
    Show { index: Option<usize> },
    /// Delete all recorded requests
    Clear,
}

/// How a successful run should end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    StatusFailure,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(String);

impl Cli {
    pub async fn run(&self, config: &Config) -> Result<Exit> {
        match &self.command {
            Some(Command::Alias { action }) => self.run_alias(action, config),
            Some(Command::History { action }) => self.run_history(action, config),
            None => self.run_request(config).await,
        }
    }

    async fn run_request(&self, config: &Config) -> Result<Exit> {
        let formatter = if self.json { Formatter::Json } else { Formatter::Text };
        let renderer = Renderer::from_spec(formatter, &self.print, self.fail)?;
        let settings = self.client_settings()?;

        let mut service = HttpRequestService::new(Box::new(HyperHttpClient::new(settings)?))
            .with_signer(Signer::select(self.aws_sigv4, &self.aws_region, &self.aws_service))
            .with_renderer(renderer)
            .with_aliases(Box::new(FileAliasStore::new(config.alias_file())));
        if !self.no_history {
            service = service.with_history(Box::new(HistoryRecorder::new(config.history_file())));
        }

        let request = service.prepare(&self.invocation(config))?;
        let mut out = output::destination(self.output.as_deref());
        let outcome = service.send_request(request, &mut out).await?;

        if let Some(path) = &self.output {
            if self.verbose > 0 {
                output::print_notice(&format!("Saved response to {}", path.display()));
            }
        }

        Ok(if outcome.failed { Exit::StatusFailure } else { Exit::Success })
    }

    fn invocation(&self, config: &Config) -> Invocation {
        Invocation {
            method: self.method.clone(),
            url: self.url.clone().unwrap_or_default(),
            headers: self.headers.clone(),
            default_headers: config.default_headers.clone(),
            data: DataOptions {
                inline: self.body.clone(),
                file: self.file.clone(),
                stdin: self.stdin,
            },
        }
    }

    pub fn client_settings(&self) -> Result<ClientSettings> {
        let timeout = self
            .timeout
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| UsageError(format!("invalid timeout '{secs}': expected a positive number of seconds")))
            })
            .transpose()?;

        let cert = match (&self.cert, &self.key) {
            (Some(cert_path), Some(key_path)) => Some(ClientCert {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };

        Ok(ClientSettings::default()
            .with_timeout(timeout)
            .with_cert(cert)
            .with_min_tls(self.tls_min)
            .with_max_tls(self.tls_max)
            .with_insecure(self.insecure)
            .with_follow_redirects(self.follow))
    }

    fn run_alias(&self, action: &AliasAction, config: &Config) -> Result<Exit> {
        let store = FileAliasStore::new(config.alias_file());
        tracing::debug!(path = %store.path().display(), "loading aliases");
        let mut table = store.load()?;

        match action {
            AliasAction::Set { name, url } => {
                table.set(name, url)?;
                store.save(&table)?;
                output::print_notice(&format!("{name} -> {}", url.trim()));
            }
            AliasAction::Rm { name } => {
                table.remove(name)?;
                store.save(&table)?;
                output::print_notice(&format!("removed {name}"));
            }
            AliasAction::Ls => {
                let mut stdout = std::io::stdout().lock();
                output::write_aliases(&mut stdout, &table)?;
                stdout.flush()?;
            }
        }
        Ok(Exit::Success)
    }

    fn run_history(&self, action: &HistoryAction, config: &Config) -> Result<Exit> {
        let mut recorder = HistoryRecorder::new(config.history_file());
        let mut stdout = std::io::stdout().lock();

        match action {
            HistoryAction::Ls => output::write_history_summary(&mut stdout, recorder.get_all()?)?,
            HistoryAction::Show { index } => {
                let entry = match index {
                    Some(index) => recorder.get_by_index(*index)?,
                    None => recorder.latest()?,
                };
                output::write_history_entry(&mut stdout, entry)?;
            }
            HistoryAction::Clear => {
                recorder.clear()?;
                output::print_notice(&format!("cleared {}", recorder.path().display()));
            }
        }
        stdout.flush()?;
        Ok(Exit::Success)
    }
}

/// Errors caused by what the user typed; reported with a usage hint
pub fn is_usage_error(err: &anyhow::Error) -> bool {
    if err.downcast_ref::<UsageError>().is_some()
        || err.downcast_ref::<ResolveError>().is_some()
        || err.downcast_ref::<AssembleError>().is_some_and(|e| !matches!(e, AssembleError::Io { .. }))
        || err.downcast_ref::<FormatError>().is_some()
    {
        return true;
    }
    if let Some(ClientError::UnsupportedMethod(_)) = err.downcast_ref::<ClientError>() {
        return true;
    }
    if let Some(HistoryError::InvalidHistoryIndex { .. }) = err.downcast_ref::<HistoryError>() {
        return true;
    }
    matches!(
        err.downcast_ref::<AliasError>(),
        Some(AliasError::InvalidAliasName(_) | AliasError::UnknownAlias(_) | AliasError::InvalidTarget { .. })
    )
}
