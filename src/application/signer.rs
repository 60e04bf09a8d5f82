use crate::domain::entities::Request;
use crate::domain::errors::SignError;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningParams, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use std::time::SystemTime;

pub const DEFAULT_AWS_SERVICE: &str = "execute-api";

/// Static AWS credentials
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    /// Reads the standard `AWS_*` variables, `None` if the key pair is incomplete
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Some(Self {
            access_key_id: non_empty("AWS_ACCESS_KEY_ID")?,
            secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY")?,
            session_token: non_empty("AWS_SESSION_TOKEN"),
        })
    }
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AwsSigV4Signer {
    region: String,
    service: String,
    credentials: Option<AwsCredentials>,
}

impl AwsSigV4Signer {
    pub fn new(
        region: impl Into<String>,
        service: impl Into<String>,
        credentials: Option<AwsCredentials>,
    ) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
            credentials,
        }
    }

    /// Credentials are looked up now but only required when signing
    pub fn from_env(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self::new(region, service, AwsCredentials::from_env())
    }

    fn sign(&self, request: &mut Request) -> Result<(), SignError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(SignError::MissingCredentials)?;

        let identity: Identity = Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            "shoot-environment",
        )
        .into();

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| SignError::Signing(e.to_string()))?
            .into();

        let uri = request.url.to_string();
        let headers = request
            .headers
            .iter()
            .map(|(name, value)| {
                value
                    .to_str()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
                    .map_err(|_| SignError::NonUtf8Header(name.as_str().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signable = SignableRequest::new(
            request.method.as_str(),
            uri.as_str(),
            headers.iter().map(|(n, v)| (n.as_str(), v.as_str())),
            SignableBody::Bytes(&request.body),
        )
        .map_err(|e| SignError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| SignError::Signing(e.to_string()))?
            .into_parts();

        let mut signed = http::Request::builder()
            .method(request.method.as_str())
            .uri(uri.as_str())
            .body(())
            .map_err(|e| SignError::Signing(e.to_string()))?;
        *signed.headers_mut() = request.headers.clone();
        instructions.apply_to_request_http1x(&mut signed);

        request.headers = signed.headers().clone();
        tracing::debug!(region = %self.region, service = %self.service, "request signed with SigV4");
        Ok(())
    }
}

/// How an outgoing request is authenticated
#[derive(Debug, Clone, Default)]
pub enum Signer {
    #[default]
    Noop,
    AwsSigV4(AwsSigV4Signer),
}

impl Signer {
    pub fn select(aws_sigv4: bool, region: &str, service: &str) -> Self {
        if aws_sigv4 {
            Signer::AwsSigV4(AwsSigV4Signer::from_env(region, service))
        } else {
            Signer::Noop
        }
    }

    /// Adds authentication headers to an already built request
    pub fn sign(&self, request: &mut Request) -> Result<(), SignError> {
        match self {
            Signer::Noop => Ok(()),
            Signer::AwsSigV4(signer) => signer.sign(request),
        }
    }
}
