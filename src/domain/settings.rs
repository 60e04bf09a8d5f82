use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.0")]
    Tls10,
    #[serde(rename = "1.1")]
    Tls11,
    #[serde(rename = "1.2")]
    Tls12,
    #[serde(rename = "1.3")]
    Tls13,
}

impl FromStr for TlsVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches("tls") {
            "1.0" | "1" | "10" => Ok(TlsVersion::Tls10),
            "1.1" | "11" => Ok(TlsVersion::Tls11),
            "1.2" | "12" => Ok(TlsVersion::Tls12),
            "1.3" | "13" => Ok(TlsVersion::Tls13),
            other => Err(format!("unknown TLS version '{other}', expected 1.0, 1.1, 1.2 or 1.3")),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self {
            TlsVersion::Tls10 => "1.0",
            TlsVersion::Tls11 => "1.1",
            TlsVersion::Tls12 => "1.2",
            TlsVersion::Tls13 => "1.3",
        };
        write!(f, "TLS {v}")
    }
}

/// PEM encoded client certificate and PKCS#8 private key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCert {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsOptions {
    pub min_version: Option<TlsVersion>,
    pub max_version: Option<TlsVersion>,
    pub client_cert: Option<ClientCert>,
    pub insecure_skip_verify: bool,
}

/// Transport settings for one run, built with the `with_*` mutators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(with = "millis")]
    pub timeout: Option<Duration>,
    pub tls: TlsOptions,
    pub follow_redirects: bool,
}

impl ClientSettings {
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_cert(self, client_cert: Option<ClientCert>) -> Self {
        Self {
            tls: TlsOptions {
                client_cert,
                ..self.tls
            },
            ..self
        }
    }

    pub fn with_min_tls(self, min_version: Option<TlsVersion>) -> Self {
        Self {
            tls: TlsOptions {
                min_version,
                ..self.tls
            },
            ..self
        }
    }

    pub fn with_max_tls(self, max_version: Option<TlsVersion>) -> Self {
        Self {
            tls: TlsOptions {
                max_version,
                ..self.tls
            },
            ..self
        }
    }

    pub fn with_insecure(self, insecure_skip_verify: bool) -> Self {
        Self {
            tls: TlsOptions {
                insecure_skip_verify,
                ..self.tls
            },
            ..self
        }
    }

    pub fn with_follow_redirects(self, follow_redirects: bool) -> Self {
        Self {
            follow_redirects,
            ..self
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
