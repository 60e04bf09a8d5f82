use crate::domain::entities::{Method, Request};
use crate::domain::settings::ClientSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable record of one outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(with = "base64_bytes", default)]
    pub body: Vec<u8>,
    #[serde(default)]
    pub settings: ClientSettings,
}

impl HistoryEntry {
    /// Snapshots a request. Header values that are not valid UTF-8 are stored lossily.
    pub fn from_request(request: &Request, settings: &ClientSettings) -> Self {
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in request.headers.iter() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        Self {
            timestamp: Utc::now(),
            method: request.method,
            url: request.url.to_string(),
            headers,
            body: request.body.to_vec(),
            settings: settings.clone(),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ParsedUrl;
    use hyper::body::Bytes;
    use hyper::header::{HeaderMap, HeaderValue, ACCEPT};

    fn request() -> Request {
        let mut headers = HeaderMap::new();
        headers.append(ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(ACCEPT, HeaderValue::from_static("application/json"));
        Request {
            method: Method::Post,
            url: ParsedUrl::parse("http://localhost:3000/users").unwrap(),
            headers,
            body: Bytes::from_static(b"{\"name\":\"ada\"}"),
        }
    }

    #[test]
    fn serialized_entry_has_expected_shape() {
        let entry = HistoryEntry::from_request(&request(), &ClientSettings::default());
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["method"], "POST");
        assert_eq!(json["url"], "http://localhost:3000/users");
        assert_eq!(
            json["headers"]["accept"],
            serde_json::json!(["text/html", "application/json"])
        );
        assert_eq!(json["body"], "eyJuYW1lIjoiYWRhIn0=");
        assert!(
            DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok(),
            "timestamp should be RFC3339"
        );
    }

    #[test]
    fn entry_survives_a_json_line() {
        let entry = HistoryEntry::from_request(&request(), &ClientSettings::default());
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains('\n'));
        let back: HistoryEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back, entry);
    }
}
