//! Remote translation client.
//! Plain JSON POST against the translation endpoint with a bounded request
//! timeout, so a hung network call can never stall the degrade path.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::LanguagePair;

/// Opaque remote translation capability.
#[async_trait]
pub trait RemoteTranslator: Send + Sync {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, RemoteError>;
}

#[derive(Debug)]
pub enum RemoteError {
    Network(String),
    Timeout,
    Status(u16),
    /// 2xx response but no usable translation in the body.
    Empty,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Network(msg) => write!(f, "network error: {msg}"),
            RemoteError::Timeout => write!(f, "remote translation timeout"),
            RemoteError::Status(code) => write!(f, "unexpected status {code}"),
            RemoteError::Empty => write!(f, "empty translation received"),
        }
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// HTTP client for the translation service.
/// Request shape: `{"q": text, "source": code, "target": code}`; response
/// carries the result in `translatedText`.
pub struct HttpRemoteClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RemoteTranslator for HttpRemoteClient {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, RemoteError> {
        let body = serde_json::json!({
            "q": text,
            "source": pair.source,
            "target": pair.target,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::Timeout
                } else {
                    RemoteError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout
            } else {
                RemoteError::Network(e.to_string())
            }
        })?;

        let translated = extract_translation(parsed)?;
        debug!(pair = %pair, chars = translated.len(), "remote translation ok");
        Ok(translated)
    }
}

/// A 2xx body with a missing or blank `translatedText` counts as a failure.
fn extract_translation(response: TranslateResponse) -> Result<String, RemoteError> {
    match response.translated_text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(RemoteError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing() {
        let parsed: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "hello"}"#).unwrap();
        assert_eq!(extract_translation(parsed).unwrap(), "hello");
    }

    #[test]
    fn blank_or_missing_body_is_empty_error() {
        let blank: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "  "}"#).unwrap();
        assert!(matches!(extract_translation(blank), Err(RemoteError::Empty)));

        let missing: TranslateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            extract_translation(missing),
            Err(RemoteError::Empty)
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let client =
            HttpRemoteClient::new("http://127.0.0.1:9/translate", Duration::from_millis(300))
                .unwrap();
        let err = client
            .translate("hola", &LanguagePair::new("es", "en"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Network(_) | RemoteError::Timeout));
    }
}
