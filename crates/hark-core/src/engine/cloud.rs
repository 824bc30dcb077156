//! Cloud recognition backend.
//!
//! Submits WAV-encoded audio plus the configured language tag to an
//! OpenAI-compatible transcription endpoint:
//! - Multipart form upload with `model`, `language`, and `file` fields
//! - Authorization via `Bearer` token
//! - JSON response with a `text` field
//!
//! A transport or service fault is an [`Error::Service`] and is never
//! retried here; a successful response with an empty transcript is the
//! service saying "no speech understood" and maps to `Ok(None)`.

use serde::Deserialize;
use tracing::info;

use super::{EngineKind, RecognitionEngine};
use crate::audio::AudioBuffer;
use crate::config::CloudSettings;
use crate::error::{Error, Result};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "HARK_CLOUD_API_KEY";

/// Timeout for one recognition round-trip.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Model name sent with each request.
const SERVICE_MODEL: &str = "whisper-1";

/// Cloud recognition engine.
pub struct CloudApiEngine {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    language: String,
}

impl CloudApiEngine {
    /// Validate endpoint and credentials and build the HTTP client.
    ///
    /// No network traffic happens here; the first round-trip is in
    /// [`RecognitionEngine::recognize`].
    pub fn new(settings: &CloudSettings, language: String) -> Result<Self> {
        let endpoint = validate_endpoint(&settings.endpoint)?;

        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| {
                Error::Configuration(format!("no cloud API key configured; set {API_KEY_ENV}"))
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Service(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            language,
        })
    }
}

impl RecognitionEngine for CloudApiEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::CloudApi
    }

    fn recognize(&mut self, buffer: &AudioBuffer) -> Result<Option<String>> {
        info!(
            seconds = buffer.duration_secs(),
            language = %self.language,
            "submitting audio to the recognition service"
        );

        let wav = buffer.wav_bytes()?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("model", SERVICE_MODEL)
            .text("language", self.language.clone())
            .part(
                "file",
                reqwest::blocking::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Service(format!("failed to build upload: {e}")))?,
            );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .map_err(|e| Error::Service(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Service(format!("service returned {status}: {body}")));
        }

        let body = response
            .text()
            .map_err(|e| Error::Service(format!("failed to read response: {e}")))?;
        parse_transcript(&body)
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Parse the service response, mapping an empty transcript to `Ok(None)`.
fn parse_transcript(body: &str) -> Result<Option<String>> {
    let parsed: TranscriptionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Service(format!("unexpected service response: {e}")))?;

    let text = parsed.text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

/// Normalize and validate the endpoint URL.
fn validate_endpoint(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(Error::Configuration(
            "no cloud recognition endpoint configured".into(),
        ));
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(Error::Configuration(format!(
            "cloud endpoint must start with http:// or https://, got: {trimmed}"
        )));
    }

    let after_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or("");
    if after_scheme.is_empty() || after_scheme.starts_with('/') {
        return Err(Error::Configuration(format!(
            "cloud endpoint is missing a host: {trimmed}"
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_text_is_trimmed() {
        let result = parse_transcript(r#"{"text": "  hello world \n"}"#).unwrap();
        assert_eq!(result.as_deref(), Some("hello world"));
    }

    #[test]
    fn empty_transcript_is_the_no_speech_outcome() {
        assert_eq!(parse_transcript(r#"{"text": ""}"#).unwrap(), None);
        assert_eq!(parse_transcript(r#"{"text": "   "}"#).unwrap(), None);
    }

    #[test]
    fn malformed_response_is_a_service_error() {
        let result = parse_transcript("not json");
        assert!(matches!(result, Err(Error::Service(_))));

        let result = parse_transcript(r#"{"transcript": "wrong field"}"#);
        assert!(matches!(result, Err(Error::Service(_))));
    }

    #[test]
    fn endpoint_validation_rejects_bad_urls() {
        assert!(matches!(
            validate_endpoint(""),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            validate_endpoint("ftp://somewhere"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            validate_endpoint("https:///no-host"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn endpoint_validation_strips_trailing_slash() {
        let normalized = validate_endpoint("https://api.example.com/v1/transcribe/").unwrap();
        assert_eq!(normalized, "https://api.example.com/v1/transcribe");
    }

    #[test]
    fn construction_with_a_configured_key_succeeds() {
        let settings = CloudSettings {
            api_key: Some("test-key".to_string()),
            ..CloudSettings::default()
        };
        let engine = CloudApiEngine::new(&settings, "en-US".to_string()).unwrap();
        assert_eq!(engine.kind(), EngineKind::CloudApi);
    }
}
