//! Speech Transcription Adapter — Deepgram STT.
//!
//! Unlike synthesis, transcription failures surface to the caller: the
//! candidate needs to know their answer was not captured so they can retry,
//! rather than silently submitting an empty answer.
//!
//! Model: nova-3, en-US, smart formatting on (hardcoded — do not make
//! configurable to prevent drift)

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEEPGRAM_API_URL: &str = "https://api.deepgram.com";
pub const MODEL: &str = "nova-3";

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transcription returned no alternatives")]
    EmptyResult,
}

/// A recognized utterance with the provider's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub transcript: String,
    pub confidence: f64,
}

/// The transcription boundary. Carried in `AppState` as
/// `Arc<dyn SpeechTranscriber>`.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Converts recorded audio to text. The audio arrives as raw bytes with
    /// whatever content type the browser recorded (webm, ogg, wav, mp3).
    async fn transcribe(
        &self,
        audio: Bytes,
        content_type: &str,
    ) -> Result<Transcription, TranscriptionError>;
}

// ── Deepgram response shape ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f64,
}

impl ListenResponse {
    /// Best transcription: first alternative of the first channel.
    fn into_transcription(self) -> Option<Transcription> {
        let alternative = self
            .results?
            .channels
            .into_iter()
            .next()?
            .alternatives
            .into_iter()
            .next()?;

        Some(Transcription {
            transcript: alternative.transcript,
            confidence: alternative.confidence,
        })
    }
}

/// The Deepgram-backed transcriber used in production.
pub struct DeepgramClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepgramClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEEPGRAM_API_URL.to_string()),
        }
    }
}

#[async_trait]
impl SpeechTranscriber for DeepgramClient {
    async fn transcribe(
        &self,
        audio: Bytes,
        content_type: &str,
    ) -> Result<Transcription, TranscriptionError> {
        let url = format!("{}/v1/listen", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("model", MODEL),
                ("language", "en-US"),
                ("smart_format", "true"),
                ("punctuate", "true"),
                ("diarize", "false"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("content-type", content_type)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let listen: ListenResponse = response.json().await?;
        let transcription = listen
            .into_transcription()
            .ok_or(TranscriptionError::EmptyResult)?;

        debug!(
            "Transcribed {} chars (confidence {:.2})",
            transcription.transcript.len(),
            transcription.confidence
        );
        Ok(transcription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::extract::Query;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    async fn serve(app: Router) -> (String, oneshot::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        (base_url, shutdown_tx)
    }

    #[tokio::test]
    async fn test_transcribe_returns_first_alternative() {
        let app = Router::new().route(
            "/v1/listen",
            post(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("model").map(String::as_str), Some("nova-3"));
                assert_eq!(params.get("language").map(String::as_str), Some("en-US"));
                Json(json!({
                    "results": {
                        "channels": [{
                            "alternatives": [
                                {"transcript": "I led the migration to Rust.", "confidence": 0.97},
                                {"transcript": "I lead the migration to rust", "confidence": 0.41}
                            ]
                        }]
                    }
                }))
            }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let client = DeepgramClient::new("dg-key".to_string(), Some(base_url));
        let result = client
            .transcribe(Bytes::from_static(b"fake-webm-audio"), "audio/webm")
            .await
            .unwrap();

        assert_eq!(result.transcript, "I led the migration to Rust.");
        assert!((result.confidence - 0.97).abs() < f64::EPSILON);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_transcribe_surfaces_api_errors() {
        let app = Router::new().route(
            "/v1/listen",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"err_msg": "unsupported encoding"})),
                )
            }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let client = DeepgramClient::new("dg-key".to_string(), Some(base_url));
        let err = client
            .transcribe(Bytes::from_static(b"not-audio"), "audio/webm")
            .await
            .unwrap_err();

        match err {
            TranscriptionError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("unsupported encoding"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_transcribe_empty_channels_is_empty_result() {
        let app = Router::new().route(
            "/v1/listen",
            post(|| async { Json(json!({"results": {"channels": []}})) }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let client = DeepgramClient::new("dg-key".to_string(), Some(base_url));
        let err = client
            .transcribe(Bytes::from_static(b"silence"), "audio/wav")
            .await
            .unwrap_err();

        assert!(matches!(err, TranscriptionError::EmptyResult));
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_transcribe_silence_yields_empty_transcript() {
        // Deepgram reports silence as an alternative with an empty transcript
        // and zero confidence, not as an error.
        let app = Router::new().route(
            "/v1/listen",
            post(|| async {
                Json(json!({
                    "results": {
                        "channels": [{
                            "alternatives": [{"transcript": "", "confidence": 0.0}]
                        }]
                    }
                }))
            }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let client = DeepgramClient::new("dg-key".to_string(), Some(base_url));
        let result = client
            .transcribe(Bytes::from_static(b"silence"), "audio/wav")
            .await
            .unwrap();

        assert_eq!(result.transcript, "");
        assert_eq!(result.confidence, 0.0);
        shutdown_tx.send(()).ok();
    }
}
