//! Speech Synthesis Adapter — Murf TTS behind a never-failing contract.
//!
//! `synthesize(text)` returns `Some(audio_url)` or `None` — never an error.
//! Speech is an enhancement: when the provider is down, slow, or returns
//! garbage, the interview continues and the client falls back to a local
//! voice. Asynchronous synthesis jobs are polled on a bounded schedule
//! driven through an injectable `Delay`, so tests never wait real seconds.
//!
//! Voice: en-US-charles, MP3 (hardcoded — do not make configurable to
//! prevent drift)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MURF_API_URL: &str = "https://api.murf.ai";
/// The interviewer voice for all synthesized speech.
pub const VOICE_ID: &str = "en-US-charles";
const AUDIO_FORMAT: &str = "MP3";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_ATTEMPTS: u32 = 30;

/// The synthesis boundary. Carried in `AppState` as
/// `Arc<dyn SpeechSynthesizer>`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Converts text to a playable audio URL. `None` means "no
    /// server-generated audio" — the caller is expected to fall back to a
    /// client-side voice, never to treat it as an error.
    async fn synthesize(&self, text: &str) -> Option<String>;
}

/// Async sleep seam for the polling loop. Production uses `TokioDelay`;
/// tests swap in a no-op so the 30-attempt loop runs instantly.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Error)]
enum SynthesisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("synthesis job failed")]
    JobFailed,

    #[error("synthesis job still pending after {0} polls")]
    JobTimedOut(u32),

    #[error("synthesis response carried neither an audio URL nor a job id")]
    UnexpectedResponse,
}

/// States of an asynchronous synthesis job, as observed through polling.
#[derive(Debug, PartialEq)]
enum JobState {
    Pending,
    Succeeded(String),
    Failed,
    TimedOut,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest<'a> {
    voice_id: &'a str,
    text: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechResponse {
    audio_file: Option<String>,
    audio_url: Option<String>,
    url: Option<String>,
    job_id: Option<String>,
}

impl SpeechResponse {
    /// The provider has returned the audio URL under three different keys
    /// over time; accept any of them.
    fn direct_url(&self) -> Option<String> {
        self.audio_file
            .clone()
            .or_else(|| self.audio_url.clone())
            .or_else(|| self.url.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusResponse {
    status: String,
    audio_file_url: Option<String>,
    audio_url: Option<String>,
}

/// Maps one observed job status onto the state machine.
fn job_state(status: &JobStatusResponse) -> JobState {
    match status.status.as_str() {
        "completed" => match status
            .audio_file_url
            .clone()
            .or_else(|| status.audio_url.clone())
        {
            Some(url) => JobState::Succeeded(url),
            None => JobState::Failed,
        },
        "failed" => JobState::Failed,
        _ => JobState::Pending,
    }
}

/// The Murf-backed synthesizer used in production.
pub struct MurfClient {
    client: Client,
    api_key: String,
    base_url: String,
    delay: Arc<dyn Delay>,
}

impl MurfClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: base_url.unwrap_or_else(|| MURF_API_URL.to_string()),
            delay: Arc::new(TokioDelay),
        }
    }

    /// Swaps the polling delay. Lets tests drive the 30-attempt loop without
    /// real one-second waits.
    #[allow(dead_code)]
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    async fn generate_speech(&self, text: &str) -> Result<String, SynthesisError> {
        let url = format!("{}/v1/speech/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&SpeechRequest {
                voice_id: VOICE_ID,
                text,
                format: AUDIO_FORMAT,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let speech: SpeechResponse = response.json().await?;

        if let Some(url) = speech.direct_url() {
            return Ok(url);
        }

        // Asynchronous synthesis: the provider handed back a job id instead
        // of audio. Poll it to a terminal state.
        if let Some(job_id) = speech.job_id {
            return match self.run_job(&job_id).await {
                JobState::Succeeded(url) => Ok(url),
                JobState::Failed => Err(SynthesisError::JobFailed),
                JobState::Pending | JobState::TimedOut => {
                    Err(SynthesisError::JobTimedOut(MAX_POLL_ATTEMPTS))
                }
            };
        }

        Err(SynthesisError::UnexpectedResponse)
    }

    /// Drives a synthesis job to a terminal state: at most
    /// `MAX_POLL_ATTEMPTS` status checks, one `POLL_INTERVAL` apart.
    /// A transport error during polling counts as failure, not as retryable.
    async fn run_job(&self, job_id: &str) -> JobState {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            self.delay.sleep(POLL_INTERVAL).await;

            match self.fetch_job_status(job_id).await {
                Ok(status) => match job_state(&status) {
                    JobState::Pending => continue,
                    terminal => return terminal,
                },
                Err(e) => {
                    warn!("Synthesis job poll {attempt}/{MAX_POLL_ATTEMPTS} failed: {e}");
                    return JobState::Failed;
                }
            }
        }
        JobState::TimedOut
    }

    async fn fetch_job_status(&self, job_id: &str) -> Result<JobStatusResponse, SynthesisError> {
        let url = format!("{}/v1/speech/generate/{}", self.base_url, job_id);

        let response = self
            .client
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeechSynthesizer for MurfClient {
    async fn synthesize(&self, text: &str) -> Option<String> {
        match self.generate_speech(text).await {
            Ok(url) => {
                debug!("Synthesized {} chars of speech", text.len());
                Some(url)
            }
            Err(e) => {
                warn!("Speech synthesis failed, falling back to client-side voice: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    struct NoDelay;

    #[async_trait]
    impl Delay for NoDelay {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn client_for(base_url: String) -> MurfClient {
        MurfClient::new("test-key".to_string(), Some(base_url)).with_delay(Arc::new(NoDelay))
    }

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

    #[test]
    fn test_job_state_completed_with_url_succeeds() {
        let status = JobStatusResponse {
            status: "completed".to_string(),
            audio_file_url: Some("https://cdn.example/a.mp3".to_string()),
            audio_url: None,
        };
        assert_eq!(
            job_state(&status),
            JobState::Succeeded("https://cdn.example/a.mp3".to_string())
        );
    }

    #[test]
    fn test_job_state_completed_without_url_fails() {
        let status = JobStatusResponse {
            status: "completed".to_string(),
            audio_file_url: None,
            audio_url: None,
        };
        assert_eq!(job_state(&status), JobState::Failed);
    }

    #[test]
    fn test_job_state_failed_and_pending() {
        let failed = JobStatusResponse {
            status: "failed".to_string(),
            audio_file_url: None,
            audio_url: None,
        };
        let processing = JobStatusResponse {
            status: "processing".to_string(),
            audio_file_url: None,
            audio_url: None,
        };
        assert_eq!(job_state(&failed), JobState::Failed);
        assert_eq!(job_state(&processing), JobState::Pending);
    }

    #[tokio::test]
    async fn test_synthesize_returns_direct_audio_url() {
        let app = Router::new().route(
            "/v1/speech/generate",
            post(|| async { Json(json!({"audioFile": "https://cdn.example/q1.mp3"})) }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("First question").await;

        assert_eq!(audio, Some("https://cdn.example/q1.mp3".to_string()));
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_synthesize_polls_job_to_completion() {
        let polls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1/speech/generate",
                post(|| async { Json(json!({"jobId": "job-42"})) }),
            )
            .route("/v1/speech/generate/:job_id", {
                let polls = polls.clone();
                get(move || {
                    let polls = polls.clone();
                    async move {
                        if polls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Json(json!({"status": "processing"}))
                        } else {
                            Json(json!({
                                "status": "completed",
                                "audioFileUrl": "https://cdn.example/j42.mp3"
                            }))
                        }
                    }
                })
            });
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("Second question").await;

        assert_eq!(audio, Some("https://cdn.example/j42.mp3".to_string()));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_synthesize_never_errors_on_provider_failure() {
        let app = Router::new().route(
            "/v1/speech/generate",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("Question").await;

        assert_eq!(audio, None);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_synthesize_null_on_unexpected_response_shape() {
        let app = Router::new().route(
            "/v1/speech/generate",
            post(|| async { Json(json!({"something": "else"})) }),
        );
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("Question").await;

        assert_eq!(audio, None);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_synthesize_null_when_job_fails() {
        let app = Router::new()
            .route(
                "/v1/speech/generate",
                post(|| async { Json(json!({"jobId": "job-9"})) }),
            )
            .route(
                "/v1/speech/generate/:job_id",
                get(|| async { Json(json!({"status": "failed"})) }),
            );
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("Question").await;

        assert_eq!(audio, None);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_synthesize_null_when_job_never_completes() {
        let polls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/v1/speech/generate",
                post(|| async { Json(json!({"jobId": "job-7"})) }),
            )
            .route("/v1/speech/generate/:job_id", {
                let polls = polls.clone();
                get(move || {
                    let polls = polls.clone();
                    async move {
                        polls.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"status": "processing"}))
                    }
                })
            });
        let (base_url, shutdown_tx) = serve(app).await;

        let audio = client_for(base_url).synthesize("Question").await;

        assert_eq!(audio, None);
        assert_eq!(polls.load(Ordering::SeqCst), MAX_POLL_ATTEMPTS as usize);
        shutdown_tx.send(()).ok();
    }
}
