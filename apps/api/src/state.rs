use std::sync::Arc;

use crate::interview::store::SessionStore;
use crate::llm_client::TextGenerator;
use crate::speech::synthesis::SpeechSynthesizer;
use crate::speech::transcription::SpeechTranscriber;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator sits behind a trait object: handlers and session logic
/// never see a concrete pool or provider client, which is also what lets the
/// test suite assemble a state from in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub llm: Arc<dyn TextGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
}
