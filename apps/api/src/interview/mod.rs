// Interview engine: session lifecycle, prompt assembly, persistence,
// report building, and the HTTP handlers that expose them.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod handlers;
pub mod prompts;
pub mod report;
pub mod session;
pub mod store;

use crate::models::session::{Role, Turn};

/// Interviews ask exactly this many questions before wrapping up.
pub const QUESTION_LIMIT: usize = 10;

/// Renders a conversation as the plain-text transcript fed to prompts.
///
/// One line per turn, speaker-labelled, in order:
/// ```text
/// Interviewer: Tell me about yourself.
/// Candidate: I build backend services in Rust.
/// ```
pub fn render_transcript(conversation: &[Turn]) -> String {
    conversation
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::Interviewer => "Interviewer",
                Role::Candidate => "Candidate",
            };
            format!("{}: {}", speaker, turn.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::session::Turn;

    #[test]
    fn test_render_transcript_labels_speakers_in_order() {
        let conversation = vec![
            Turn::interviewer("Tell me about yourself."),
            Turn::candidate("I build backend services in Rust."),
            Turn::interviewer("What was your hardest production incident?"),
        ];

        let transcript = render_transcript(&conversation);

        assert_eq!(
            transcript,
            "Interviewer: Tell me about yourself.\n\
             Candidate: I build backend services in Rust.\n\
             Interviewer: What was your hardest production incident?"
        );
    }

    #[test]
    fn test_render_transcript_empty_conversation() {
        assert_eq!(render_transcript(&[]), "");
    }
}
