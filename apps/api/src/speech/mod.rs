// Speech adapters — one module per provider concern.
// Synthesis degrades to null on failure; transcription surfaces failure.

pub mod synthesis;
pub mod transcription;
