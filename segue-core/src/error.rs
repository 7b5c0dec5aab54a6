//! Error taxonomy for session operations

use thiserror::Error;

use crate::deck::DeckId;
use crate::engine::EngineError;

/// Errors surfaced by session operations
///
/// Validation failures reject before any state changes. Engine failures
/// are caught at the facade, which first returns the deck to a consistent
/// state. Every variant is also reported through the notification sink,
/// so callers may ignore the `Err` without losing the operator-facing
/// message.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The supplied MIME type is not an accepted audio type
    #[error("unsupported file type `{mime_type}`")]
    InvalidFileType { mime_type: String },

    /// The engine could not produce playable audio from the file
    #[error("failed to decode track for deck {deck}")]
    DecodeFailure {
        deck: DeckId,
        #[source]
        source: EngineError,
    },

    /// Play was requested on a deck with no loaded track
    #[error("no track loaded in deck {0}")]
    NoTrackLoaded(DeckId),

    /// Tempo sync was requested with a non-positive deck BPM
    #[error("both deck BPM values must be positive")]
    InvalidBpm,

    /// The engine failed to start or stop a deck player
    #[error("playback failed on deck {deck}")]
    Playback {
        deck: DeckId,
        #[source]
        source: EngineError,
    },
}
