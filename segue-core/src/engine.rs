//! Audio engine capability surface
//!
//! The control core does no decoding, playback, or signal routing of its
//! own; it drives a collaborator through the narrow traits below. Engines
//! hold no application state. They take commands, report failures, and
//! supply the one clock every timing decision reads from.

use thiserror::Error;

/// Failures reported by an audio engine
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No usable engine exists in this environment
    #[error("audio engine unavailable: {0}")]
    Unavailable(String),
    /// The engine could not turn the supplied bytes into playable audio
    #[error("decode failed: {0}")]
    Decode(String),
    /// A player start or stop command failed
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Decoded audio held by the engine on behalf of a deck
pub trait DecodedTrack {
    /// Length of the decoded audio in seconds
    fn duration_secs(&self) -> f64;
}

/// A looping player bound to one deck's decoded audio
pub trait DeckPlayer {
    /// Set the playback rate multiplier
    fn set_playback_rate(&mut self, rate: f32);

    /// Begin looping playback
    fn start(&mut self) -> Result<(), EngineError>;

    /// Halt playback
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Tear down the player's engine-side resources
    ///
    /// Called once, after `stop`, before the deck slot is reused.
    fn release(&mut self);
}

/// What the control core requires from an audio engine
pub trait AudioEngine {
    type Track: DecodedTrack;
    type Player: DeckPlayer;

    /// Current engine time in seconds, monotonic within a session
    fn now(&self) -> f64;

    /// Decode raw file bytes into playable audio
    fn decode(&mut self, bytes: &[u8]) -> Result<Self::Track, EngineError>;

    /// Build a looping player over previously decoded audio
    fn create_looping_player(&mut self, track: &Self::Track) -> Result<Self::Player, EngineError>;

    /// Move the A/B blend: 0.0 is deck A alone, 1.0 is deck B
    fn set_crossfade_position(&mut self, position: f32);
}
