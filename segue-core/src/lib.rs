//! Segue control core
//!
//! State and scheduling for a two-deck rig: per-deck state, clamped rate
//! sync against a master tempo or a duration target, a playback clock
//! derived from the engine's time base, and the auto-mix scheduler that
//! crossfades to the other deck as a track approaches its effective end.
//!
//! Audio itself stays behind the [`AudioEngine`] capability traits; the
//! core never touches samples. Everything funnels through [`Session`],
//! the single owner of deck, mixer, and scheduler state.

mod automix;
pub mod clock;
mod deck;
mod engine;
mod error;
mod mixer;
mod notify;
mod session;
mod sync;

pub use automix::{AutoMix, AutoMixAction, AutoMixStatus, FADE_TICK_SECS, MONITOR_PERIOD_SECS};
pub use deck::{DeckId, DeckPair, DeckState};
pub use engine::{AudioEngine, DeckPlayer, DecodedTrack, EngineError};
pub use error::SessionError;
pub use mixer::{MixerState, MAX_CROSSFADE_SECS, MIN_CROSSFADE_SECS};
pub use notify::{notification_channel, Notification, Severity};
pub use session::{Command, Session, TrackFile, ACCEPTED_MIME_TYPES};
pub use sync::{
    clamp_bpm, clamp_rate, duration_rate, tempo_rates, MAX_BPM, MAX_PLAYBACK_RATE, MIN_BPM,
    MIN_PLAYBACK_RATE,
};
