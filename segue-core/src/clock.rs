//! Playback clock
//!
//! Derived timing for a deck, recomputed from deck state and the engine
//! clock on every call. Nothing here is cached.

use crate::deck::DeckState;

/// Seconds of engine time since the deck last started; 0.0 when stopped
pub fn elapsed_secs(deck: &DeckState, now: f64) -> f64 {
    match deck.started_at {
        Some(started_at) if deck.playing => (now - started_at).max(0.0),
        _ => 0.0,
    }
}

/// Track length in seconds once the playback rate is applied
pub fn effective_duration_secs(deck: &DeckState) -> f64 {
    deck.duration / f64::from(deck.playback_rate)
}

/// Seconds of playback left before the track's effective end
///
/// Zero when the deck is not playing, so a stopped deck never looks close
/// enough to its end to trigger a transition.
pub fn remaining_secs(deck: &DeckState, now: f64) -> f64 {
    if !deck.playing {
        return 0.0;
    }
    (effective_duration_secs(deck) - elapsed_secs(deck, now)).max(0.0)
}
