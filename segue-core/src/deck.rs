//! Deck identity and per-deck state

use std::fmt;
use std::ops::{Index, IndexMut};

/// Identifier for one of the two playback decks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckId {
    A,
    B,
}

impl DeckId {
    /// Both decks, in A-first order
    pub const ALL: [DeckId; 2] = [DeckId::A, DeckId::B];

    /// The opposite deck
    pub fn other(self) -> Self {
        match self {
            DeckId::A => DeckId::B,
            DeckId::B => DeckId::A,
        }
    }

    /// Slot index for array-backed per-deck storage
    pub fn index(self) -> usize {
        match self {
            DeckId::A => 0,
            DeckId::B => 1,
        }
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckId::A => f.write_str("A"),
            DeckId::B => f.write_str("B"),
        }
    }
}

/// Complete state of a single deck
///
/// Plain data with no behavior of its own. All mutation goes through the
/// session facade, which keeps `playback_rate` inside [0.5, 2.0] and
/// `started_at` present exactly while the deck is playing.
#[derive(Debug, Clone)]
pub struct DeckState {
    /// Operator-supplied tempo in beats per minute (60-200)
    pub bpm: f32,
    /// Playback rate multiplier, always clamped to [0.5, 2.0]
    pub playback_rate: f32,
    /// Whether the deck is currently playing
    pub playing: bool,
    /// Name of the loaded track, if any
    pub track_name: Option<String>,
    /// Whether a load is in progress
    pub loading: bool,
    /// Original track duration in seconds, set on load
    pub duration: f64,
    /// Operator-adjustable target duration in seconds
    pub target_duration: f64,
    /// Engine-clock timestamp of the last start; `Some` iff playing
    pub started_at: Option<f64>,
}

impl Default for DeckState {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            playback_rate: 1.0,
            playing: false,
            track_name: None,
            loading: false,
            duration: 0.0,
            target_duration: 0.0,
            started_at: None,
        }
    }
}

impl DeckState {
    /// Whether a track has been loaded into this deck
    pub fn is_loaded(&self) -> bool {
        self.track_name.is_some()
    }
}

/// The two deck slots, addressable by `DeckId`
#[derive(Debug, Clone, Default)]
pub struct DeckPair {
    decks: [DeckState; 2],
}

impl DeckPair {
    /// Whether at least one deck is playing
    pub fn any_playing(&self) -> bool {
        self.decks.iter().any(|deck| deck.playing)
    }

    /// The deck the monitor should watch
    ///
    /// Deck A takes precedence when both decks are playing; `None` when
    /// neither is.
    pub fn active(&self) -> Option<DeckId> {
        if self[DeckId::A].playing {
            Some(DeckId::A)
        } else if self[DeckId::B].playing {
            Some(DeckId::B)
        } else {
            None
        }
    }
}

impl Index<DeckId> for DeckPair {
    type Output = DeckState;

    fn index(&self, deck: DeckId) -> &DeckState {
        &self.decks[deck.index()]
    }
}

impl IndexMut<DeckId> for DeckPair {
    fn index_mut(&mut self, deck: DeckId) -> &mut DeckState {
        &mut self.decks[deck.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_flips_decks() {
        assert_eq!(DeckId::A.other(), DeckId::B);
        assert_eq!(DeckId::B.other(), DeckId::A);
    }

    #[test]
    fn test_indices_are_distinct() {
        assert_ne!(DeckId::A.index(), DeckId::B.index());
    }

    #[test]
    fn test_fresh_deck_is_stopped_and_empty() {
        let deck = DeckState::default();
        assert!(!deck.playing);
        assert!(!deck.loading);
        assert!(!deck.is_loaded());
        assert_eq!(deck.playback_rate, 1.0);
        assert_eq!(deck.bpm, 120.0);
        assert!(deck.started_at.is_none());
    }

    #[test]
    fn test_active_deck_prefers_a() {
        let mut decks = DeckPair::default();
        assert_eq!(decks.active(), None);
        assert!(!decks.any_playing());

        decks[DeckId::B].playing = true;
        assert_eq!(decks.active(), Some(DeckId::B));

        decks[DeckId::A].playing = true;
        assert_eq!(decks.active(), Some(DeckId::A), "A wins when both play");
        assert!(decks.any_playing());
    }
}
