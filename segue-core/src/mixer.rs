//! Mixer state shared by both decks

use crate::sync;

/// Shortest allowed auto-mix crossfade, in seconds
pub const MIN_CROSSFADE_SECS: f64 = 2.0;
/// Longest allowed auto-mix crossfade, in seconds
pub const MAX_CROSSFADE_SECS: f64 = 16.0;

/// Session-wide mixer state
///
/// Fields are private so every write path runs through a clamping setter.
#[derive(Debug, Clone)]
pub struct MixerState {
    /// Master tempo both decks sync toward (60-200 BPM)
    master_bpm: f32,
    /// Crossfade position (0.0 = full A, 1.0 = full B)
    crossfade: f32,
    /// True only while the decks still match the last tempo sync
    synchronized: bool,
    /// Whether the auto-mix scheduler may trigger transitions
    auto_mix_enabled: bool,
    /// Length of an auto-mix crossfade in seconds (2-16)
    crossfade_duration: f64,
}

impl Default for MixerState {
    fn default() -> Self {
        Self {
            master_bpm: 120.0,
            crossfade: 0.5,
            synchronized: false,
            auto_mix_enabled: false,
            crossfade_duration: 8.0,
        }
    }
}

impl MixerState {
    /// Get the master tempo in BPM
    pub fn master_bpm(&self) -> f32 {
        self.master_bpm
    }

    /// Set the master tempo, clamped to [60, 200]
    ///
    /// Any tempo change invalidates a previous sync.
    pub fn set_master_bpm(&mut self, bpm: f32) {
        self.master_bpm = sync::clamp_bpm(bpm);
        self.synchronized = false;
    }

    /// Get the crossfade position: 0.0 is deck A alone, 1.0 is deck B
    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }

    /// Set the crossfade position, clamped to [0, 1]
    pub fn set_crossfade(&mut self, position: f32) {
        if position.is_finite() {
            self.crossfade = position.clamp(0.0, 1.0);
        }
    }

    /// Whether the decks are still aligned to the last tempo sync
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Record that a tempo sync was just applied
    pub(crate) fn mark_synchronized(&mut self) {
        self.synchronized = true;
    }

    /// Drop the synchronized flag after a tempo edit
    pub(crate) fn clear_synchronized(&mut self) {
        self.synchronized = false;
    }

    /// Whether the auto-mix scheduler may trigger transitions
    pub fn auto_mix_enabled(&self) -> bool {
        self.auto_mix_enabled
    }

    /// Enable or disable auto-mix triggering
    pub fn set_auto_mix_enabled(&mut self, enabled: bool) {
        self.auto_mix_enabled = enabled;
    }

    /// Get the auto-mix crossfade length in seconds
    pub fn crossfade_duration(&self) -> f64 {
        self.crossfade_duration
    }

    /// Set the auto-mix crossfade length, clamped to [2, 16] seconds
    pub fn set_crossfade_duration(&mut self, secs: f64) {
        if secs.is_finite() {
            self.crossfade_duration = secs.clamp(MIN_CROSSFADE_SECS, MAX_CROSSFADE_SECS);
        }
    }
}
