//! Rate synchronization math
//!
//! Pure functions from tempo or duration targets to playback rates. They
//! mutate nothing; the session facade applies the results to deck state
//! and live players.

use crate::error::SessionError;

/// Lower bound for deck playback rates
pub const MIN_PLAYBACK_RATE: f32 = 0.5;
/// Upper bound for deck playback rates
pub const MAX_PLAYBACK_RATE: f32 = 2.0;
/// Lower bound for operator tempo values
pub const MIN_BPM: f32 = 60.0;
/// Upper bound for operator tempo values
pub const MAX_BPM: f32 = 200.0;

/// Clamp a playback rate into the supported range
pub fn clamp_rate(rate: f32) -> f32 {
    rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
}

/// Clamp an operator tempo into the supported range
///
/// Non-finite input falls back to the lower bound rather than poisoning
/// downstream rate math.
pub fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        MIN_BPM
    }
}

fn positive(bpm: f32) -> bool {
    bpm.is_finite() && bpm > 0.0
}

/// Playback rates that align both decks to the master tempo
///
/// Each rate is `master / deck`, clamped independently to [0.5, 2.0].
/// Fails with `InvalidBpm` when either deck tempo is not a positive
/// number; a failed call computes nothing, so callers can reject without
/// touching any state.
pub fn tempo_rates(
    master_bpm: f32,
    deck_a_bpm: f32,
    deck_b_bpm: f32,
) -> Result<(f32, f32), SessionError> {
    if !positive(deck_a_bpm) || !positive(deck_b_bpm) {
        return Err(SessionError::InvalidBpm);
    }
    Ok((
        clamp_rate(master_bpm / deck_a_bpm),
        clamp_rate(master_bpm / deck_b_bpm),
    ))
}

/// Rate that makes a track of `original` seconds span `target` seconds
///
/// Returns `None` unless the target is a positive, finite number of
/// seconds; callers treat that as a no-op.
pub fn duration_rate(original: f64, target: f64) -> Option<f32> {
    if !target.is_finite() || target <= 0.0 {
        return None;
    }
    Some(clamp_rate((original / target) as f32))
}
