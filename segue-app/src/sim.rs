//! Simulated audio engine for headless runs
//!
//! Stands in for a real output device: keeps honest wall-clock time,
//! fakes decoding by sizing the byte buffer against a CD-quality data
//! rate, and narrates player commands through the log instead of making
//! sound. The core drives it exactly as it would drive the real thing.

use std::time::Instant;

use segue_core::{AudioEngine, DeckPlayer, DecodedTrack, EngineError};
use tracing::{debug, info};

/// Bytes per second of 16-bit stereo PCM at 44.1 kHz
const CD_BYTES_PER_SEC: f64 = 176_400.0;

/// Decoded audio stand-in; only the duration matters to the core
pub struct SimTrack {
    duration: f64,
}

impl DecodedTrack for SimTrack {
    fn duration_secs(&self) -> f64 {
        self.duration
    }
}

/// Player stand-in that logs start and stop instead of playing
pub struct SimPlayer {
    id: u32,
    rate: f32,
}

impl DeckPlayer for SimPlayer {
    fn set_playback_rate(&mut self, rate: f32) {
        self.rate = rate;
        debug!("player {} rate -> x{:.3}", self.id, rate);
    }

    fn start(&mut self) -> Result<(), EngineError> {
        info!("player {} started (x{:.3})", self.id, self.rate);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        info!("player {} stopped", self.id);
        Ok(())
    }

    fn release(&mut self) {
        debug!("player {} released", self.id);
    }
}

/// Clock-only engine: real time, no audio
pub struct SimEngine {
    origin: Instant,
    next_player_id: u32,
    crossfade: f32,
}

impl SimEngine {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_player_id: 1,
            crossfade: 0.5,
        }
    }

    /// Get the last crossfade position the core pushed down
    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for SimEngine {
    type Track = SimTrack;
    type Player = SimPlayer;

    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<SimTrack, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::Decode("file is empty".into()));
        }
        Ok(SimTrack {
            duration: bytes.len() as f64 / CD_BYTES_PER_SEC,
        })
    }

    fn create_looping_player(&mut self, track: &SimTrack) -> Result<SimPlayer, EngineError> {
        let id = self.next_player_id;
        self.next_player_id += 1;
        debug!("player {} created ({:.1}s loop)", id, track.duration_secs());
        Ok(SimPlayer { id, rate: 1.0 })
    }

    fn set_crossfade_position(&mut self, position: f32) {
        self.crossfade = position;
    }
}
