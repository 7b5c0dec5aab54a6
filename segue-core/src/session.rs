//! Deck control facade
//!
//! The session owns the decks, their players, the mixer, and the auto-mix
//! scheduler, and is the only writer to any of them. Collaborators drive
//! it two ways: discrete [`Command`]s from the operator, and a cooperative
//! [`Session::tick`] heartbeat that lets the scheduler run. Outcomes are
//! reported over the notification channel; errors never escape as panics.

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::automix::{AutoMix, AutoMixAction, AutoMixStatus};
use crate::clock;
use crate::deck::{DeckId, DeckPair, DeckState};
use crate::engine::{AudioEngine, DeckPlayer, DecodedTrack, EngineError};
use crate::error::SessionError;
use crate::mixer::MixerState;
use crate::notify::Notification;
use crate::sync;

/// MIME types `load` accepts before any engine work happens
pub const ACCEPTED_MIME_TYPES: [&str; 4] =
    ["audio/mpeg", "audio/mp3", "audio/wav", "audio/x-wav"];

/// A track handed over by the file-supplier collaborator
#[derive(Debug, Clone)]
pub struct TrackFile {
    /// Display name used in deck state and notifications
    pub name: String,
    /// MIME type reported by the supplier, validated before decoding
    pub mime_type: String,
    /// Raw file bytes for the engine to decode
    pub bytes: Vec<u8>,
}

/// Discrete operator commands the session consumes
#[derive(Debug, Clone)]
pub enum Command {
    /// Change one deck's tempo
    SetDeckBpm(DeckId, f32),
    /// Change the master tempo
    SetMasterBpm(f32),
    /// Retarget one deck's length in seconds
    SetTargetDuration(DeckId, f64),
    /// Start or stop a deck
    TogglePlay(DeckId),
    /// Enable or disable the auto-mix scheduler
    SetAutoMix(bool),
    /// Change the auto-mix crossfade length in seconds
    SetCrossfadeDuration(f64),
    /// Manually move the crossfade position
    SetCrossfade(f32),
    /// Align both decks' rates to the master tempo
    Sync,
    /// Load a track into a deck
    Load(DeckId, TrackFile),
}

/// Owner of the two decks, the mixer, and the auto-mix scheduler
pub struct Session<E: AudioEngine> {
    engine: E,
    decks: DeckPair,
    players: [Option<E::Player>; 2],
    mixer: MixerState,
    automix: AutoMix,
    notifications: Sender<Notification>,
}

impl<E: AudioEngine> Session<E> {
    /// Create a session around an engine collaborator
    ///
    /// The engine's crossfade is seeded from the mixer's initial position
    /// so the audible blend matches the reported state from the start.
    pub fn new(engine: E, notifications: Sender<Notification>) -> Self {
        let mut session = Self {
            engine,
            decks: DeckPair::default(),
            players: [None, None],
            mixer: MixerState::default(),
            automix: AutoMix::new(),
            notifications,
        };
        let initial = session.mixer.crossfade();
        session.engine.set_crossfade_position(initial);
        info!("session ready (crossfade {:.2})", initial);
        session
    }

    /// Get one deck's state
    pub fn deck(&self, deck: DeckId) -> &DeckState {
        &self.decks[deck]
    }

    /// Get the shared mixer state
    pub fn mixer(&self) -> &MixerState {
        &self.mixer
    }

    /// Get the auto-mix scheduler's coarse state
    pub fn automix_status(&self) -> AutoMixStatus {
        self.automix.status()
    }

    /// Seconds a playing deck has been running; 0 when stopped
    pub fn elapsed_secs(&self, deck: DeckId) -> f64 {
        clock::elapsed_secs(&self.decks[deck], self.engine.now())
    }

    /// Seconds left before a playing deck's effective end; 0 when stopped
    pub fn remaining_secs(&self, deck: DeckId) -> f64 {
        clock::remaining_secs(&self.decks[deck], self.engine.now())
    }

    /// Borrow the engine collaborator
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutably borrow the engine collaborator
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Apply one operator command
    ///
    /// Failures are reported through the notification sink before the
    /// operation returns, so the control loop treats every command as
    /// handled and nothing propagates as a fault.
    pub fn handle_command(&mut self, command: Command) {
        let result = match command {
            Command::SetDeckBpm(deck, bpm) => {
                self.set_deck_bpm(deck, bpm);
                Ok(())
            }
            Command::SetMasterBpm(bpm) => {
                self.set_master_bpm(bpm);
                Ok(())
            }
            Command::SetTargetDuration(deck, secs) => {
                self.set_target_duration(deck, secs);
                Ok(())
            }
            Command::TogglePlay(deck) => self.toggle_play(deck),
            Command::SetAutoMix(enabled) => {
                self.set_auto_mix(enabled);
                Ok(())
            }
            Command::SetCrossfadeDuration(secs) => {
                self.set_crossfade_duration(secs);
                Ok(())
            }
            Command::SetCrossfade(position) => {
                self.set_crossfade(position);
                Ok(())
            }
            Command::Sync => self.sync_decks().map(|_| ()),
            Command::Load(deck, file) => self.load(deck, file),
        };
        if let Err(err) = result {
            debug!("command rejected: {}", err);
        }
    }

    /// Cooperative heartbeat that lets the auto-mix scheduler run
    ///
    /// Call at a cadence at least as fine as the fade frame period; the
    /// scheduler does its own coarser gating against the engine clock.
    pub fn tick(&mut self) {
        let now = self.engine.now();
        match self.automix.tick(now, &self.mixer, &self.decks) {
            Some(AutoMixAction::Begin { next }) => self.begin_transition(next),
            Some(AutoMixAction::Fade { value }) => self.set_crossfade(value),
            Some(AutoMixAction::Complete { stop, value }) => {
                self.set_crossfade(value);
                self.finish_transition(stop);
            }
            None => {}
        }
    }

    /// Load a track into a deck, replacing any previous player
    ///
    /// Validation happens before any mutation. The old player is stopped
    /// and released before the new bytes reach the engine, so two players
    /// never overlap on one slot.
    pub fn load(&mut self, deck: DeckId, file: TrackFile) -> Result<(), SessionError> {
        if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            self.notify(Notification::error("Invalid File", "Load an MP3 or WAV file."));
            return Err(SessionError::InvalidFileType {
                mime_type: file.mime_type,
            });
        }

        {
            let state = &mut self.decks[deck];
            state.loading = true;
            state.playing = false;
            state.started_at = None;
        }

        if let Some(mut player) = self.players[deck.index()].take() {
            let _ = player.stop();
            player.release();
            debug!("deck {} released its previous player", deck);
        }

        let track = self
            .engine
            .decode(&file.bytes)
            .map_err(|err| self.fail_load(deck, &file.name, err))?;

        let mut player = self
            .engine
            .create_looping_player(&track)
            .map_err(|err| self.fail_load(deck, &file.name, err))?;
        player.set_playback_rate(1.0);

        let duration = track.duration_secs();
        self.players[deck.index()] = Some(player);
        let state = &mut self.decks[deck];
        state.track_name = Some(file.name.clone());
        state.duration = duration;
        state.target_duration = duration;
        state.playback_rate = 1.0;
        state.loading = false;

        info!("deck {} loaded {} ({:.1}s)", deck, file.name, duration);
        self.notify(Notification::info(
            format!("Track Loaded - Deck {deck}"),
            file.name,
        ));
        Ok(())
    }

    fn fail_load(&mut self, deck: DeckId, name: &str, source: EngineError) -> SessionError {
        self.decks[deck].loading = false;
        warn!("deck {} load failed: {}", deck, source);
        self.notify(Notification::error(
            "Load Error",
            format!("Failed to load {name}. The file may be corrupted."),
        ));
        SessionError::DecodeFailure { deck, source }
    }

    /// Start the deck if stopped, stop it if playing
    pub fn toggle_play(&mut self, deck: DeckId) -> Result<(), SessionError> {
        if self.players[deck.index()].is_none() {
            self.notify(Notification::info(
                "No Track Loaded",
                format!("Load a track into Deck {deck} first."),
            ));
            return Err(SessionError::NoTrackLoaded(deck));
        }
        if self.decks[deck].playing {
            self.stop_deck(deck)
        } else {
            self.start_deck(deck)
        }
    }

    /// Align both decks' playback rates to the master tempo
    ///
    /// Updates deck state and any live players together, then marks the
    /// mixer synchronized. Returns the applied `(rate_a, rate_b)` pair.
    pub fn sync_decks(&mut self) -> Result<(f32, f32), SessionError> {
        let rates = sync::tempo_rates(
            self.mixer.master_bpm(),
            self.decks[DeckId::A].bpm,
            self.decks[DeckId::B].bpm,
        );
        let (rate_a, rate_b) = match rates {
            Ok(rates) => rates,
            Err(err) => {
                self.notify(Notification::error(
                    "Invalid BPM",
                    "Set valid BPM values for both decks.",
                ));
                return Err(err);
            }
        };

        self.apply_rate(DeckId::A, rate_a);
        self.apply_rate(DeckId::B, rate_b);
        self.mixer.mark_synchronized();

        let master = self.mixer.master_bpm();
        info!("synced to {:.0} BPM: A x{:.3}, B x{:.3}", master, rate_a, rate_b);
        self.notify(Notification::info(
            "Tracks Synchronized",
            format!("Master BPM: {master:.0} | A: {rate_a:.2}x | B: {rate_b:.2}x"),
        ));
        Ok((rate_a, rate_b))
    }

    /// Retarget a deck's length, adjusting its rate to span `target`
    ///
    /// Non-positive or non-finite targets are ignored. The synchronized
    /// flag is left alone: duration sync and tempo sync are independent,
    /// and whichever ran last owns the deck's rate.
    pub fn set_target_duration(&mut self, deck: DeckId, target: f64) {
        let Some(rate) = sync::duration_rate(self.decks[deck].duration, target) else {
            return;
        };
        self.decks[deck].target_duration = target;
        self.apply_rate(deck, rate);
        debug!("deck {} targeting {:.1}s at x{:.3}", deck, target, rate);
    }

    /// Set one deck's tempo; any tempo edit invalidates a previous sync
    pub fn set_deck_bpm(&mut self, deck: DeckId, bpm: f32) {
        self.decks[deck].bpm = sync::clamp_bpm(bpm);
        self.mixer.clear_synchronized();
    }

    /// Set the master tempo; any tempo edit invalidates a previous sync
    pub fn set_master_bpm(&mut self, bpm: f32) {
        self.mixer.set_master_bpm(bpm);
    }

    /// Move the crossfade and push the new position to the engine
    pub fn set_crossfade(&mut self, position: f32) {
        self.mixer.set_crossfade(position);
        self.engine.set_crossfade_position(self.mixer.crossfade());
    }

    /// Set the auto-mix crossfade length in seconds, clamped to [2, 16]
    pub fn set_crossfade_duration(&mut self, secs: f64) {
        self.mixer.set_crossfade_duration(secs);
    }

    /// Enable or disable auto-mix; an in-flight fade always finishes
    pub fn set_auto_mix(&mut self, enabled: bool) {
        self.mixer.set_auto_mix_enabled(enabled);
        info!("auto-mix {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Write a clamped rate to one deck's state and its live player
    fn apply_rate(&mut self, deck: DeckId, rate: f32) {
        self.decks[deck].playback_rate = rate;
        if let Some(player) = self.players[deck.index()].as_mut() {
            player.set_playback_rate(rate);
        }
    }

    fn start_deck(&mut self, deck: DeckId) -> Result<(), SessionError> {
        let Some(player) = self.players[deck.index()].as_mut() else {
            return Err(SessionError::NoTrackLoaded(deck));
        };
        if let Err(err) = player.start() {
            warn!("deck {} failed to start: {}", deck, err);
            self.notify(Notification::error(
                "Playback Error",
                "An error occurred during playback.",
            ));
            return Err(SessionError::Playback { deck, source: err });
        }
        let now = self.engine.now();
        let state = &mut self.decks[deck];
        state.playing = true;
        state.started_at = Some(now);
        debug!("deck {} started at {:.3}s", deck, now);
        Ok(())
    }

    fn stop_deck(&mut self, deck: DeckId) -> Result<(), SessionError> {
        let result = match self.players[deck.index()].as_mut() {
            Some(player) => player.stop(),
            None => Ok(()),
        };
        // The deck is stopped from the core's point of view even when the
        // engine call fails; a half-stopped player must not keep the
        // monitor watching this deck.
        let state = &mut self.decks[deck];
        state.playing = false;
        state.started_at = None;
        if let Err(err) = result {
            warn!("deck {} failed to stop: {}", deck, err);
            self.notify(Notification::error(
                "Playback Error",
                "An error occurred during playback.",
            ));
            return Err(SessionError::Playback { deck, source: err });
        }
        debug!("deck {} stopped", deck);
        Ok(())
    }

    fn begin_transition(&mut self, next: DeckId) {
        if self.decks[next].playing {
            return;
        }
        if self.start_deck(next).is_err() {
            let now = self.engine.now();
            self.automix.abort(now);
        }
    }

    fn finish_transition(&mut self, stop: DeckId) {
        if !self.decks[stop].playing {
            return;
        }
        // A stop failure is already notified inside stop_deck; the
        // transition is over either way.
        let _ = self.stop_deck(stop);
    }

    fn notify(&self, notification: Notification) {
        // Presentation may be gone or saturated; never block on it.
        let _ = self.notifications.try_send(notification);
    }
}
