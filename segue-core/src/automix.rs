//! Auto-mix scheduler
//!
//! A single object owns the whole transition lifecycle: a tagged phase
//! (idle, monitoring, transitioning) plus the poll and frame deadlines
//! that drive it. All mutation funnels through [`AutoMix::tick`], which
//! re-reads live deck and mixer state on every call, so decisions are
//! never made from stale snapshots. The `Transitioning` tag doubles as
//! the re-entrancy guard: trigger checks run only under `Monitoring`, so
//! a second transition cannot start while one is in flight.
//!
//! The scheduler decides; the session applies. Each tick returns at most
//! one [`AutoMixAction`] for the caller to carry out against the engine.

use tracing::{debug, info, warn};

use crate::clock;
use crate::deck::{DeckId, DeckPair};
use crate::mixer::MixerState;

/// Seconds of engine time between end-of-track polls while monitoring
pub const MONITOR_PERIOD_SECS: f64 = 0.1;
/// Seconds of engine time between crossfade animation frames
pub const FADE_TICK_SECS: f64 = 0.02;

/// Coarse scheduler state, for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMixStatus {
    Idle,
    Monitoring,
    Transitioning,
}

/// An in-flight crossfade from one deck to the other
#[derive(Debug, Clone, Copy)]
struct Transition {
    /// Deck that was active when the transition triggered
    from: DeckId,
    /// Deck being faded in
    to: DeckId,
    /// Engine time at which the fade began
    started_at: f64,
    /// Fade length: the mixer's crossfade duration, captured at trigger
    duration: f64,
    /// Crossfade position when the fade began
    start_value: f32,
    /// Crossfade endpoint that leaves `to` alone audible
    end_value: f32,
    /// Engine time of the next animation frame
    next_frame_at: f64,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Monitoring { next_poll_at: f64 },
    Transitioning(Transition),
}

/// Side effect the session must apply after a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoMixAction {
    /// A transition triggered: start `next` unless it already plays
    Begin { next: DeckId },
    /// Advance the crossfade to `value`
    Fade { value: f32 },
    /// The fade finished: settle the crossfade at `value`, stop `stop`
    Complete { stop: DeckId, value: f32 },
}

/// Timer-driven state machine that watches playback and drives crossfades
#[derive(Debug)]
pub struct AutoMix {
    phase: Phase,
    /// Target of an aborted transition; trigger checks skip this deck
    /// until it starts reloading or the crossfade window lapses
    held: Option<DeckId>,
}

impl Default for AutoMix {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoMix {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            held: None,
        }
    }

    /// Get the coarse state of the scheduler
    pub fn status(&self) -> AutoMixStatus {
        match self.phase {
            Phase::Idle => AutoMixStatus::Idle,
            Phase::Monitoring { .. } => AutoMixStatus::Monitoring,
            Phase::Transitioning(_) => AutoMixStatus::Transitioning,
        }
    }

    /// Whether a crossfade is currently in flight
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning(_))
    }

    /// Step the machine against the current engine time and live state
    ///
    /// The sole mutation entry point; the session calls it from its
    /// heartbeat. Cheap when no deadline has passed. Disabling auto-mix
    /// stops new triggers but an in-flight fade always runs to its end.
    pub fn tick(
        &mut self,
        now: f64,
        mixer: &MixerState,
        decks: &DeckPair,
    ) -> Option<AutoMixAction> {
        match &mut self.phase {
            Phase::Idle => {
                if mixer.auto_mix_enabled() && decks.any_playing() {
                    debug!("auto-mix armed, monitoring playback");
                    self.phase = Phase::Monitoring {
                        next_poll_at: now + MONITOR_PERIOD_SECS,
                    };
                }
                None
            }
            Phase::Monitoring { next_poll_at } => {
                if !mixer.auto_mix_enabled() || !decks.any_playing() {
                    debug!("auto-mix disarmed");
                    self.phase = Phase::Idle;
                    self.held = None;
                    return None;
                }
                if now < *next_poll_at {
                    return None;
                }
                *next_poll_at = now + MONITOR_PERIOD_SECS;

                let Some(active) = decks.active() else {
                    return None;
                };
                let next = active.other();
                let remaining = clock::remaining_secs(&decks[active], now);
                let window = mixer.crossfade_duration();
                let in_window = remaining > 0.0 && remaining <= window;
                if let Some(held) = self.held {
                    if !in_window || decks[held].loading {
                        debug!("auto-mix hold on deck {} released", held);
                        self.held = None;
                    }
                }
                let next_ready = decks[next].is_loaded() && !decks[next].loading;
                if in_window && next_ready && self.held != Some(next) {
                    let transition = Transition {
                        from: active,
                        to: next,
                        started_at: now,
                        duration: window,
                        start_value: mixer.crossfade(),
                        end_value: if active == DeckId::A { 1.0 } else { 0.0 },
                        next_frame_at: now + FADE_TICK_SECS,
                    };
                    info!(
                        "auto-mix: deck {} -> deck {} ({:.0}s fade, {:.1}s left)",
                        active, next, window, remaining
                    );
                    self.phase = Phase::Transitioning(transition);
                    Some(AutoMixAction::Begin { next })
                } else {
                    None
                }
            }
            Phase::Transitioning(transition) => {
                if now < transition.next_frame_at {
                    return None;
                }
                transition.next_frame_at = now + FADE_TICK_SECS;

                let progress = ((now - transition.started_at) / transition.duration).clamp(0.0, 1.0);
                let span = transition.end_value - transition.start_value;
                let value = transition.start_value + span * progress as f32;
                if progress >= 1.0 {
                    let stop = transition.from;
                    let to = transition.to;
                    self.phase = Phase::Monitoring {
                        next_poll_at: now + MONITOR_PERIOD_SECS,
                    };
                    info!("auto-mix complete, deck {} is live", to);
                    Some(AutoMixAction::Complete { stop, value })
                } else {
                    Some(AutoMixAction::Fade { value })
                }
            }
        }
    }

    /// Drop an in-flight transition whose kickoff failed
    ///
    /// Returns the machine to `Monitoring` with the target deck held: no
    /// new trigger offers it until it starts reloading or the crossfade
    /// window lapses, so a dead player fails one kickoff per window, not
    /// one per poll. Any other phase is left as is.
    pub fn abort(&mut self, now: f64) {
        if let Phase::Transitioning(transition) = self.phase {
            warn!("auto-mix transition to deck {} aborted", transition.to);
            self.phase = Phase::Monitoring {
                next_poll_at: now + MONITOR_PERIOD_SECS,
            };
            self.held = Some(transition.to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckState;

    fn playing_deck(duration: f64, started_at: f64) -> DeckState {
        DeckState {
            playing: true,
            started_at: Some(started_at),
            duration,
            track_name: Some("current.wav".into()),
            ..Default::default()
        }
    }

    fn loaded_deck() -> DeckState {
        DeckState {
            track_name: Some("next.wav".into()),
            duration: 180.0,
            ..Default::default()
        }
    }

    fn armed_mixer() -> MixerState {
        let mut mixer = MixerState::default();
        mixer.set_auto_mix_enabled(true);
        mixer
    }

    /// A at t=0 with 100s to run, B loaded and waiting.
    fn near_end_rig() -> (MixerState, DeckPair) {
        let mut decks = DeckPair::default();
        decks[DeckId::A] = playing_deck(100.0, 0.0);
        decks[DeckId::B] = loaded_deck();
        (armed_mixer(), decks)
    }

    /// Drive the machine from idle into a triggered transition at t=93.
    fn triggered_rig() -> (AutoMix, MixerState, DeckPair) {
        let (mixer, decks) = near_end_rig();
        let mut automix = AutoMix::new();
        assert_eq!(automix.tick(80.0, &mixer, &decks), None);
        assert_eq!(
            automix.tick(93.0, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::B })
        );
        (automix, mixer, decks)
    }

    #[test]
    fn test_stays_idle_until_enabled_and_playing() {
        let mut automix = AutoMix::new();
        let mut decks = DeckPair::default();
        let mut mixer = MixerState::default();

        assert_eq!(automix.tick(0.0, &mixer, &decks), None);
        assert_eq!(automix.status(), AutoMixStatus::Idle);

        mixer.set_auto_mix_enabled(true);
        assert_eq!(automix.tick(1.0, &mixer, &decks), None);
        assert_eq!(automix.status(), AutoMixStatus::Idle, "nothing playing yet");

        decks[DeckId::A] = playing_deck(100.0, 1.0);
        automix.tick(2.0, &mixer, &decks);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);
    }

    #[test]
    fn test_disarms_when_playback_stops() {
        let (mixer, mut decks) = near_end_rig();
        let mut automix = AutoMix::new();
        automix.tick(10.0, &mixer, &decks);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);

        decks[DeckId::A].playing = false;
        decks[DeckId::A].started_at = None;
        automix.tick(10.2, &mixer, &decks);
        assert_eq!(automix.status(), AutoMixStatus::Idle);
    }

    #[test]
    fn test_polls_are_gated_by_engine_time() {
        let (mixer, decks) = near_end_rig();
        let mut automix = AutoMix::new();
        automix.tick(93.0, &mixer, &decks);

        // Inside the poll period: monitoring but not yet polling, so the
        // in-window track cannot trigger.
        assert_eq!(automix.tick(93.05, &mixer, &decks), None);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);

        assert_eq!(
            automix.tick(93.11, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::B })
        );
    }

    #[test]
    fn test_no_trigger_while_far_from_the_end() {
        let (mixer, decks) = near_end_rig();
        let mut automix = AutoMix::new();
        automix.tick(0.0, &mixer, &decks);
        for step in 1..100 {
            let now = step as f64 * 0.1;
            assert_eq!(automix.tick(now, &mixer, &decks), None, "at {now}");
        }
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);
    }

    #[test]
    fn test_triggers_inside_the_crossfade_window() {
        // 100s track, 8s window: remaining 7s at t=93 is in range.
        let (automix, ..) = triggered_rig();
        assert_eq!(automix.status(), AutoMixStatus::Transitioning);
        assert!(automix.is_transitioning());
    }

    #[test]
    fn test_no_trigger_without_a_loaded_next_deck() {
        let (mixer, mut decks) = near_end_rig();
        decks[DeckId::B] = DeckState::default();
        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        assert_eq!(automix.tick(93.0, &mixer, &decks), None);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);
    }

    #[test]
    fn test_no_trigger_while_next_deck_is_loading() {
        let (mixer, mut decks) = near_end_rig();
        decks[DeckId::B].loading = true;
        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        assert_eq!(automix.tick(93.0, &mixer, &decks), None);
    }

    #[test]
    fn test_no_trigger_once_past_the_end() {
        // A looping deck past its effective end reports zero remaining;
        // the window is only caught on the first pass.
        let (mixer, decks) = near_end_rig();
        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        assert_eq!(automix.tick(100.5, &mixer, &decks), None);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);
    }

    #[test]
    fn test_a_takes_precedence_when_both_play() {
        let (mixer, mut decks) = near_end_rig();
        decks[DeckId::B].playing = true;
        decks[DeckId::B].started_at = Some(0.0);
        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        assert_eq!(
            automix.tick(93.0, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::B }),
            "A is the watched deck, so B is the incoming one"
        );
    }

    #[test]
    fn test_only_one_transition_at_a_time() {
        let (mut automix, mixer, decks) = triggered_rig();
        let mut begins = 0;
        let mut completes = 0;
        let mut t = 93.0;
        while t < 102.0 {
            match automix.tick(t, &mixer, &decks) {
                Some(AutoMixAction::Begin { .. }) => begins += 1,
                Some(AutoMixAction::Complete { .. }) => completes += 1,
                _ => {}
            }
            t += 0.01;
        }
        assert_eq!(begins, 0, "no second trigger while fading");
        assert_eq!(completes, 1);
    }

    #[test]
    fn test_fade_is_monotonic_and_bounded() {
        let (mut automix, mixer, decks) = triggered_rig();
        let mut last = mixer.crossfade();
        let mut t = 93.02;
        while t < 101.0 {
            if let Some(AutoMixAction::Fade { value }) = automix.tick(t, &mixer, &decks) {
                assert!((0.0..=1.0).contains(&value), "value {value} out of range");
                assert!(value >= last, "fade went backwards: {value} < {last}");
                last = value;
            }
            t += 0.02;
        }
        assert!(last > 0.9, "fade should be nearly done, got {last}");
    }

    #[test]
    fn test_uneven_ticks_keep_the_fade_bounded() {
        // Frames driven late and at a ragged cadence must still land in
        // [0, 1] and move only toward the endpoint.
        let (mut automix, mixer, decks) = triggered_rig();
        let mut last = mixer.crossfade();
        for now in [93.03, 93.4, 95.0, 95.009, 98.7, 101.3, 104.0] {
            match automix.tick(now, &mixer, &decks) {
                Some(AutoMixAction::Fade { value })
                | Some(AutoMixAction::Complete { value, .. }) => {
                    assert!((0.0..=1.0).contains(&value), "value {value} at {now}");
                    assert!(value >= last, "{value} < {last} at {now}");
                    last = value;
                }
                _ => {}
            }
        }
        assert_eq!(last, 1.0, "late final tick clamps to the endpoint");
    }

    #[test]
    fn test_fade_starts_from_the_current_crossfade() {
        let (mut mixer, decks) = near_end_rig();
        mixer.set_crossfade(0.25);
        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        automix.tick(93.0, &mixer, &decks);

        let action = automix.tick(93.02, &mixer, &decks);
        let Some(AutoMixAction::Fade { value }) = action else {
            panic!("expected a fade frame, got {action:?}");
        };
        assert!(value >= 0.25 && value < 0.3, "first frame near 0.25: {value}");
    }

    #[test]
    fn test_completion_stops_outgoing_deck_and_resumes_monitoring() {
        let (mut automix, mixer, decks) = triggered_rig();
        let action = automix.tick(101.5, &mixer, &decks);
        assert_eq!(
            action,
            Some(AutoMixAction::Complete {
                stop: DeckId::A,
                value: 1.0
            })
        );
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);
    }

    #[test]
    fn test_b_active_fades_toward_deck_a() {
        let mut decks = DeckPair::default();
        decks[DeckId::B] = playing_deck(100.0, 0.0);
        decks[DeckId::A] = loaded_deck();
        let mut mixer = armed_mixer();
        mixer.set_crossfade(1.0);

        let mut automix = AutoMix::new();
        automix.tick(80.0, &mixer, &decks);
        assert_eq!(
            automix.tick(93.0, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::A })
        );

        let action = automix.tick(97.0, &mixer, &decks);
        let Some(AutoMixAction::Fade { value }) = action else {
            panic!("expected a fade frame, got {action:?}");
        };
        assert!(value < 1.0, "fade must move toward 0.0, got {value}");

        let action = automix.tick(101.5, &mixer, &decks);
        assert_eq!(
            action,
            Some(AutoMixAction::Complete {
                stop: DeckId::B,
                value: 0.0
            })
        );
    }

    #[test]
    fn test_disable_mid_fade_still_completes() {
        let (mut automix, mut mixer, decks) = triggered_rig();
        mixer.set_auto_mix_enabled(false);

        let mut completed = false;
        let mut t = 93.02;
        while t < 102.0 {
            if let Some(AutoMixAction::Complete { .. }) = automix.tick(t, &mixer, &decks) {
                completed = true;
                break;
            }
            t += 0.02;
        }
        assert!(completed, "in-flight fade must run to its end");

        // The next monitoring tick sees the disable and stands down.
        automix.tick(t + 0.01, &mixer, &decks);
        assert_eq!(automix.status(), AutoMixStatus::Idle);
    }

    #[test]
    fn test_abort_holds_the_failed_deck_until_reload() {
        let (mut automix, mixer, mut decks) = triggered_rig();
        automix.abort(93.0);
        assert_eq!(automix.status(), AutoMixStatus::Monitoring);

        // Trigger conditions still hold, but the failed deck is not
        // offered again on the following polls.
        assert_eq!(automix.tick(93.2, &mixer, &decks), None);
        assert_eq!(automix.tick(94.0, &mixer, &decks), None);

        // A reload lifts the hold; the trigger fires once it completes.
        decks[DeckId::B].loading = true;
        assert_eq!(automix.tick(94.2, &mixer, &decks), None);
        decks[DeckId::B].loading = false;
        assert_eq!(
            automix.tick(94.4, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::B })
        );
    }

    #[test]
    fn test_abort_hold_clears_when_the_window_lapses() {
        let (mut automix, mixer, mut decks) = triggered_rig();
        automix.abort(93.0);

        // No retry for the rest of the window, and none once the track
        // is past its effective end.
        for now in [93.5, 95.0, 97.0, 99.5, 100.5, 101.0] {
            assert_eq!(automix.tick(now, &mixer, &decks), None, "at {now}");
        }

        // A restarted deck opens a fresh window; the hold is gone.
        decks[DeckId::A].started_at = Some(101.0);
        assert_eq!(
            automix.tick(194.5, &mixer, &decks),
            Some(AutoMixAction::Begin { next: DeckId::B })
        );
    }

    #[test]
    fn test_abort_outside_a_transition_is_a_no_op() {
        let mut automix = AutoMix::new();
        automix.abort(5.0);
        assert_eq!(automix.status(), AutoMixStatus::Idle);
    }
}
