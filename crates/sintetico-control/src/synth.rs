//! Top-level synth orchestration.
//!
//! [`SynthController`] is the single owner of [`SynthState`], the two knobs,
//! and the [`AudioGraphManager`]. Every user intent enters through
//! [`SynthController::dispatch`] (or the equivalent named method), updates the
//! canonical state first, and only then reaches the audio graph.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──(knob drag / key / play)──▶ Ready
//!       │                                       │
//!       └──(context refused)──▶ Errored ──(next gesture succeeds)──┘
//! ```
//!
//! Until the first sound-producing gesture no audio context exists; parameter
//! changes are only remembered and become the initial values of the graph.

use sintetico_config::SynthConfig;
use sintetico_core::Waveform;
use sintetico_io::{AudioHost, ContextState};

use crate::error::AudioError;
use crate::graph::{AudioGraphManager, DEFAULT_FADE_TIME_CONSTANT, GraphHandle};
use crate::keyboard::KeyboardLayout;
use crate::rotary::{ListenerRegistry, Rect, RotaryInputController};
use crate::state::{CUTOFF_RANGE, FREQUENCY_RANGE, SynthPhase, SynthState};

/// Default gain faded to when playback starts.
pub const DEFAULT_PLAY_GAIN: f32 = 0.5;

/// The two rotary controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    /// Oscillator frequency, 20 to 2000 Hz.
    Frequency,
    /// Lowpass cutoff, 20 to 20000 Hz.
    Cutoff,
}

impl Knob {
    /// Both knobs.
    pub const ALL: [Knob; 2] = [Knob::Frequency, Knob::Cutoff];
}

impl std::fmt::Display for Knob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Knob::Frequency => f.write_str("frequency"),
            Knob::Cutoff => f.write_str("cutoff"),
        }
    }
}

/// A user intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SynthEvent {
    /// Pointer pressed on a knob's hit region.
    PointerDown {
        /// Knob under the pointer.
        knob: Knob,
        /// Client x.
        x: f32,
        /// Client y.
        y: f32,
    },
    /// Pointer moved anywhere.
    PointerMove {
        /// Client x.
        x: f32,
        /// Client y.
        y: f32,
    },
    /// Pointer released anywhere.
    PointerUp {
        /// Client x.
        x: f32,
        /// Client y.
        y: f32,
    },
    /// Computer key pressed.
    KeyDown(char),
    /// Computer key released.
    KeyUp(char),
    /// Play button.
    TogglePlay,
    /// Start playing.
    Play,
    /// Stop playing.
    Stop,
    /// Waveform selector.
    SelectWaveform(Waveform),
    /// Programmatic frequency change.
    SetFrequency(f32),
    /// Programmatic cutoff change.
    SetFilterCutoff(f32),
}

/// Owns the synth's state, controls, and audio graph.
///
/// Single-threaded: the controller is not `Send`, and the audio thread is
/// only ever reached through fire-and-forget schedules on the graph.
///
/// # Example
///
/// ```rust
/// use sintetico_control::{SynthController, SynthEvent, SynthPhase};
/// use sintetico_io::OfflineHost;
///
/// let host = OfflineHost::new(48000.0);
/// let mut synth = SynthController::new(Box::new(host.clone()));
/// assert_eq!(synth.phase(), SynthPhase::Uninitialized);
///
/// synth.dispatch(SynthEvent::KeyDown('a'));
/// assert_eq!(synth.phase(), SynthPhase::Ready);
/// assert!(synth.state().is_playing());
///
/// synth.dispatch(SynthEvent::KeyUp('a'));
/// assert!(!synth.state().is_playing());
/// ```
#[derive(Debug)]
pub struct SynthController {
    state: SynthState,
    graph: AudioGraphManager,
    frequency_knob: RotaryInputController,
    cutoff_knob: RotaryInputController,
    active_knob: Option<Knob>,
    keyboard: KeyboardLayout,
    listeners: ListenerRegistry,
    play_gain: f32,
    fade_time_constant: f32,
    torn_down: bool,
}

impl SynthController {
    /// Create a controller with default settings.
    pub fn new(host: Box<dyn AudioHost>) -> Self {
        Self::from_config(host, &SynthConfig::default())
    }

    /// Create a controller whose initial values, fades, and keyboard come
    /// from `config`.
    pub fn from_config(host: Box<dyn AudioHost>, config: &SynthConfig) -> Self {
        let mut state = SynthState::default();
        state.set_frequency_hz(config.synth.frequency_hz);
        state.set_filter_cutoff_hz(config.synth.filter_cutoff_hz);
        state.set_waveform(config.synth.waveform);

        let listeners = ListenerRegistry::new();
        let frequency_knob = RotaryInputController::new(
            FREQUENCY_RANGE.0,
            FREQUENCY_RANGE.1,
            state.frequency_hz(),
            listeners.clone(),
        );
        let cutoff_knob = RotaryInputController::new(
            CUTOFF_RANGE.0,
            CUTOFF_RANGE.1,
            state.filter_cutoff_hz(),
            listeners.clone(),
        );

        // A zero time constant would turn every fade into a gain step.
        let fade_time_constant = if config.synth.fade_time_constant.is_finite()
            && config.synth.fade_time_constant > 0.0
        {
            config.synth.fade_time_constant
        } else {
            DEFAULT_FADE_TIME_CONSTANT
        };

        Self {
            state,
            graph: AudioGraphManager::new(host).with_filter_q(config.synth.filter_q),
            frequency_knob,
            cutoff_knob,
            active_knob: None,
            keyboard: KeyboardLayout::from_config(&config.keyboard),
            listeners,
            play_gain: config.synth.play_gain,
            fade_time_constant,
            torn_down: false,
        }
    }

    /// Canonical state.
    pub fn state(&self) -> &SynthState {
        &self.state
    }

    /// Lifecycle phase, derived from graph presence and the recorded error.
    pub fn phase(&self) -> SynthPhase {
        if self.graph.has_graph() {
            SynthPhase::Ready
        } else if self.state.last_error().is_some() {
            SynthPhase::Errored
        } else {
            SynthPhase::Uninitialized
        }
    }

    /// Keyboard layout in use.
    pub fn keyboard(&self) -> &KeyboardLayout {
        &self.keyboard
    }

    /// Shared registry of global pointer listeners.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// State of the audio context, if a graph exists.
    pub fn context_state(&self) -> Option<ContextState> {
        let handle = self.graph.handle()?;
        self.graph.context_state(handle).ok()
    }

    /// Audio clock in seconds, if a graph exists.
    pub fn current_time(&self) -> Option<f64> {
        let handle = self.graph.handle()?;
        self.graph.current_time(handle).ok()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Process one user intent.
    pub fn dispatch(&mut self, event: SynthEvent) {
        tracing::trace!(?event, "dispatch");
        match event {
            SynthEvent::PointerDown { knob, x, y } => self.pointer_down(knob, x, y),
            SynthEvent::PointerMove { x, y } => self.pointer_move(x, y),
            SynthEvent::PointerUp { .. } => self.pointer_up(),
            SynthEvent::KeyDown(key) => self.key_down(key),
            SynthEvent::KeyUp(key) => self.key_up(key),
            SynthEvent::TogglePlay => self.toggle(),
            SynthEvent::Play => self.play(),
            SynthEvent::Stop => self.stop(),
            SynthEvent::SelectWaveform(waveform) => self.select_waveform(waveform),
            SynthEvent::SetFrequency(hz) => self.set_frequency(hz),
            SynthEvent::SetFilterCutoff(hz) => self.set_filter_cutoff(hz),
        }
    }

    /// Start playing: build the graph if needed, resume a suspended context,
    /// and fade in. No-op while already playing.
    pub fn play(&mut self) {
        if self.ignore_after_teardown("play") {
            return;
        }
        let Some(handle) = self.ensure_graph() else {
            return;
        };
        if !self.state.is_playing() {
            self.start_playing(handle);
        }
    }

    /// Fade out. No-op while stopped.
    pub fn stop(&mut self) {
        if self.ignore_after_teardown("stop") || !self.state.is_playing() {
            return;
        }
        self.state.set_playing(false);
        if let Some(handle) = self.graph.handle() {
            let result = self.graph.fade_to(handle, 0.0, self.fade_time_constant);
            self.check(result);
        }
        tracing::debug!("playback stopped");
    }

    /// Play button: start when stopped, stop when playing.
    pub fn toggle(&mut self) {
        if self.state.is_playing() {
            self.stop();
        } else {
            self.play();
        }
    }

    /// Play the key's pitch. Unmapped keys are ignored.
    pub fn key_down(&mut self, key: char) {
        if self.ignore_after_teardown("key down") {
            return;
        }
        let Some(hz) = self.keyboard.frequency_for(key) else {
            tracing::trace!(%key, "unmapped key");
            return;
        };
        self.set_frequency(hz);
        self.play();
    }

    /// Stop playing when a mapped key is released.
    pub fn key_up(&mut self, key: char) {
        if self.keyboard.note_for(key).is_some() {
            self.stop();
        }
    }

    /// Set the oscillator frequency (clamped into 20..=2000 Hz).
    pub fn set_frequency(&mut self, hz: f32) {
        if self.ignore_after_teardown("set frequency") {
            return;
        }
        let hz = self.state.set_frequency_hz(hz);
        self.frequency_knob.set_value(hz);
        if let Some(handle) = self.graph.handle() {
            let result = self.graph.set_frequency(handle, hz);
            self.check(result);
        }
    }

    /// Set the filter cutoff (clamped into 20..=20000 Hz).
    pub fn set_filter_cutoff(&mut self, hz: f32) {
        if self.ignore_after_teardown("set cutoff") {
            return;
        }
        let hz = self.state.set_filter_cutoff_hz(hz);
        self.cutoff_knob.set_value(hz);
        if let Some(handle) = self.graph.handle() {
            let result = self.graph.set_filter_cutoff(handle, hz);
            self.check(result);
        }
    }

    /// Change the oscillator waveform.
    pub fn select_waveform(&mut self, waveform: Waveform) {
        if self.ignore_after_teardown("select waveform") {
            return;
        }
        self.state.set_waveform(waveform);
        if let Some(handle) = self.graph.handle() {
            let result = self.graph.set_waveform(handle, waveform);
            self.check(result);
        }
    }

    /// Supply a knob's hit region.
    pub fn attach_knob(&mut self, knob: Knob, rect: Rect) {
        self.knob_mut(knob).attach(rect);
    }

    /// Remove a knob's hit region, ending its drag.
    pub fn detach_knob(&mut self, knob: Knob) {
        self.knob_mut(knob).detach();
        if self.active_knob == Some(knob) {
            self.active_knob = None;
        }
    }

    /// Indicator angle of a knob in degrees.
    pub fn knob_angle(&self, knob: Knob) -> f32 {
        self.knob(knob).angle()
    }

    /// Knob whose hit region contains `(x, y)`.
    pub fn knob_at(&self, x: f32, y: f32) -> Option<Knob> {
        Knob::ALL.into_iter().find(|k| {
            self.knob(*k)
                .geometry()
                .is_some_and(|rect| rect.contains(x, y))
        })
    }

    /// Knob currently being dragged.
    pub fn dragging(&self) -> Option<Knob> {
        self.active_knob
    }

    /// Whether any knob is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.active_knob.is_some()
    }

    /// End drags, stop the oscillator, and close the audio context.
    ///
    /// Safe when no graph was ever created, and safe to call more than once.
    /// Every later intent is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.frequency_knob.cancel();
        self.cutoff_knob.cancel();
        self.active_knob = None;
        match self.graph.handle() {
            Some(handle) => {
                let result = self.graph.teardown(handle);
                self.check(result);
            }
            None => self.graph.shutdown(),
        }
        self.state.set_playing(false);
        tracing::debug!("synth controller torn down");
    }

    fn pointer_down(&mut self, knob: Knob, x: f32, y: f32) {
        if self.ignore_after_teardown("pointer down") {
            return;
        }
        if let Some(other) = self.active_knob.filter(|k| *k != knob) {
            self.knob_mut(other).cancel();
        }
        if let Err(e) = self.knob_mut(knob).pointer_down(x, y) {
            tracing::debug!(%knob, error = %e, "pointer down ignored");
            return;
        }
        self.active_knob = Some(knob);
        self.ensure_graph();
    }

    fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(knob) = self.active_knob else {
            return;
        };
        if let Some(value) = self.knob_mut(knob).pointer_move(x, y) {
            match knob {
                Knob::Frequency => self.set_frequency(value),
                Knob::Cutoff => self.set_filter_cutoff(value),
            }
        }
    }

    fn pointer_up(&mut self) {
        if let Some(knob) = self.active_knob.take() {
            self.knob_mut(knob).pointer_up();
        }
    }

    fn start_playing(&mut self, handle: GraphHandle) {
        let result = self
            .graph
            .resume_if_suspended(handle)
            .and_then(|_| {
                self.graph
                    .fade_to(handle, self.play_gain, self.fade_time_constant)
            });
        if self.check(result) {
            self.state.set_playing(true);
            tracing::debug!(frequency_hz = self.state.frequency_hz(), "playback started");
        }
    }

    /// Build the graph from the current state if it does not exist yet.
    fn ensure_graph(&mut self) -> Option<GraphHandle> {
        let result = self.graph.ensure_graph(
            self.state.frequency_hz(),
            self.state.filter_cutoff_hz(),
            self.state.waveform(),
        );
        match result {
            Ok(handle) => {
                if self.state.last_error().is_some() {
                    tracing::info!("audio available again");
                }
                self.state.set_error(None);
                Some(handle)
            }
            Err(e) => {
                self.state.set_playing(false);
                self.check(Err(e));
                None
            }
        }
    }

    /// Record a failure in state. Returns whether `result` was `Ok`.
    fn check(&mut self, result: Result<(), AudioError>) -> bool {
        let Err(e) = result else {
            return true;
        };
        if matches!(e, AudioError::HandleClosed) {
            #[cfg(debug_assertions)]
            panic!("audio graph used after teardown");
            #[cfg(not(debug_assertions))]
            tracing::warn!("ignoring operation on a torn-down audio graph");
        } else {
            tracing::error!(error = %e, "audio operation failed");
            self.state.set_error(Some(e.info()));
        }
        false
    }

    fn ignore_after_teardown(&self, what: &str) -> bool {
        if self.torn_down {
            tracing::warn!(what, "synth controller already torn down");
        }
        self.torn_down
    }

    fn knob(&self, knob: Knob) -> &RotaryInputController {
        match knob {
            Knob::Frequency => &self.frequency_knob,
            Knob::Cutoff => &self.cutoff_knob,
        }
    }

    fn knob_mut(&mut self, knob: Knob) -> &mut RotaryInputController {
        match knob {
            Knob::Frequency => &mut self.frequency_knob,
            Knob::Cutoff => &mut self.cutoff_knob,
        }
    }
}

impl Drop for SynthController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sintetico_io::OfflineHost;

    fn synth() -> (SynthController, OfflineHost) {
        let host = OfflineHost::new(48000.0);
        (SynthController::new(Box::new(host.clone())), host)
    }

    #[test]
    fn parameters_before_first_gesture_are_remembered() {
        let (mut s, host) = synth();
        s.set_frequency(5000.0);
        s.set_filter_cutoff(300.0);
        s.select_waveform(Waveform::Square);
        assert_eq!(host.contexts_created(), 0);
        assert_eq!(s.state().frequency_hz(), 2000.0);
        assert_eq!(s.knob_angle(Knob::Frequency), 135.0);
        assert_eq!(s.phase(), SynthPhase::Uninitialized);
    }

    #[test]
    fn toggle_flips_playing_synchronously() {
        let (mut s, host) = synth();
        s.dispatch(SynthEvent::TogglePlay);
        assert!(s.state().is_playing());
        assert_eq!(s.context_state(), Some(ContextState::Running));
        s.dispatch(SynthEvent::TogglePlay);
        assert!(!s.state().is_playing());
        assert_eq!(host.contexts_created(), 1);
    }

    #[test]
    fn unmapped_key_does_nothing() {
        let (mut s, host) = synth();
        s.key_down('z');
        assert!(!s.state().is_playing());
        assert_eq!(host.contexts_created(), 0);
    }

    #[test]
    fn pointer_down_without_geometry_builds_nothing() {
        let (mut s, host) = synth();
        s.dispatch(SynthEvent::PointerDown {
            knob: Knob::Cutoff,
            x: 10.0,
            y: 10.0,
        });
        assert!(!s.is_dragging());
        assert_eq!(host.contexts_created(), 0);
        assert!(s.state().last_error().is_none());
    }

    #[test]
    fn knob_at_uses_attached_geometry() {
        let (mut s, _) = synth();
        s.attach_knob(Knob::Frequency, Rect::new(0.0, 0.0, 100.0, 100.0));
        s.attach_knob(Knob::Cutoff, Rect::new(200.0, 0.0, 100.0, 100.0));
        assert_eq!(s.knob_at(50.0, 50.0), Some(Knob::Frequency));
        assert_eq!(s.knob_at(250.0, 50.0), Some(Knob::Cutoff));
        assert_eq!(s.knob_at(150.0, 50.0), None);
    }

    #[test]
    fn events_after_teardown_are_ignored() {
        let (mut s, host) = synth();
        s.teardown();
        s.play();
        s.key_down('a');
        assert!(!s.state().is_playing());
        assert_eq!(host.contexts_created(), 0);
        s.teardown();
    }

    #[test]
    fn press_outside_the_knob_builds_nothing() {
        let (mut s, host) = synth();
        s.attach_knob(Knob::Frequency, Rect::new(0.0, 0.0, 100.0, 100.0));
        s.dispatch(SynthEvent::PointerDown {
            knob: Knob::Frequency,
            x: 500.0,
            y: 500.0,
        });
        assert!(!s.is_dragging());
        assert_eq!(s.listeners().active_count(), 0);
        assert_eq!(host.contexts_created(), 0);
        s.dispatch(SynthEvent::PointerMove { x: 50.0, y: 90.0 });
        assert_eq!(s.state().frequency_hz(), 440.0);
    }

    #[test]
    fn zero_fade_from_config_uses_the_default() {
        let mut config = SynthConfig::default();
        config.synth.fade_time_constant = 0.0;
        let s = SynthController::from_config(Box::new(OfflineHost::new(48000.0)), &config);
        assert_eq!(s.fade_time_constant, DEFAULT_FADE_TIME_CONSTANT);
    }

    #[test]
    fn from_config_clamps_initial_values() {
        let mut config = SynthConfig::default();
        config.synth.frequency_hz = 1.0;
        config.synth.filter_cutoff_hz = 99999.0;
        config.synth.waveform = Waveform::Triangle;
        let s = SynthController::from_config(Box::new(OfflineHost::new(48000.0)), &config);
        assert_eq!(s.state().frequency_hz(), 20.0);
        assert_eq!(s.state().filter_cutoff_hz(), 20000.0);
        assert_eq!(s.state().waveform(), Waveform::Triangle);
        assert_eq!(s.knob_angle(Knob::Frequency), -135.0);
    }
}
