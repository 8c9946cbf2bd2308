//! Integration tests for the control layer.
//!
//! Most tests drive a [`SynthController`] against a recording host that logs
//! every call the graph manager makes, so the exact automation issued can be
//! checked. The last group renders real audio through the offline host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sintetico_control::{
    AudioGraphManager, ErrorKind, Knob, Rect, SynthController, SynthEvent, SynthPhase,
};
use sintetico_core::{Waveform, midi_to_freq};
use sintetico_config::SynthConfig;
use sintetico_io::{
    AudioContext, AudioHost, ContextState, Destination, NodeId, NodeKind, OfflineHost, ParamKind,
};

// ---------------------------------------------------------------------------
// Recording host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    CreateContext,
    CreateNode(NodeKind),
    Connect(NodeId, Destination),
    Disconnect(NodeId),
    SetWaveform(Waveform),
    Start(NodeId),
    Stop(NodeId),
    SetValue(NodeId, ParamKind, f32),
    SetTarget(NodeId, ParamKind, f32, f32),
    LinearRamp(NodeId, ParamKind, f32),
    Cancel(NodeId, ParamKind),
    Resume,
    Suspend,
    Close,
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    refuse: Arc<AtomicBool>,
}

impl Recorder {
    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn clear(&self) {
        self.calls.lock().clear();
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

struct RecordingHost {
    log: Recorder,
    start_suspended: bool,
}

impl AudioHost for RecordingHost {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_context(&self) -> sintetico_io::Result<Box<dyn AudioContext>> {
        if self.log.refuse.load(Ordering::SeqCst) {
            return Err(sintetico_io::Error::ContextUnavailable(
                "refused by test".into(),
            ));
        }
        self.log.push(Call::CreateContext);
        Ok(Box::new(RecordingContext {
            log: self.log.clone(),
            state: if self.start_suspended {
                ContextState::Suspended
            } else {
                ContextState::Running
            },
            next_node: 0,
        }))
    }
}

struct RecordingContext {
    log: Recorder,
    state: ContextState,
    next_node: u32,
}

impl RecordingContext {
    fn record(&mut self, call: Call) -> sintetico_io::Result<()> {
        if self.state == ContextState::Closed {
            return Err(sintetico_io::Error::ContextClosed);
        }
        self.log.push(call);
        Ok(())
    }
}

impl AudioContext for RecordingContext {
    fn sample_rate(&self) -> f32 {
        48000.0
    }

    fn current_time(&self) -> f64 {
        0.25
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> sintetico_io::Result<()> {
        self.record(Call::Resume)?;
        self.state = ContextState::Running;
        Ok(())
    }

    fn suspend(&mut self) -> sintetico_io::Result<()> {
        self.record(Call::Suspend)?;
        self.state = ContextState::Suspended;
        Ok(())
    }

    fn close(&mut self) -> sintetico_io::Result<()> {
        self.record(Call::Close)?;
        self.state = ContextState::Closed;
        Ok(())
    }

    fn create_node(&mut self, kind: NodeKind) -> sintetico_io::Result<NodeId> {
        self.record(Call::CreateNode(kind))?;
        let id = NodeId::from_raw(self.next_node);
        self.next_node += 1;
        Ok(id)
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> sintetico_io::Result<()> {
        self.record(Call::Connect(from, to))
    }

    fn disconnect(&mut self, node: NodeId) -> sintetico_io::Result<()> {
        self.record(Call::Disconnect(node))
    }

    fn set_waveform(&mut self, _node: NodeId, waveform: Waveform) -> sintetico_io::Result<()> {
        self.record(Call::SetWaveform(waveform))
    }

    fn start(&mut self, node: NodeId, _when: f64) -> sintetico_io::Result<()> {
        self.record(Call::Start(node))
    }

    fn stop(&mut self, node: NodeId, _when: f64) -> sintetico_io::Result<()> {
        self.record(Call::Stop(node))
    }

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        _time: f64,
    ) -> sintetico_io::Result<()> {
        self.record(Call::SetValue(node, param, value))
    }

    fn set_target_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        target: f32,
        _start_time: f64,
        time_constant: f32,
    ) -> sintetico_io::Result<()> {
        self.record(Call::SetTarget(node, param, target, time_constant))
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        _end_time: f64,
    ) -> sintetico_io::Result<()> {
        self.record(Call::LinearRamp(node, param, value))
    }

    fn cancel_scheduled_values(
        &mut self,
        node: NodeId,
        param: ParamKind,
        _from_time: f64,
    ) -> sintetico_io::Result<()> {
        self.record(Call::Cancel(node, param))
    }
}

fn recording(start_suspended: bool) -> (SynthController, Recorder) {
    let log = Recorder::default();
    let host = RecordingHost {
        log: log.clone(),
        start_suspended,
    };
    (SynthController::new(Box::new(host)), log)
}

// The recording context hands out IDs in creation order.
const OSC: NodeId = NodeId::from_raw(0);
const FILTER: NodeId = NodeId::from_raw(1);
const GAIN: NodeId = NodeId::from_raw(2);

fn is_gain_set_value(call: &Call) -> bool {
    matches!(call, Call::SetValue(node, ParamKind::Gain, _) if *node == GAIN)
}

// ---------------------------------------------------------------------------
// Graph construction
// ---------------------------------------------------------------------------

#[test]
fn first_gesture_builds_the_chain_in_order() {
    let (mut synth, log) = recording(false);
    assert!(log.calls().is_empty());

    synth.play();

    let calls = log.calls();
    assert_eq!(calls[0], Call::CreateContext);
    assert_eq!(
        &calls[1..7],
        &[
            Call::CreateNode(NodeKind::Oscillator),
            Call::CreateNode(NodeKind::LowpassFilter),
            Call::CreateNode(NodeKind::Gain),
            Call::Connect(OSC, Destination::Node(FILTER)),
            Call::Connect(FILTER, Destination::Node(GAIN)),
            Call::Connect(GAIN, Destination::Output),
        ]
    );
    assert!(calls.contains(&Call::SetWaveform(Waveform::Sawtooth)));
    assert!(calls.contains(&Call::SetValue(OSC, ParamKind::Frequency, 440.0)));
    assert!(calls.contains(&Call::SetValue(FILTER, ParamKind::Frequency, 2000.0)));
    assert!(calls.contains(&Call::SetValue(GAIN, ParamKind::Gain, 0.0)));
    assert_eq!(log.count(|c| matches!(c, Call::Start(_))), 1);
}

#[test]
fn ensure_graph_twice_creates_nothing_new() {
    let log = Recorder::default();
    let mut manager = AudioGraphManager::new(Box::new(RecordingHost {
        log: log.clone(),
        start_suspended: false,
    }));

    let first = manager.ensure_graph(440.0, 2000.0, Waveform::Sine).unwrap();
    let calls_after_first = log.calls().len();
    let second = manager
        .ensure_graph(100.0, 100.0, Waveform::Square)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(log.calls().len(), calls_after_first);
    assert_eq!(log.count(|c| matches!(c, Call::CreateNode(_))), 3);
}

#[test]
fn values_chosen_before_the_graph_become_initial_values() {
    let (mut synth, log) = recording(false);
    synth.set_frequency(880.0);
    synth.set_filter_cutoff(500.0);
    synth.select_waveform(Waveform::Triangle);
    assert!(log.calls().is_empty());

    synth.play();
    let calls = log.calls();
    assert!(calls.contains(&Call::SetValue(OSC, ParamKind::Frequency, 880.0)));
    assert!(calls.contains(&Call::SetValue(FILTER, ParamKind::Frequency, 500.0)));
    assert!(calls.contains(&Call::SetWaveform(Waveform::Triangle)));
}

// ---------------------------------------------------------------------------
// Click-free start and stop
// ---------------------------------------------------------------------------

#[test]
fn play_fades_in_and_never_steps_the_gain() {
    let (mut synth, log) = recording(false);
    synth.play();

    assert!(log.calls().contains(&Call::SetTarget(GAIN, ParamKind::Gain, 0.5, 0.015)));
    // The only direct gain write is the silent initial value.
    assert_eq!(log.count(is_gain_set_value), 1);
    assert!(log.calls().contains(&Call::SetValue(GAIN, ParamKind::Gain, 0.0)));

    log.clear();
    synth.stop();
    assert_eq!(
        log.calls(),
        vec![
            Call::Cancel(GAIN, ParamKind::Gain),
            Call::SetTarget(GAIN, ParamKind::Gain, 0.0, 0.015),
        ]
    );

    log.clear();
    synth.toggle();
    synth.toggle();
    assert_eq!(log.count(is_gain_set_value), 0);
    assert_eq!(log.count(|c| matches!(c, Call::SetTarget(..))), 2);
}

#[test]
fn play_resumes_a_suspended_context_first() {
    let (mut synth, log) = recording(true);
    synth.play();

    let calls = log.calls();
    let resume = calls.iter().position(|c| *c == Call::Resume).unwrap();
    let fade = calls
        .iter()
        .position(|c| matches!(c, Call::SetTarget(_, ParamKind::Gain, t, _) if *t == 0.5))
        .unwrap();
    assert!(resume < fade);
    assert_eq!(synth.context_state(), Some(ContextState::Running));

    // Already running: no second resume.
    synth.stop();
    synth.play();
    assert_eq!(log.count(|c| *c == Call::Resume), 1);
}

#[test]
fn oscillator_is_never_restarted() {
    let (mut synth, log) = recording(false);
    for _ in 0..3 {
        synth.play();
        synth.stop();
    }
    assert_eq!(log.count(|c| matches!(c, Call::Start(_))), 1);
    assert_eq!(log.count(|c| matches!(c, Call::Stop(_))), 0);
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[test]
fn live_parameter_changes_are_immediate_writes() {
    let (mut synth, log) = recording(false);
    synth.play();
    log.clear();

    synth.set_frequency(300.0);
    synth.set_filter_cutoff(25000.0);
    synth.select_waveform(Waveform::Square);

    assert_eq!(
        log.calls(),
        vec![
            Call::Cancel(OSC, ParamKind::Frequency),
            Call::SetValue(OSC, ParamKind::Frequency, 300.0),
            Call::Cancel(FILTER, ParamKind::Frequency),
            Call::SetValue(FILTER, ParamKind::Frequency, 20000.0),
            Call::SetWaveform(Waveform::Square),
        ]
    );
    assert_eq!(synth.state().filter_cutoff_hz(), 20000.0);
}

#[test]
fn frequency_knob_angle_tracks_the_value() {
    let (mut synth, _) = recording(false);
    for (hz, angle) in [(20.0, -135.0), (2000.0, 135.0), (1010.0, 0.0)] {
        synth.dispatch(SynthEvent::SetFrequency(hz));
        assert!((synth.knob_angle(Knob::Frequency) - angle).abs() < 1e-3);
    }
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

#[test]
fn key_press_plays_its_pitch_and_release_stops() {
    let (mut synth, log) = recording(false);

    synth.dispatch(SynthEvent::KeyDown('k'));
    let pitch = midi_to_freq(72);
    assert!(synth.state().is_playing());
    assert!((synth.state().frequency_hz() - pitch).abs() < 1e-3);
    assert!(log.calls().contains(&Call::SetValue(OSC, ParamKind::Frequency, pitch)));

    synth.dispatch(SynthEvent::KeyUp('k'));
    assert!(!synth.state().is_playing());
    assert!((synth.state().frequency_hz() - pitch).abs() < 1e-3);
}

#[test]
fn last_pressed_key_wins_the_pitch() {
    let (mut synth, log) = recording(false);
    synth.key_down('a');
    synth.key_down('g');
    assert!((synth.state().frequency_hz() - midi_to_freq(67)).abs() < 1e-3);
    assert_eq!(
        log.count(|c| matches!(c, Call::SetTarget(_, ParamKind::Gain, t, _) if *t > 0.0)),
        1
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn refused_context_is_recorded_then_cleared_on_retry() {
    let (mut synth, log) = recording(false);
    log.set_refuse(true);

    synth.dispatch(SynthEvent::KeyDown('a'));
    assert!(!synth.state().is_playing());
    let error = synth.state().last_error().unwrap();
    assert_eq!(error.kind, ErrorKind::ContextUnavailable);
    assert_eq!(synth.phase(), SynthPhase::Errored);

    // No automatic retry.
    assert!(log.calls().is_empty());

    log.set_refuse(false);
    synth.dispatch(SynthEvent::Play);
    assert!(synth.state().is_playing());
    assert!(synth.state().last_error().is_none());
    assert_eq!(synth.phase(), SynthPhase::Ready);
}

// ---------------------------------------------------------------------------
// Knob drags
// ---------------------------------------------------------------------------

#[test]
fn knob_drag_builds_graph_and_streams_values() {
    let (mut synth, log) = recording(false);
    synth.attach_knob(Knob::Cutoff, Rect::new(200.0, 0.0, 100.0, 100.0));

    synth.dispatch(SynthEvent::PointerDown {
        knob: Knob::Cutoff,
        x: 250.0,
        y: 0.0,
    });
    assert_eq!(log.count(|c| *c == Call::CreateContext), 1);
    assert_eq!(synth.listeners().active_count(), 1);
    assert!(!synth.state().is_playing());

    log.clear();
    // Leave the knob's bounds: the drag keeps tracking.
    synth.dispatch(SynthEvent::PointerMove { x: 400.0, y: 40.0 });
    synth.dispatch(SynthEvent::PointerMove { x: 400.0, y: 60.0 });
    let writes = log.count(|c| matches!(c, Call::SetValue(node, ParamKind::Frequency, _) if *node == FILTER));
    assert_eq!(writes, 2);
    let value = synth.state().filter_cutoff_hz();

    synth.dispatch(SynthEvent::PointerUp { x: 400.0, y: 60.0 });
    assert_eq!(synth.listeners().active_count(), 0);
    assert_eq!(synth.state().filter_cutoff_hz(), value);

    // Moves after release change nothing.
    synth.dispatch(SynthEvent::PointerMove { x: 250.0, y: 100.0 });
    assert_eq!(synth.state().filter_cutoff_hz(), value);
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[test]
fn teardown_without_graph_is_a_no_op() {
    let (mut synth, log) = recording(false);
    synth.teardown();
    synth.teardown();
    assert!(log.calls().is_empty());
    drop(synth);
    assert!(log.calls().is_empty());
}

#[test]
fn teardown_stops_disconnects_and_closes_once() {
    let (mut synth, log) = recording(false);
    synth.attach_knob(Knob::Frequency, Rect::new(0.0, 0.0, 100.0, 100.0));
    synth.dispatch(SynthEvent::PointerDown {
        knob: Knob::Frequency,
        x: 50.0,
        y: 0.0,
    });
    log.clear();

    synth.teardown();
    assert_eq!(
        log.calls(),
        vec![
            Call::Stop(OSC),
            Call::Disconnect(OSC),
            Call::Disconnect(FILTER),
            Call::Disconnect(GAIN),
            Call::Close,
        ]
    );
    assert_eq!(synth.listeners().active_count(), 0);
    assert!(!synth.is_dragging());

    // Later intents and the final drop never reach the closed graph.
    synth.play();
    synth.set_frequency(100.0);
    drop(synth);
    assert_eq!(log.count(|c| *c == Call::Close), 1);
    assert_eq!(log.calls().len(), 5);
}

#[test]
fn dropping_the_controller_tears_down() {
    let (mut synth, log) = recording(false);
    synth.play();
    drop(synth);
    assert_eq!(log.count(|c| *c == Call::Close), 1);
}

// ---------------------------------------------------------------------------
// Audio through the offline host
// ---------------------------------------------------------------------------

fn peak(buf: &[f32]) -> f32 {
    buf.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn offline_key_press_is_audible_and_release_fades_out() {
    let host = OfflineHost::new(48000.0);
    let mut synth = SynthController::new(Box::new(host.clone()));

    synth.key_down('a');
    let mut block = vec![0.0f32; 9600];
    host.render(&mut block, 1);
    assert!(peak(&block[4800..]) > 0.1);

    synth.key_up('a');
    host.render(&mut block, 1);
    // Ten time constants later the voice is effectively silent.
    assert!(peak(&block[7200..]) < 1e-3);
    // The first samples after release are still sounding: no hard cut.
    assert!(peak(&block[..48]) > 0.01);
}

#[test]
fn zero_fade_in_config_still_fades_in() {
    let host = OfflineHost::new(48000.0);
    let mut config = SynthConfig::default();
    config.synth.fade_time_constant = 0.0;
    let mut synth = SynthController::from_config(Box::new(host.clone()), &config);

    synth.dispatch(SynthEvent::Play);
    let mut first = [0.0f32; 24];
    host.render(&mut first, 1);
    let mut settled = vec![0.0f32; 4800];
    host.render(&mut settled, 1);

    // Half a millisecond in, a fade is still near silence; a step would not be.
    assert!(peak(&settled[2400..]) > 0.1);
    assert!(
        peak(&first) < 0.1 * peak(&settled[2400..]),
        "gain stepped: {} vs {}",
        peak(&first),
        peak(&settled[2400..])
    );
}

#[test]
fn offline_suspended_host_starts_on_first_gesture() {
    let host = OfflineHost::new(48000.0);
    host.set_start_suspended(true);
    let mut synth = SynthController::new(Box::new(host.clone()));

    synth.dispatch(SynthEvent::Play);
    assert_eq!(synth.context_state(), Some(ContextState::Running));

    let mut block = vec![0.0f32; 4800];
    host.render(&mut block, 1);
    assert!(synth.current_time().unwrap() > 0.09);
}

#[test]
fn offline_blocked_host_reports_unavailable() {
    let host = OfflineHost::new(48000.0);
    host.set_blocked(true);
    let mut synth = SynthController::new(Box::new(host.clone()));

    synth.dispatch(SynthEvent::TogglePlay);
    assert_eq!(synth.phase(), SynthPhase::Errored);
    assert!(!host.render(&mut [0.0; 64], 1));

    host.set_blocked(false);
    synth.dispatch(SynthEvent::TogglePlay);
    assert_eq!(synth.phase(), SynthPhase::Ready);
    assert!(host.render(&mut [0.0; 64], 1));
}
