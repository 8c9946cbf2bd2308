//! Shared controller setup and command handling for `play` and `render`.

use sintetico_config::SynthConfig;
use sintetico_control::{Knob, Rect, SynthController};
use sintetico_io::AudioHost;

use crate::script::Command;

/// Hit region of the frequency knob in script coordinates.
pub const FREQUENCY_KNOB: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 100.0,
    height: 100.0,
};

/// Hit region of the cutoff knob in script coordinates.
pub const CUTOFF_KNOB: Rect = Rect {
    x: 200.0,
    y: 0.0,
    width: 100.0,
    height: 100.0,
};

/// What the driver loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Let audio run for this many seconds, then continue.
    Wait(f64),
    /// Stop reading commands.
    Quit,
}

/// A controller with both knobs attached at their virtual positions.
pub fn controller(host: Box<dyn AudioHost>, config: &SynthConfig) -> SynthController {
    let mut synth = SynthController::from_config(host, config);
    synth.attach_knob(Knob::Frequency, FREQUENCY_KNOB);
    synth.attach_knob(Knob::Cutoff, CUTOFF_KNOB);
    synth
}

/// Apply one command to the controller.
pub fn apply(synth: &mut SynthController, command: Command) -> Flow {
    match command {
        Command::Event(event) => {
            synth.dispatch(event);
            Flow::Continue
        }
        Command::Wait(secs) => Flow::Wait(secs),
        Command::Status => {
            println!("{}", status_line(synth));
            Flow::Continue
        }
        Command::Quit => Flow::Quit,
    }
}

/// One-line summary of the synth state.
pub fn status_line(synth: &SynthController) -> String {
    let state = synth.state();
    let mut line = format!(
        "{:?} playing={} freq={:.1}Hz ({:+.0}°) cutoff={:.1}Hz ({:+.0}°) wave={}",
        synth.phase(),
        state.is_playing(),
        state.frequency_hz(),
        synth.knob_angle(Knob::Frequency),
        state.filter_cutoff_hz(),
        synth.knob_angle(Knob::Cutoff),
        state.waveform(),
    );
    if let Some(t) = synth.current_time() {
        line.push_str(&format!(" t={t:.3}s"));
    }
    if let Some(err) = state.last_error() {
        line.push_str(&format!(" error=\"{err}\""));
    }
    line
}
