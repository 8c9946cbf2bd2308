//! Gesture script parsing.
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! key <c> down|up     press or release a computer key
//! play | stop | toggle
//! wave <name>         sine, square, sawtooth (saw), triangle
//! freq <hz>           set the oscillator frequency
//! cutoff <hz>         set the filter cutoff
//! down <knob> <x> <y> grab a knob (freq or cutoff)
//! move <x> <y>        move the pointer
//! up <x> <y>          release the pointer
//! wait <secs>         let audio run
//! status              print the synth state
//! quit                stop reading commands
//! ```

use sintetico_control::{Knob, SynthEvent};
use sintetico_core::Waveform;
use thiserror::Error;

/// A parsed script command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Forward to the controller.
    Event(SynthEvent),
    /// Let audio run for this many seconds.
    Wait(f64),
    /// Print the synth state.
    Status,
    /// Stop processing.
    Quit,
}

/// A script line that could not be parsed.
#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    /// 1-based line number.
    pub line: usize,
    /// What was wrong.
    pub message: String,
}

/// Parse a whole script. Blank and comment lines are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(cmd)) => commands.push(cmd),
            Ok(None) => {}
            Err(message) => {
                return Err(ScriptError {
                    line: idx + 1,
                    message,
                });
            }
        }
    }
    Ok(commands)
}

/// Parse one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let (verb, args) = (words[0].to_ascii_lowercase(), &words[1..]);

    let cmd = match (verb.as_str(), args) {
        ("key", [key, action]) => {
            let key = single_char(key)?;
            match action.to_ascii_lowercase().as_str() {
                "down" => Command::Event(SynthEvent::KeyDown(key)),
                "up" => Command::Event(SynthEvent::KeyUp(key)),
                other => return Err(format!("expected 'down' or 'up', got '{other}'")),
            }
        }
        ("play", []) => Command::Event(SynthEvent::Play),
        ("stop", []) => Command::Event(SynthEvent::Stop),
        ("toggle", []) => Command::Event(SynthEvent::TogglePlay),
        ("wave", [name]) => {
            let waveform: Waveform = name.parse().map_err(|e| format!("{e}"))?;
            Command::Event(SynthEvent::SelectWaveform(waveform))
        }
        ("freq", [hz]) => Command::Event(SynthEvent::SetFrequency(number(hz)?)),
        ("cutoff", [hz]) => Command::Event(SynthEvent::SetFilterCutoff(number(hz)?)),
        ("down", [knob, x, y]) => Command::Event(SynthEvent::PointerDown {
            knob: knob_name(knob)?,
            x: number(x)?,
            y: number(y)?,
        }),
        ("move", [x, y]) => Command::Event(SynthEvent::PointerMove {
            x: number(x)?,
            y: number(y)?,
        }),
        ("up", [x, y]) => Command::Event(SynthEvent::PointerUp {
            x: number(x)?,
            y: number(y)?,
        }),
        ("wait", [secs]) => {
            let secs: f64 = secs
                .parse()
                .map_err(|_| format!("invalid duration '{secs}'"))?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(format!("duration must be non-negative, got {secs}"));
            }
            Command::Wait(secs)
        }
        ("status", []) => Command::Status,
        ("quit" | "exit", []) => Command::Quit,
        (
            "key" | "play" | "stop" | "toggle" | "wave" | "freq" | "cutoff" | "down" | "move"
            | "up" | "wait" | "status" | "quit" | "exit",
            _,
        ) => return Err(format!("wrong number of arguments for '{verb}'")),
        _ => return Err(format!("unknown command '{verb}'")),
    };
    Ok(Some(cmd))
}

fn number(s: &str) -> Result<f32, String> {
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid number '{s}'"))
}

fn single_char(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("expected a single key, got '{s}'")),
    }
}

fn knob_name(s: &str) -> Result<Knob, String> {
    match s.to_ascii_lowercase().as_str() {
        "freq" | "frequency" => Ok(Knob::Frequency),
        "cutoff" | "filter" => Ok(Knob::Cutoff),
        _ => Err(format!("unknown knob '{s}' (expected freq or cutoff)")),
    }
}
