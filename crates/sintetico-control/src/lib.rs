//! Control layer for the sintetico synth.
//!
//! This crate turns user intents into audio graph operations:
//!
//! - [`RotaryInputController`]: pointer drags on a knob become bounded values
//! - [`AudioGraphManager`]: builds, automates, and releases the
//!   oscillator → lowpass → gain chain on any [`AudioHost`](sintetico_io::AudioHost)
//! - [`SynthController`]: owns [`SynthState`] and routes [`SynthEvent`]s
//! - [`KeyboardLayout`]: computer keys to pitches
//!
//! Everything here runs on one control thread. The audio thread lives behind
//! the host and only receives scheduled parameter changes.
//!
//! # Example
//!
//! ```rust
//! use sintetico_control::{Knob, Rect, SynthController, SynthEvent};
//! use sintetico_io::OfflineHost;
//!
//! let host = OfflineHost::new(48000.0);
//! let mut synth = SynthController::new(Box::new(host.clone()));
//! synth.attach_knob(Knob::Frequency, Rect::new(0.0, 0.0, 100.0, 100.0));
//!
//! // Grab the frequency knob and turn it.
//! synth.dispatch(SynthEvent::PointerDown { knob: Knob::Frequency, x: 50.0, y: 0.0 });
//! synth.dispatch(SynthEvent::PointerMove { x: 100.0, y: 50.0 });
//! synth.dispatch(SynthEvent::PointerUp { x: 100.0, y: 50.0 });
//! assert!(synth.state().frequency_hz() > 440.0);
//!
//! synth.dispatch(SynthEvent::Play);
//! let mut block = vec![0.0f32; 2 * 4800];
//! host.render(&mut block, 2);
//! assert!(block.iter().any(|s| s.abs() > 0.01));
//! ```

pub mod error;
pub mod graph;
pub mod keyboard;
pub mod rotary;
pub mod state;
pub mod synth;

pub use error::{AudioError, ErrorInfo, ErrorKind, RotaryError};
pub use graph::{AudioGraphManager, DEFAULT_FADE_TIME_CONSTANT, GraphHandle};
pub use keyboard::KeyboardLayout;
pub use rotary::{DragSession, DragState, ListenerGuard, ListenerRegistry, Rect, RotaryInputController};
pub use state::{CUTOFF_RANGE, FREQUENCY_RANGE, SynthPhase, SynthState};
pub use synth::{DEFAULT_PLAY_GAIN, Knob, SynthController, SynthEvent};
