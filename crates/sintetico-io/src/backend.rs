//! Pluggable audio host abstraction.
//!
//! This module defines the [`AudioHost`] and [`AudioContext`] traits, which
//! decouple the synth's control layer from whatever renders the signal graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         Control layer            │
//! │ (graph manager, synth controller)│
//! └──────────────┬───────────────────┘
//!                │ uses AudioHost / AudioContext
//!                ▼
//! ┌──────────────────────────────────┐
//! │  SoftwareContext ──commands──▶   │
//! │                  GraphRenderer   │
//! └──────────────┬───────────────────┘
//!                │ driven by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │  CpalHost   │  │ OfflineHost │
//! │ (realtime)  │  │ (tests/WAV) │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Both traits are object-safe so the host can be chosen at runtime and
//! replaced by a recording mock in tests. Every context operation is a
//! fire-and-forget schedule: it validates, enqueues, and returns without
//! waiting on the audio thread.

use std::fmt;

use sintetico_core::Waveform;

use crate::Result;

/// Identifier of a node inside one [`AudioContext`].
///
/// Node IDs are assigned sequentially and never reused within a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Build a node ID from its raw index.
    ///
    /// Only meaningful for hosts that allocate their own IDs.
    #[inline]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// The node types a context can create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Periodic source with a `Frequency` parameter and a waveform.
    Oscillator,
    /// Two-pole lowpass with `Frequency` (cutoff) and `Q` parameters.
    LowpassFilter,
    /// Amplitude stage with a `Gain` parameter.
    Gain,
}

/// An automatable scalar parameter on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Oscillator pitch or filter cutoff, in Hz.
    Frequency,
    /// Filter resonance.
    Q,
    /// Linear amplitude.
    Gain,
}

/// Default value and nominal range of a node parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    /// Value before any automation.
    pub default: f32,
    /// Nominal minimum; automated values are clamped to it.
    pub min: f32,
    /// Nominal maximum; automated values are clamped to it.
    pub max: f32,
}

impl NodeKind {
    /// Parameters this node kind exposes.
    pub fn params(self) -> &'static [ParamKind] {
        match self {
            NodeKind::Oscillator => &[ParamKind::Frequency],
            NodeKind::LowpassFilter => &[ParamKind::Frequency, ParamKind::Q],
            NodeKind::Gain => &[ParamKind::Gain],
        }
    }

    /// Whether this kind can be started and stopped.
    pub fn is_source(self) -> bool {
        matches!(self, NodeKind::Oscillator)
    }

    /// Default and range of `param` at `sample_rate`, or `None` if this kind
    /// has no such parameter.
    ///
    /// | Node | Param | Default | Range |
    /// |---|---|---|---|
    /// | Oscillator | Frequency | 440 | 0..=sr/2 |
    /// | LowpassFilter | Frequency | 350 | 0..=sr/2 |
    /// | LowpassFilter | Q | 1 | 0.5..=20 |
    /// | Gain | Gain | 1 | 0..=1 |
    pub fn param_spec(self, param: ParamKind, sample_rate: f32) -> Option<ParamSpec> {
        let nyquist = sample_rate * 0.5;
        match (self, param) {
            (NodeKind::Oscillator, ParamKind::Frequency) => Some(ParamSpec {
                default: 440.0,
                min: 0.0,
                max: nyquist,
            }),
            (NodeKind::LowpassFilter, ParamKind::Frequency) => Some(ParamSpec {
                default: 350.0,
                min: 0.0,
                max: nyquist,
            }),
            (NodeKind::LowpassFilter, ParamKind::Q) => Some(ParamSpec {
                default: 1.0,
                min: 0.5,
                max: 20.0,
            }),
            (NodeKind::Gain, ParamKind::Gain) => Some(ParamSpec {
                default: 1.0,
                min: 0.0,
                max: 1.0,
            }),
            _ => None,
        }
    }
}

/// Where a node's output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Input of another node in the same context.
    Node(NodeId),
    /// The context's audio output.
    Output,
}

/// Processing state of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// Not rendering; the clock is frozen. Hosts commonly start here until a
    /// user gesture authorizes audio.
    Suspended,
    /// Rendering and advancing the clock.
    Running,
    /// Released; every further operation fails.
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        })
    }
}

/// Configuration for opening an output stream.
///
/// ## Fields
///
/// - `sample_rate`: Requested sample rate in Hz (default: 48000)
/// - `buffer_size`: Preferred buffer size in frames (default: 512)
/// - `channels`: Number of audio channels (default: 2, stereo)
/// - `device_name`: Optional device name filter (uses default device if `None`)
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Optional device name (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// A live audio processing context: nodes, their connections, and a clock.
///
/// All times are seconds on the context's own monotonic clock
/// ([`current_time`](Self::current_time)), which advances only while the
/// context is running. Any operation after [`close`](Self::close) fails with
/// [`Error::ContextClosed`](crate::Error::ContextClosed).
pub trait AudioContext: Send {
    /// Sample rate in Hz.
    fn sample_rate(&self) -> f32;

    /// Current clock position in seconds.
    fn current_time(&self) -> f64;

    /// Current processing state.
    fn state(&self) -> ContextState;

    /// Start (or continue) rendering.
    fn resume(&mut self) -> Result<()>;

    /// Pause rendering; the clock stops with it.
    fn suspend(&mut self) -> Result<()>;

    /// Release all resources. The context is unusable afterwards.
    fn close(&mut self) -> Result<()>;

    /// Allocate a node with default parameters.
    fn create_node(&mut self, kind: NodeKind) -> Result<NodeId>;

    /// Route `from`'s output to `to`. Connecting twice is a no-op.
    ///
    /// Fails with [`Error::CycleDetected`](crate::Error::CycleDetected) if
    /// `from` would end up feeding itself.
    fn connect(&mut self, from: NodeId, to: Destination) -> Result<()>;

    /// Remove every outgoing connection of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<()>;

    /// Change an oscillator's waveform immediately.
    fn set_waveform(&mut self, node: NodeId, waveform: Waveform) -> Result<()>;

    /// Start a source node at `when`. A source starts at most once.
    fn start(&mut self, node: NodeId, when: f64) -> Result<()>;

    /// Stop a started source node at `when`.
    fn stop(&mut self, node: NodeId, when: f64) -> Result<()>;

    /// Schedule a jump of `param` to `value` at `time`.
    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<()>;

    /// Schedule an exponential approach of `param` toward `target`.
    fn set_target_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        target: f32,
        start_time: f64,
        time_constant: f32,
    ) -> Result<()>;

    /// Schedule a linear ramp of `param` reaching `value` at `end_time`.
    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        end_time: f64,
    ) -> Result<()>;

    /// Drop every event on `param` scheduled at or after `from_time`.
    fn cancel_scheduled_values(
        &mut self,
        node: NodeId,
        param: ParamKind,
        from_time: f64,
    ) -> Result<()>;
}

/// Factory for [`AudioContext`]s.
///
/// Creation may fail with
/// [`Error::ContextUnavailable`](crate::Error::ContextUnavailable) when the
/// platform has no usable output or refuses audio by policy.
pub trait AudioHost: Send {
    /// Human-readable name of this host (e.g., "cpal", "offline").
    fn name(&self) -> &str;

    /// Create a new processing context.
    fn create_context(&self) -> Result<Box<dyn AudioContext>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_param_has_a_spec() {
        for kind in [NodeKind::Oscillator, NodeKind::LowpassFilter, NodeKind::Gain] {
            for &param in kind.params() {
                let spec = kind.param_spec(param, 48000.0);
                assert!(spec.is_some(), "{kind:?} lists {param:?} without a spec");
            }
        }
    }

    #[test]
    fn unsupported_params_have_no_spec() {
        assert!(NodeKind::Gain.param_spec(ParamKind::Frequency, 48000.0).is_none());
        assert!(NodeKind::Oscillator.param_spec(ParamKind::Q, 48000.0).is_none());
    }

    #[test]
    fn defaults_match_node_conventions() {
        let sr = 48000.0;
        assert_eq!(
            NodeKind::Oscillator
                .param_spec(ParamKind::Frequency, sr)
                .map(|s| s.default),
            Some(440.0)
        );
        assert_eq!(
            NodeKind::LowpassFilter
                .param_spec(ParamKind::Frequency, sr)
                .map(|s| s.default),
            Some(350.0)
        );
        assert_eq!(
            NodeKind::Gain.param_spec(ParamKind::Gain, sr).map(|s| s.default),
            Some(1.0)
        );
    }

    #[test]
    fn default_stream_config() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.channels, 2);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
