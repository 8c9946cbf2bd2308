//! Audio host layer for sintetico.
//!
//! This crate is the boundary between the synth's control code and whatever
//! actually produces sound. It provides:
//!
//! - **Host abstraction**: [`AudioHost`] creates [`AudioContext`]s; a context
//!   owns nodes (oscillator, lowpass, gain), their connections, a monotonic
//!   clock, and a `suspended`/`running`/`closed` state
//! - **Software rendering**: [`SoftwareContext`] + [`GraphRenderer`], an
//!   in-process implementation that renders the node graph sample by sample
//! - **Hosts**: [`CpalHost`] for real-time output, [`OfflineHost`] for tests
//!   and file rendering
//! - **WAV output**: [`write_wav`]
//!
//! ## Quick Start
//!
//! ```rust
//! use sintetico_io::{AudioHost, Destination, NodeKind, OfflineHost, ParamKind};
//!
//! let host = OfflineHost::new(48000.0);
//! let mut ctx = host.create_context()?;
//! let osc = ctx.create_node(NodeKind::Oscillator)?;
//! let gain = ctx.create_node(NodeKind::Gain)?;
//! ctx.connect(osc, Destination::Node(gain))?;
//! ctx.connect(gain, Destination::Output)?;
//! ctx.set_target_at_time(gain, ParamKind::Gain, 0.5, ctx.current_time(), 0.015)?;
//! ctx.start(osc, ctx.current_time())?;
//!
//! let mut renderer = host.take_renderer().expect("renderer");
//! let mut block = vec![0.0f32; 512];
//! renderer.render(&mut block, 1);
//! assert!(ctx.current_time() > 0.0);
//! # Ok::<(), sintetico_io::Error>(())
//! ```

pub mod backend;
mod context;
pub mod cpal_backend;
mod offline;
mod render;
mod wav;

pub use backend::{
    AudioContext, AudioHost, BackendStreamConfig, ContextState, Destination, NodeId, NodeKind,
    ParamKind, ParamSpec, StreamHandle,
};
pub use context::SoftwareContext;
pub use cpal_backend::{AudioDevice, CpalHost, list_output_devices};
pub use offline::OfflineHost;
pub use render::GraphRenderer;
pub use wav::{WavSpec, write_wav};

/// Error types for audio host operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host refused or failed to provide a processing context.
    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),

    /// The context was closed; no further operations are accepted.
    #[error("audio context is closed")]
    ContextClosed,

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// The node does not belong to this context.
    #[error("{0} not found")]
    NodeNotFound(NodeId),

    /// The node kind has no such parameter.
    #[error("{node} has no {param:?} parameter")]
    UnsupportedParam {
        /// Node the parameter was requested on.
        node: NodeId,
        /// Requested parameter.
        param: ParamKind,
    },

    /// The operation only applies to another node kind.
    #[error("{node} is not a {expected:?} node")]
    WrongNodeKind {
        /// Node the operation was requested on.
        node: NodeId,
        /// Kind the operation requires.
        expected: NodeKind,
    },

    /// Connecting would make a node feed itself.
    #[error("connection would create a cycle")]
    CycleDetected,

    /// A scheduling time was NaN or infinite.
    #[error("invalid scheduling time: {0}")]
    InvalidTime(f64),

    /// A parameter value was NaN or infinite.
    #[error("non-finite parameter value: {0}")]
    NonFiniteValue(f32),

    /// `start` was called twice on the same source node.
    #[error("{0} was already started")]
    AlreadyStarted(NodeId),

    /// `stop` was called on a source node that was never started.
    #[error("{0} was never started")]
    NotStarted(NodeId),

    /// WAV file write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio host operations.
pub type Result<T> = std::result::Result<T, Error>;
