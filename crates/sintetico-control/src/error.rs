//! Error types for the control layer.

use std::fmt;

use thiserror::Error;

/// Failures of the audio graph lifecycle.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The host refused or could not create a processing context.
    #[error("audio unavailable: {0}")]
    ContextUnavailable(String),

    /// An operation was attempted on a torn-down graph.
    #[error("audio graph has been torn down")]
    HandleClosed,

    /// Any other host failure while building or driving the graph.
    #[error("audio host error: {0}")]
    Host(#[source] sintetico_io::Error),
}

impl From<sintetico_io::Error> for AudioError {
    fn from(err: sintetico_io::Error) -> Self {
        match err {
            sintetico_io::Error::ContextUnavailable(reason) => AudioError::ContextUnavailable(reason),
            sintetico_io::Error::ContextClosed => AudioError::HandleClosed,
            other => AudioError::Host(other),
        }
    }
}

impl AudioError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AudioError::ContextUnavailable(_) => ErrorKind::ContextUnavailable,
            AudioError::HandleClosed => ErrorKind::HandleClosed,
            AudioError::Host(_) => ErrorKind::Host,
        }
    }

    /// Clonable summary for storing in state.
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Failures of a rotary control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RotaryError {
    /// The control has no measurable hit region yet.
    #[error("control geometry is not available")]
    GeometryUnavailable,
    /// The press landed outside the control's hit region, or at a
    /// non-finite position.
    #[error("pointer is outside the control")]
    OutsideHitRegion,
}

/// Category of a recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`AudioError::ContextUnavailable`].
    ContextUnavailable,
    /// See [`AudioError::HandleClosed`].
    HandleClosed,
    /// See [`AudioError::Host`].
    Host,
}

/// A user-visible error, as stored in [`SynthState`](crate::SynthState).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn host_refusal_maps_to_context_unavailable() {
        let err = AudioError::from(sintetico_io::Error::ContextUnavailable("policy".into()));
        assert_eq!(err.kind(), ErrorKind::ContextUnavailable);
        assert_eq!(err.to_string(), "audio unavailable: policy");
    }

    #[test]
    fn closed_context_maps_to_handle_closed() {
        let err = AudioError::from(sintetico_io::Error::ContextClosed);
        assert!(matches!(err, AudioError::HandleClosed));
    }

    #[test]
    fn other_host_errors_keep_their_source() {
        let err = AudioError::from(sintetico_io::Error::CycleDetected);
        assert_eq!(err.kind(), ErrorKind::Host);
        assert!(err.source().is_some());
    }

    #[test]
    fn info_carries_kind_and_message() {
        let info = AudioError::ContextUnavailable("no device".into()).info();
        assert_eq!(info.kind, ErrorKind::ContextUnavailable);
        assert_eq!(info.to_string(), "audio unavailable: no device");
    }
}
