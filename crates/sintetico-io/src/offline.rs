//! Deterministic host for tests and file rendering.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::backend::{AudioContext, AudioHost};
use crate::context::SoftwareContext;
use crate::render::GraphRenderer;
use crate::{Error, Result};

#[derive(Debug)]
struct OfflineInner {
    sample_rate: f32,
    blocked: AtomicBool,
    start_suspended: AtomicBool,
    contexts_created: AtomicUsize,
    renderer: Mutex<Option<GraphRenderer>>,
}

/// An [`AudioHost`] with no device behind it.
///
/// Contexts render only when the owner pulls audio through
/// [`render`](Self::render) or a renderer taken with
/// [`take_renderer`](Self::take_renderer), so time advances exactly as far as
/// the caller asks. Clones share the same state: hand one clone to the
/// control layer and keep another to drive rendering and flip policy.
///
/// ```rust
/// use sintetico_io::{AudioHost, Error, OfflineHost};
///
/// let host = OfflineHost::new(48000.0);
/// host.set_blocked(true);
/// assert!(matches!(host.create_context(), Err(Error::ContextUnavailable(_))));
///
/// host.set_blocked(false);
/// assert!(host.create_context().is_ok());
/// assert_eq!(host.contexts_created(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct OfflineHost {
    inner: Arc<OfflineInner>,
}

impl OfflineHost {
    /// Create a host whose contexts start running at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: Arc::new(OfflineInner {
                sample_rate,
                blocked: AtomicBool::new(false),
                start_suspended: AtomicBool::new(false),
                contexts_created: AtomicUsize::new(0),
                renderer: Mutex::new(None),
            }),
        }
    }

    /// Refuse (`true`) or allow (`false`) context creation, simulating an
    /// autoplay policy or a missing device.
    pub fn set_blocked(&self, blocked: bool) {
        self.inner.blocked.store(blocked, Ordering::Release);
    }

    /// Make newly created contexts start suspended until resumed.
    pub fn set_start_suspended(&self, suspended: bool) {
        self.inner.start_suspended.store(suspended, Ordering::Release);
    }

    /// Sample rate of every context this host creates.
    pub fn sample_rate(&self) -> f32 {
        self.inner.sample_rate
    }

    /// Number of contexts successfully created so far.
    pub fn contexts_created(&self) -> usize {
        self.inner.contexts_created.load(Ordering::Acquire)
    }

    /// Take ownership of the most recent context's renderer.
    pub fn take_renderer(&self) -> Option<GraphRenderer> {
        self.inner.renderer.lock().take()
    }

    /// Render into `out` with the most recent context's renderer.
    ///
    /// Returns `false` (and writes silence) if no context exists or its
    /// renderer was taken.
    pub fn render(&self, out: &mut [f32], channels: usize) -> bool {
        match self.inner.renderer.lock().as_mut() {
            Some(renderer) => {
                renderer.render(out, channels);
                true
            }
            None => {
                out.fill(0.0);
                false
            }
        }
    }
}

impl AudioHost for OfflineHost {
    fn name(&self) -> &str {
        "offline"
    }

    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        if self.inner.blocked.load(Ordering::Acquire) {
            tracing::warn!("offline host refused context creation");
            return Err(Error::ContextUnavailable(
                "audio blocked by host policy".to_string(),
            ));
        }
        let suspended = self.inner.start_suspended.load(Ordering::Acquire);
        let (context, renderer) = SoftwareContext::new(self.inner.sample_rate, suspended);
        *self.inner.renderer.lock() = Some(renderer);
        self.inner.contexts_created.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(context))
    }
}
