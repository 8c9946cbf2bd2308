//! Lifecycle of the oscillator → lowpass → gain → output chain.
//!
//! [`AudioGraphManager`] owns at most one live graph: a processing context
//! plus the three node IDs, created together and released together. Callers
//! hold a [`GraphHandle`], a copyable token that is checked against the live
//! graph on every operation, so a handle that outlived
//! [`teardown`](AudioGraphManager::teardown) is rejected with
//! [`AudioError::HandleClosed`] instead of reaching a closed context.
//!
//! Every parameter change is a schedule at the context's current time;
//! nothing here waits on the audio thread. Gain is only ever moved with an
//! exponential approach once the graph is live, which is what keeps start and
//! stop free of clicks.

use sintetico_core::Waveform;
use sintetico_io::{AudioContext, AudioHost, ContextState, Destination, NodeId, NodeKind, ParamKind};

use crate::error::AudioError;

/// Default fade time constant in seconds.
pub const DEFAULT_FADE_TIME_CONSTANT: f32 = 0.015;

/// Token for the live graph of an [`AudioGraphManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphHandle {
    generation: u64,
}

/// The context and nodes of one graph session.
struct LiveGraph {
    generation: u64,
    context: Box<dyn AudioContext>,
    oscillator: NodeId,
    filter: NodeId,
    gain: NodeId,
}

impl LiveGraph {
    /// Replace any pending automation on `param` with an immediate value.
    fn write(&mut self, node: NodeId, param: ParamKind, value: f32) -> Result<(), AudioError> {
        let now = self.context.current_time();
        self.context.cancel_scheduled_values(node, param, now)?;
        self.context.set_value_at_time(node, param, value, now)?;
        tracing::trace!(%node, ?param, value, now, "param write");
        Ok(())
    }
}

/// Owns the synth's signal chain and its processing context.
///
/// One graph per manager: after [`teardown`](Self::teardown) the manager is
/// finished and [`ensure_graph`](Self::ensure_graph) fails with
/// [`AudioError::HandleClosed`].
pub struct AudioGraphManager {
    host: Box<dyn AudioHost>,
    graph: Option<LiveGraph>,
    generation: u64,
    torn_down: bool,
    filter_q: f32,
}

impl std::fmt::Debug for AudioGraphManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraphManager")
            .field("host", &self.host.name())
            .field("live", &self.graph.is_some())
            .field("generation", &self.generation)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl AudioGraphManager {
    /// Create a manager that will build its graph on `host`.
    pub fn new(host: Box<dyn AudioHost>) -> Self {
        Self {
            host,
            graph: None,
            generation: 0,
            torn_down: false,
            filter_q: 1.0,
        }
    }

    /// Resonance applied to the filter when the graph is built.
    pub fn with_filter_q(mut self, q: f32) -> Self {
        self.filter_q = q;
        self
    }

    /// Name of the underlying host.
    pub fn host_name(&self) -> &str {
        self.host.name()
    }

    /// Handle of the live graph, if there is one.
    pub fn handle(&self) -> Option<GraphHandle> {
        self.graph.as_ref().map(|g| GraphHandle {
            generation: g.generation,
        })
    }

    /// Whether a graph exists.
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Build the chain if it does not exist yet; return its handle.
    ///
    /// Idempotent: with a live graph this returns the existing handle and
    /// touches nothing. Otherwise it creates a context, the three nodes, wires
    /// `oscillator → filter → gain → output`, applies the initial values with
    /// the gain at silence, and starts the oscillator. The oscillator then runs
    /// for the life of the graph.
    pub fn ensure_graph(
        &mut self,
        initial_frequency: f32,
        initial_cutoff: f32,
        waveform: Waveform,
    ) -> Result<GraphHandle, AudioError> {
        if self.torn_down {
            return Err(AudioError::HandleClosed);
        }
        if let Some(handle) = self.handle() {
            return Ok(handle);
        }

        let mut context = self.host.create_context().map_err(|e| {
            tracing::warn!(host = self.host.name(), error = %e, "context creation failed");
            AudioError::from(e)
        })?;

        match build_chain(
            context.as_mut(),
            initial_frequency,
            initial_cutoff,
            self.filter_q,
            waveform,
        ) {
            Ok((oscillator, filter, gain)) => {
                self.generation += 1;
                tracing::info!(
                    host = self.host.name(),
                    sample_rate = context.sample_rate(),
                    state = %context.state(),
                    generation = self.generation,
                    "audio graph created"
                );
                self.graph = Some(LiveGraph {
                    generation: self.generation,
                    context,
                    oscillator,
                    filter,
                    gain,
                });
                Ok(GraphHandle {
                    generation: self.generation,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio graph construction failed");
                if let Err(close_err) = context.close() {
                    tracing::debug!(error = %close_err, "closing half-built context failed");
                }
                Err(e)
            }
        }
    }

    fn live(&mut self, handle: GraphHandle) -> Result<&mut LiveGraph, AudioError> {
        match self.graph.as_mut() {
            Some(graph) if graph.generation == handle.generation => Ok(graph),
            _ => Err(AudioError::HandleClosed),
        }
    }

    /// Set the oscillator frequency now.
    pub fn set_frequency(&mut self, handle: GraphHandle, hz: f32) -> Result<(), AudioError> {
        let graph = self.live(handle)?;
        let node = graph.oscillator;
        graph.write(node, ParamKind::Frequency, hz)
    }

    /// Set the filter cutoff now.
    pub fn set_filter_cutoff(&mut self, handle: GraphHandle, hz: f32) -> Result<(), AudioError> {
        let graph = self.live(handle)?;
        let node = graph.filter;
        graph.write(node, ParamKind::Frequency, hz)
    }

    /// Change the oscillator waveform now.
    pub fn set_waveform(
        &mut self,
        handle: GraphHandle,
        waveform: Waveform,
    ) -> Result<(), AudioError> {
        let graph = self.live(handle)?;
        graph.context.set_waveform(graph.oscillator, waveform)?;
        tracing::trace!(%waveform, "waveform write");
        Ok(())
    }

    /// Approach `target_gain` exponentially with the given time constant,
    /// starting now. Pending gain automation is replaced.
    pub fn fade_to(
        &mut self,
        handle: GraphHandle,
        target_gain: f32,
        time_constant_secs: f32,
    ) -> Result<(), AudioError> {
        let graph = self.live(handle)?;
        let now = graph.context.current_time();
        graph
            .context
            .cancel_scheduled_values(graph.gain, ParamKind::Gain, now)?;
        graph.context.set_target_at_time(
            graph.gain,
            ParamKind::Gain,
            target_gain,
            now,
            time_constant_secs,
        )?;
        tracing::trace!(target_gain, time_constant_secs, now, "gain fade");
        Ok(())
    }

    /// Resume the context if the host left it suspended. Returns whether a
    /// resume happened.
    pub fn resume_if_suspended(&mut self, handle: GraphHandle) -> Result<bool, AudioError> {
        let graph = self.live(handle)?;
        if graph.context.state() == ContextState::Suspended {
            graph.context.resume()?;
            tracing::info!("audio context resumed by user gesture");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// State of the live context.
    pub fn context_state(&self, handle: GraphHandle) -> Result<ContextState, AudioError> {
        match &self.graph {
            Some(graph) if graph.generation == handle.generation => Ok(graph.context.state()),
            _ => Err(AudioError::HandleClosed),
        }
    }

    /// Clock of the live context, in seconds.
    pub fn current_time(&self, handle: GraphHandle) -> Result<f64, AudioError> {
        match &self.graph {
            Some(graph) if graph.generation == handle.generation => {
                Ok(graph.context.current_time())
            }
            _ => Err(AudioError::HandleClosed),
        }
    }

    /// Stop the oscillator, disconnect the chain, and close the context.
    ///
    /// The handle (and the manager) cannot be used afterwards. Every release
    /// step is attempted even if an earlier one fails.
    pub fn teardown(&mut self, handle: GraphHandle) -> Result<(), AudioError> {
        self.live(handle)?;
        self.release();
        Ok(())
    }

    /// Tear down whatever exists. Safe when no graph was ever created, and
    /// safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.torn_down = true;
        let Some(mut graph) = self.graph.take() else {
            return;
        };
        let ctx = graph.context.as_mut();
        let now = ctx.current_time();
        let steps: [(&str, Result<(), sintetico_io::Error>); 5] = [
            ("stop oscillator", ctx.stop(graph.oscillator, now)),
            ("disconnect oscillator", ctx.disconnect(graph.oscillator)),
            ("disconnect filter", ctx.disconnect(graph.filter)),
            ("disconnect gain", ctx.disconnect(graph.gain)),
            ("close context", ctx.close()),
        ];
        for (step, result) in steps {
            if let Err(e) = result {
                tracing::warn!(step, error = %e, "teardown step failed");
            }
        }
        tracing::info!(generation = graph.generation, "audio graph torn down");
    }
}

fn build_chain(
    ctx: &mut dyn AudioContext,
    frequency: f32,
    cutoff: f32,
    q: f32,
    waveform: Waveform,
) -> Result<(NodeId, NodeId, NodeId), AudioError> {
    let oscillator = ctx.create_node(NodeKind::Oscillator)?;
    let filter = ctx.create_node(NodeKind::LowpassFilter)?;
    let gain = ctx.create_node(NodeKind::Gain)?;

    ctx.connect(oscillator, Destination::Node(filter))?;
    ctx.connect(filter, Destination::Node(gain))?;
    ctx.connect(gain, Destination::Output)?;

    let now = ctx.current_time();
    ctx.set_waveform(oscillator, waveform)?;
    ctx.set_value_at_time(oscillator, ParamKind::Frequency, frequency, now)?;
    ctx.set_value_at_time(filter, ParamKind::Frequency, cutoff, now)?;
    ctx.set_value_at_time(filter, ParamKind::Q, q, now)?;
    ctx.set_value_at_time(gain, ParamKind::Gain, 0.0, now)?;
    ctx.start(oscillator, now)?;
    Ok((oscillator, filter, gain))
}

impl Drop for AudioGraphManager {
    fn drop(&mut self) {
        if self.graph.is_some() {
            self.release();
        }
    }
}
