//! Control-side half of the in-process audio context.
//!
//! [`SoftwareContext`] validates every call against its own copy of the graph
//! topology, then forwards a [`GraphCommand`] to the paired
//! [`GraphRenderer`](crate::GraphRenderer) over a lock-free channel. The two
//! halves share only a handful of atomics: the frame counter that is the
//! context clock, and the running/closed flags.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use sintetico_core::{ParamEvent, Waveform};

use crate::backend::{
    AudioContext, ContextState, Destination, NodeId, NodeKind, ParamKind, StreamHandle,
};
use crate::render::GraphRenderer;
use crate::{Error, Result};

/// A validated graph mutation, applied by the renderer at the next block.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GraphCommand {
    AddNode {
        id: NodeId,
        kind: NodeKind,
    },
    Connect {
        from: NodeId,
        to: Destination,
    },
    Disconnect {
        node: NodeId,
    },
    SetWaveform {
        node: NodeId,
        waveform: Waveform,
    },
    Start {
        node: NodeId,
        when: f64,
    },
    Stop {
        node: NodeId,
        when: f64,
    },
    Schedule {
        node: NodeId,
        param: ParamKind,
        event: ParamEvent,
    },
    Cancel {
        node: NodeId,
        param: ParamKind,
        from_time: f64,
    },
}

/// State visible to both the control and audio threads.
#[derive(Debug)]
pub(crate) struct ContextShared {
    pub(crate) sample_rate: f32,
    pub(crate) frames: AtomicU64,
    pub(crate) running: AtomicBool,
    pub(crate) closed: AtomicBool,
}

impl ContextShared {
    pub(crate) fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / f64::from(self.sample_rate)
    }

    pub(crate) fn state(&self) -> ContextState {
        if self.closed.load(Ordering::Acquire) {
            ContextState::Closed
        } else if self.running.load(Ordering::Acquire) {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }
}

#[derive(Debug)]
struct NodeEntry {
    kind: NodeKind,
    outputs: Vec<Destination>,
    started: bool,
}

/// In-process [`AudioContext`] rendering through a paired
/// [`GraphRenderer`].
///
/// # Example
///
/// ```rust
/// use sintetico_io::{AudioContext, ContextState, NodeKind, SoftwareContext};
///
/// let (mut ctx, mut renderer) = SoftwareContext::new(48000.0, true);
/// assert_eq!(ctx.state(), ContextState::Suspended);
///
/// let mut block = [0.0f32; 64];
/// renderer.render(&mut block, 1);
/// assert_eq!(ctx.current_time(), 0.0); // suspended: clock frozen
///
/// ctx.resume()?;
/// renderer.render(&mut block, 1);
/// assert!(ctx.current_time() > 0.0);
/// # Ok::<(), sintetico_io::Error>(())
/// ```
#[derive(Debug)]
pub struct SoftwareContext {
    shared: Arc<ContextShared>,
    commands: Sender<GraphCommand>,
    nodes: Vec<NodeEntry>,
    stream: Option<StreamHandle>,
}

impl SoftwareContext {
    /// Create a context and the renderer that will produce its audio.
    ///
    /// The renderer must be driven by whoever owns the output (a cpal
    /// callback, an offline loop) by calling
    /// [`GraphRenderer::render`] repeatedly.
    pub fn new(sample_rate: f32, start_suspended: bool) -> (Self, GraphRenderer) {
        let shared = Arc::new(ContextShared {
            sample_rate,
            frames: AtomicU64::new(0),
            running: AtomicBool::new(!start_suspended),
            closed: AtomicBool::new(false),
        });
        let (tx, rx): (Sender<GraphCommand>, Receiver<GraphCommand>) = unbounded();

        tracing::info!(sample_rate, start_suspended, "audio context created");

        let renderer = GraphRenderer::new(Arc::clone(&shared), rx);
        let context = Self {
            shared,
            commands: tx,
            nodes: Vec::new(),
            stream: None,
        };
        (context, renderer)
    }

    /// Keep an output stream alive for as long as the context is open.
    pub(crate) fn attach_stream(&mut self, stream: StreamHandle) {
        self.stream = Some(stream);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            Err(Error::ContextClosed)
        } else {
            Ok(())
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(Error::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(Error::NodeNotFound(id))
    }

    fn check_param(&self, node: NodeId, param: ParamKind) -> Result<()> {
        self.ensure_open()?;
        let kind = self.node(node)?.kind;
        if kind.params().contains(&param) {
            Ok(())
        } else {
            Err(Error::UnsupportedParam { node, param })
        }
    }

    fn check_source(&self, node: NodeId) -> Result<&NodeEntry> {
        self.ensure_open()?;
        let entry = self.node(node)?;
        if entry.kind.is_source() {
            Ok(entry)
        } else {
            Err(Error::WrongNodeKind {
                node,
                expected: NodeKind::Oscillator,
            })
        }
    }

    /// Whether `target` can reach `start` through existing connections.
    fn reaches(&self, start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut visited = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let idx = id.0 as usize;
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            for dest in &self.nodes[idx].outputs {
                if let Destination::Node(next) = *dest {
                    stack.push(next);
                }
            }
        }
        false
    }

    fn send(&self, command: GraphCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!(?command, "renderer gone, command dropped");
        }
    }

    fn schedule(&mut self, node: NodeId, param: ParamKind, event: ParamEvent) -> Result<()> {
        self.check_param(node, param)?;
        let time = event.time();
        if !time.is_finite() || time < 0.0 {
            return Err(Error::InvalidTime(time));
        }
        let value = match event {
            ParamEvent::SetValue { value, .. } | ParamEvent::LinearRamp { value, .. } => value,
            ParamEvent::SetTarget { target, .. } => target,
        };
        if !value.is_finite() {
            return Err(Error::NonFiniteValue(value));
        }
        tracing::trace!(%node, ?param, ?event, "param event scheduled");
        self.send(GraphCommand::Schedule { node, param, event });
        Ok(())
    }
}

fn check_time(time: f64) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTime(time))
    }
}

impl AudioContext for SoftwareContext {
    fn sample_rate(&self) -> f32 {
        self.shared.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.shared.current_time()
    }

    fn state(&self) -> ContextState {
        self.shared.state()
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.shared.running.swap(true, Ordering::AcqRel) {
            tracing::info!(time = self.current_time(), "audio context resumed");
        }
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.shared.running.swap(false, Ordering::AcqRel) {
            tracing::info!(time = self.current_time(), "audio context suspended");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.shared.running.store(false, Ordering::Release);
        self.shared.closed.store(true, Ordering::Release);
        self.stream = None;
        tracing::info!(
            time = self.current_time(),
            nodes = self.nodes.len(),
            "audio context closed"
        );
        Ok(())
    }

    fn create_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        self.ensure_open()?;
        let id = NodeId(u32::try_from(self.nodes.len()).map_err(|_| {
            Error::ContextUnavailable("node limit reached".to_string())
        })?);
        self.nodes.push(NodeEntry {
            kind,
            outputs: Vec::new(),
            started: false,
        });
        tracing::debug!(%id, ?kind, "node created");
        self.send(GraphCommand::AddNode { id, kind });
        Ok(id)
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> Result<()> {
        self.ensure_open()?;
        self.node(from)?;
        if let Destination::Node(target) = to {
            self.node(target)?;
            if self.reaches(target, from) {
                return Err(Error::CycleDetected);
            }
        }
        let entry = self.node_mut(from)?;
        if entry.outputs.contains(&to) {
            return Ok(());
        }
        entry.outputs.push(to);
        tracing::debug!(%from, ?to, "nodes connected");
        self.send(GraphCommand::Connect { from, to });
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<()> {
        self.ensure_open()?;
        self.node_mut(node)?.outputs.clear();
        tracing::debug!(%node, "node disconnected");
        self.send(GraphCommand::Disconnect { node });
        Ok(())
    }

    fn set_waveform(&mut self, node: NodeId, waveform: Waveform) -> Result<()> {
        self.check_source(node)?;
        tracing::trace!(%node, %waveform, "waveform set");
        self.send(GraphCommand::SetWaveform { node, waveform });
        Ok(())
    }

    fn start(&mut self, node: NodeId, when: f64) -> Result<()> {
        check_time(when)?;
        if self.check_source(node)?.started {
            return Err(Error::AlreadyStarted(node));
        }
        self.node_mut(node)?.started = true;
        tracing::debug!(%node, when, "source started");
        self.send(GraphCommand::Start { node, when });
        Ok(())
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<()> {
        check_time(when)?;
        if !self.check_source(node)?.started {
            return Err(Error::NotStarted(node));
        }
        tracing::debug!(%node, when, "source stopped");
        self.send(GraphCommand::Stop { node, when });
        Ok(())
    }

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        time: f64,
    ) -> Result<()> {
        self.schedule(node, param, ParamEvent::SetValue { value, time })
    }

    fn set_target_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        target: f32,
        start_time: f64,
        time_constant: f32,
    ) -> Result<()> {
        if !time_constant.is_finite() || time_constant < 0.0 {
            return Err(Error::InvalidTime(f64::from(time_constant)));
        }
        self.schedule(
            node,
            param,
            ParamEvent::SetTarget {
                target,
                start_time,
                time_constant,
            },
        )
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        end_time: f64,
    ) -> Result<()> {
        self.schedule(node, param, ParamEvent::LinearRamp { value, end_time })
    }

    fn cancel_scheduled_values(
        &mut self,
        node: NodeId,
        param: ParamKind,
        from_time: f64,
    ) -> Result<()> {
        self.check_param(node, param)?;
        check_time(from_time)?;
        self.send(GraphCommand::Cancel {
            node,
            param,
            from_time,
        });
        Ok(())
    }
}

impl Drop for SoftwareContext {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.closed.store(true, Ordering::Release);
    }
}
