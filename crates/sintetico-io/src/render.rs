//! Audio-side half of the in-process audio context.
//!
//! [`GraphRenderer`] owns the DSP state for every node. At the start of each
//! block it drains pending [`GraphCommand`]s, recompiles the processing order
//! if the topology changed, then renders sample by sample: every parameter is
//! advanced with that sample's context time, each node processes the sum of
//! its inputs, and whatever reaches [`Destination::Output`] is written to all
//! output channels.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam_channel::Receiver;
use sintetico_core::{AudioParam, LowpassFilter, Oscillator, ParamEvent};

use crate::backend::{ContextState, Destination, NodeId, NodeKind, ParamKind, ParamSpec};
use crate::context::{ContextShared, GraphCommand};

fn make_param(kind: NodeKind, param: ParamKind, sample_rate: f32) -> AudioParam {
    let spec = kind
        .param_spec(param, sample_rate)
        .unwrap_or(ParamSpec {
            default: 0.0,
            min: 0.0,
            max: 0.0,
        });
    let mut p = AudioParam::new(spec.default, spec.min, spec.max);
    p.set_sample_rate(sample_rate);
    p
}

#[derive(Debug)]
enum Processor {
    Oscillator {
        osc: Oscillator,
        frequency: AudioParam,
        start: Option<f64>,
        stop: Option<f64>,
    },
    Lowpass {
        filter: LowpassFilter,
        frequency: AudioParam,
        q: AudioParam,
    },
    Gain {
        gain: AudioParam,
    },
}

impl Processor {
    fn new(kind: NodeKind, sample_rate: f32) -> Self {
        match kind {
            NodeKind::Oscillator => Processor::Oscillator {
                osc: Oscillator::new(sample_rate),
                frequency: make_param(kind, ParamKind::Frequency, sample_rate),
                start: None,
                stop: None,
            },
            NodeKind::LowpassFilter => Processor::Lowpass {
                filter: LowpassFilter::new(sample_rate),
                frequency: make_param(kind, ParamKind::Frequency, sample_rate),
                q: make_param(kind, ParamKind::Q, sample_rate),
            },
            NodeKind::Gain => Processor::Gain {
                gain: make_param(kind, ParamKind::Gain, sample_rate),
            },
        }
    }

    fn param_mut(&mut self, param: ParamKind) -> Option<&mut AudioParam> {
        match (self, param) {
            (Processor::Oscillator { frequency, .. }, ParamKind::Frequency)
            | (Processor::Lowpass { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (Processor::Lowpass { q, .. }, ParamKind::Q) => Some(q),
            (Processor::Gain { gain }, ParamKind::Gain) => Some(gain),
            _ => None,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, time: f64) -> f32 {
        match self {
            Processor::Oscillator {
                osc,
                frequency,
                start,
                stop,
            } => {
                let hz = frequency.advance(time);
                let started = start.is_some_and(|at| at <= time);
                let stopped = stop.is_some_and(|at| at <= time);
                if started && !stopped {
                    osc.set_frequency(hz);
                    osc.advance()
                } else {
                    0.0
                }
            }
            Processor::Lowpass {
                filter,
                frequency,
                q,
            } => {
                filter.set_cutoff(frequency.advance(time));
                filter.set_q(q.advance(time));
                filter.process(input)
            }
            Processor::Gain { gain } => input * gain.advance(time),
        }
    }
}

#[derive(Debug)]
struct RenderNode {
    processor: Processor,
    outputs: Vec<Destination>,
    input: f32,
}

/// Renders the node graph of one [`SoftwareContext`](crate::SoftwareContext).
///
/// Created in a pair with its context by
/// [`SoftwareContext::new`](crate::SoftwareContext::new). Move it to the thread
/// that owns the output and call [`render`](Self::render) once per block.
#[derive(Debug)]
pub struct GraphRenderer {
    shared: Arc<ContextShared>,
    commands: Receiver<GraphCommand>,
    nodes: Vec<RenderNode>,
    order: Vec<usize>,
    topology_dirty: bool,
}

impl GraphRenderer {
    pub(crate) fn new(shared: Arc<ContextShared>, commands: Receiver<GraphCommand>) -> Self {
        Self {
            shared,
            commands,
            nodes: Vec::new(),
            order: Vec::new(),
            topology_dirty: false,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.shared.sample_rate
    }

    /// State of the owning context.
    pub fn state(&self) -> ContextState {
        self.shared.state()
    }

    /// Context time, in seconds, of the next sample to be rendered.
    pub fn current_time(&self) -> f64 {
        self.shared.current_time()
    }

    /// Fill `out` with interleaved audio for `channels` channels.
    ///
    /// A suspended or closed context writes silence and leaves the clock where
    /// it is. Commands are still drained so the queue never grows unbounded.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        self.apply_commands();

        if self.shared.state() != ContextState::Running || channels == 0 {
            out.fill(0.0);
            return;
        }

        if self.topology_dirty {
            self.order = self.processing_order();
            self.topology_dirty = false;
        }

        let start_frame = self.shared.frames.load(Ordering::Acquire);
        let sample_period = 1.0 / f64::from(self.shared.sample_rate);
        let frames = out.len() / channels;

        for (n, frame) in out.chunks_exact_mut(channels).enumerate() {
            let time = (start_frame + n as u64) as f64 * sample_period;
            let sample = self.render_sample(time);
            frame.fill(sample);
        }
        // Trailing partial frame, if any.
        let tail = frames * channels;
        out[tail..].fill(0.0);

        self.shared
            .frames
            .fetch_add(frames as u64, Ordering::AcqRel);
    }

    /// Render `frames` frames into a new interleaved buffer.
    pub fn render_to_vec(&mut self, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * channels];
        self.render(&mut out, channels);
        out
    }

    #[inline]
    fn render_sample(&mut self, time: f64) -> f32 {
        let mut mix = 0.0;
        for i in 0..self.order.len() {
            let idx = self.order[i];
            let node = &mut self.nodes[idx];
            let input = node.input;
            node.input = 0.0;
            let out = node.processor.process(input, time);

            for k in 0..self.nodes[idx].outputs.len() {
                let dest = self.nodes[idx].outputs[k];
                match dest {
                    Destination::Node(to) => self.nodes[to.0 as usize].input += out,
                    Destination::Output => mix += out,
                }
            }
        }
        mix
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: GraphCommand) {
        let sample_rate = self.shared.sample_rate;
        match command {
            GraphCommand::AddNode { id, kind } => {
                debug_assert_eq!(id.0 as usize, self.nodes.len());
                self.nodes.push(RenderNode {
                    processor: Processor::new(kind, sample_rate),
                    outputs: Vec::new(),
                    input: 0.0,
                });
                self.topology_dirty = true;
            }
            GraphCommand::Connect { from, to } => {
                if let Some(node) = self.node_mut(from) {
                    node.outputs.push(to);
                    self.topology_dirty = true;
                }
            }
            GraphCommand::Disconnect { node } => {
                if let Some(node) = self.node_mut(node) {
                    node.outputs.clear();
                    self.topology_dirty = true;
                }
            }
            GraphCommand::SetWaveform { node, waveform } => {
                if let Some(RenderNode {
                    processor: Processor::Oscillator { osc, .. },
                    ..
                }) = self.node_mut(node)
                {
                    osc.set_waveform(waveform);
                }
            }
            GraphCommand::Start { node, when } => {
                if let Some(RenderNode {
                    processor: Processor::Oscillator { start, .. },
                    ..
                }) = self.node_mut(node)
                {
                    *start = Some(when);
                }
            }
            GraphCommand::Stop { node, when } => {
                if let Some(RenderNode {
                    processor: Processor::Oscillator { stop, .. },
                    ..
                }) = self.node_mut(node)
                {
                    *stop = Some(when);
                }
            }
            GraphCommand::Schedule { node, param, event } => {
                if let Some(p) = self
                    .node_mut(node)
                    .and_then(|n| n.processor.param_mut(param))
                {
                    match event {
                        ParamEvent::SetValue { value, time } => p.set_value_at_time(value, time),
                        ParamEvent::SetTarget {
                            target,
                            start_time,
                            time_constant,
                        } => p.set_target_at_time(target, start_time, time_constant),
                        ParamEvent::LinearRamp { value, end_time } => {
                            p.linear_ramp_to_value_at_time(value, end_time);
                        }
                    }
                }
            }
            GraphCommand::Cancel {
                node,
                param,
                from_time,
            } => {
                if let Some(p) = self
                    .node_mut(node)
                    .and_then(|n| n.processor.param_mut(param))
                {
                    p.cancel_scheduled_values(from_time);
                }
            }
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Kahn's topological sort over node-to-node connections.
    ///
    /// The context rejects cycles before they are sent, so every node is
    /// always emitted; a node left over would indicate a bug and is appended
    /// rather than dropped.
    fn processing_order(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        for node in &self.nodes {
            for dest in &node.outputs {
                if let Destination::Node(to) = *dest {
                    in_degree[to.0 as usize] += 1;
                }
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(n);

        while let Some(idx) = queue.pop() {
            sorted.push(idx);
            for dest in &self.nodes[idx].outputs {
                if let Destination::Node(to) = *dest {
                    let to_idx = to.0 as usize;
                    in_degree[to_idx] -= 1;
                    if in_degree[to_idx] == 0 {
                        queue.push(to_idx);
                    }
                }
            }
        }

        if sorted.len() != n {
            tracing::warn!(
                sorted = sorted.len(),
                nodes = n,
                "cycle in render graph, appending remaining nodes"
            );
            for i in 0..n {
                if !sorted.contains(&i) {
                    sorted.push(i);
                }
            }
        }
        sorted
    }
}
