//! Offline rendering of a gesture script to a WAV file.

use super::common::load_config;
use crate::script::parse_script;
use crate::session::{self, Flow};
use anyhow::Context;
use clap::Args;
use sintetico_control::SynthController;
use sintetico_io::{OfflineHost, WavSpec, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Gesture script
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Output WAV file
    #[arg(short, long, value_name = "OUT")]
    output: PathBuf,

    /// Config file (defaults to the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output bit depth
    #[arg(long, default_value_t = 16, value_parser = parse_bits)]
    bits: u16,

    /// Extra seconds rendered after the script ends
    #[arg(long, default_value_t = 0.5)]
    tail: f64,
}

fn parse_bits(s: &str) -> Result<u16, String> {
    match s {
        "16" => Ok(16),
        "24" => Ok(24),
        "32" => Ok(32),
        _ => Err(format!("unsupported bit depth '{s}' (expected 16, 24 or 32)")),
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(sr) = args.sample_rate {
        config.audio.sample_rate = sr;
    }
    config.validate()?;
    if !args.tail.is_finite() || args.tail < 0.0 {
        anyhow::bail!("--tail must be a non-negative number of seconds");
    }

    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;
    let commands = parse_script(&text)
        .with_context(|| format!("parsing script {}", args.script.display()))?;

    let sample_rate = config.audio.sample_rate;
    let channels = usize::from(config.audio.channels);
    let host = OfflineHost::new(sample_rate as f32);
    host.set_start_suspended(config.audio.start_suspended);

    let mut synth = session::controller(Box::new(host.clone()), &config);
    let mut renderer = BlockRenderer {
        host: &host,
        channels,
        block_frames: config.audio.buffer_size as usize,
        sample_rate: f64::from(sample_rate),
        samples: Vec::new(),
    };

    println!("Rendering {}...", args.script.display());
    for command in commands {
        match session::apply(&mut synth, command) {
            Flow::Continue => {}
            Flow::Wait(secs) => renderer.run_for(secs),
            Flow::Quit => break,
        }
    }
    renderer.run_for(args.tail);
    report_error(&synth);
    synth.teardown();

    let frames = renderer.samples.len() / channels;
    write_wav(
        &args.output,
        &renderer.samples,
        WavSpec {
            channels: config.audio.channels,
            sample_rate,
            bits_per_sample: args.bits,
        },
    )
    .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "  {} frames, {} Hz, {} ch, {:.2}s -> {}",
        frames,
        sample_rate,
        channels,
        frames as f64 / f64::from(sample_rate),
        args.output.display()
    );
    Ok(())
}

/// Renders the offline host in fixed-size blocks and collects the output.
struct BlockRenderer<'a> {
    host: &'a OfflineHost,
    channels: usize,
    block_frames: usize,
    sample_rate: f64,
    samples: Vec<f32>,
}

impl BlockRenderer<'_> {
    fn run_for(&mut self, secs: f64) {
        let mut remaining = (secs * self.sample_rate).round() as usize;
        let mut block = vec![0.0f32; self.block_frames.max(1) * self.channels];
        while remaining > 0 {
            let frames = remaining.min(self.block_frames.max(1));
            let out = &mut block[..frames * self.channels];
            // No context yet renders silence, which is what the listener hears.
            self.host.render(out, self.channels);
            self.samples.extend_from_slice(out);
            remaining -= frames;
        }
    }
}

fn report_error(synth: &SynthController) {
    if let Some(err) = synth.state().last_error() {
        tracing::warn!(error = %err, "script ended with an audio error");
    }
}
