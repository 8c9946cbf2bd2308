//! Live playback driven by gesture commands on stdin.

use super::common::load_config;
use crate::script::parse_line;
use crate::session::{self, Flow};
use clap::Args;
use sintetico_io::{BackendStreamConfig, CpalHost};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct PlayArgs {
    /// Config file (defaults to the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device (partial name)
    #[arg(short, long)]
    device: Option<String>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.audio.device = Some(device);
    }
    if let Some(sr) = args.sample_rate {
        config.audio.sample_rate = sr;
    }
    if let Some(bs) = args.buffer_size {
        config.audio.buffer_size = bs;
    }
    config.validate()?;

    let host = CpalHost::new(BackendStreamConfig {
        sample_rate: config.audio.sample_rate,
        buffer_size: config.audio.buffer_size,
        channels: config.audio.channels,
        device_name: config.audio.device.clone(),
    })
    .start_suspended(config.audio.start_suspended);

    let mut synth = session::controller(Box::new(host), &config);

    println!("Reading gestures from stdin ('quit' or EOF to exit).");
    println!(
        "Knobs: frequency at (0,0)-(100,100), cutoff at (200,0)-(300,100). Keys: {}",
        config.keyboard.keys
    );

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("error: {message}");
                continue;
            }
        };
        match session::apply(&mut synth, command) {
            Flow::Continue => {}
            Flow::Wait(secs) => std::thread::sleep(Duration::from_secs_f64(secs)),
            Flow::Quit => break,
        }
        if let Some(err) = synth.state().last_error() {
            eprintln!("audio error: {err}");
        }
    }

    synth.teardown();
    Ok(())
}
