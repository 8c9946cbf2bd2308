//! Sintetico CLI - play and render the single-voice synth from gesture scripts.

mod commands;
mod script;
mod session;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sintetico")]
#[command(author, version, about = "Single-voice synth driven by knob and keyboard gestures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play live, reading gesture commands from stdin
    Play(commands::play::PlayArgs),

    /// Run a gesture script offline and write the result to a WAV file
    Render(commands::render::RenderArgs),

    /// List audio output devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices => commands::devices::run(),
    }
}
