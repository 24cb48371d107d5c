// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use usbrig::backends::camera::types::Resolution;
use usbrig::{Config, RecordingMode};

mod cli;

#[derive(Parser)]
#[command(name = "usbrig")]
#[command(about = "Record from several USB cameras and a USB microphone at once")]
#[command(version = usbrig::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: <config dir>/usbrig/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a session (default)
    Record(RecordArgs),

    /// List USB capture devices and their best modes
    List,
}

#[derive(Args)]
struct RecordArgs {
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base name for output files (default: recording_TIMESTAMP)
    #[arg(short, long)]
    base: Option<String>,

    /// Recording mode: raw or lossless
    #[arg(short, long)]
    mode: Option<RecordingMode>,

    /// Default resolution, e.g. 1280x720
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Default frame rate
    #[arg(long)]
    framerate: Option<u32>,

    /// Four-character input format requested from the cameras
    #[arg(long)]
    input_format: Option<String>,

    /// Skip format probing and propose the defaults
    #[arg(long)]
    no_auto_detect: bool,

    /// Text drawn on every video above a timestamp (forces lossless)
    #[arg(long)]
    overlay: Option<String>,

    /// Open a preview window per camera
    #[arg(long)]
    preview: bool,

    /// Preview window scale factor
    #[arg(long)]
    scale: Option<f64>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Record video only
    #[arg(long)]
    no_audio: bool,

    /// Skip the audio pre-flight test
    #[arg(long)]
    skip_audio_test: bool,

    /// Accept every default without asking
    #[arg(short, long)]
    yes: bool,
}

impl RecordArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output_directory = Some(output.clone());
        }
        if let Some(base) = &self.base {
            config.base_name = Some(base.clone());
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(resolution) = self.resolution {
            config.default_resolution = resolution;
        }
        if let Some(framerate) = self.framerate {
            config.default_framerate = framerate;
        }
        if let Some(input_format) = &self.input_format {
            config.input_format = input_format.to_ascii_uppercase();
        }
        if self.no_auto_detect {
            config.auto_detect = false;
        }
        if let Some(overlay) = &self.overlay {
            config.overlay_text = Some(overlay.clone());
        }
        if self.preview {
            config.preview = true;
        }
        if let Some(scale) = self.scale {
            config.preview_scale = scale;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = Some(duration);
        }
        if self.no_audio {
            config.audio_enabled = false;
        }
        if self.skip_audio_test {
            config.test_audio = false;
        }
    }
}

fn main() -> usbrig::AppResult<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=usbrig=debug, RUST_LOG=info
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::List) => {
            config.validate()?;
            cli::list_devices(&config)
        }
        Some(Commands::Record(args)) => {
            args.apply(&mut config);
            config.validate()?;
            cli::record(config, args.yes)
        }
        None => {
            config.validate()?;
            cli::record(config, false)
        }
    }
}
