//! framecast sender entry point.
//!
//! ```text
//! framecast-send                      Run with defaults
//! framecast-send --config <path>      Load a custom config TOML
//! framecast-send --gen-config         Write default config to stdout
//! framecast-send --write-config <p>   Write default config to a file
//! ```

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framecast_core::{FileSource, FrameSender, FrameSource, FrameTransport, PatternSource};
use framecast_send::config::{SenderConfig, SourceKind};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-send", about = "Stream frames to a framecast receiver over UDP")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-send.toml")]
    config: PathBuf,

    /// Receiver host (overrides config).
    #[arg(short, long)]
    destination: Option<String>,

    /// Receiver UDP port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Target frames per second (overrides config).
    #[arg(long)]
    fps: Option<u32>,

    /// Stream this image file instead of the test pattern.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to a file and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }
    if let Some(path) = &cli.write_config {
        SenderConfig::write_default(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = SenderConfig::load(&cli.config);
    if let Some(destination) = cli.destination {
        config.network.destination = destination;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(fps) = cli.fps {
        config.capture.fps = fps;
    }
    if let Some(path) = cli.file {
        config.capture.source = SourceKind::File;
        config.capture.path = path;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("framecast-send v{}", env!("CARGO_PKG_VERSION"));

    let remote = config.destination_addr()?;
    let options = config.to_sender_options();
    info!("destination: {remote}");
    info!("target FPS: {}", options.target_fps);

    let transport = FrameTransport::connect(remote).await?;
    match config.capture.source {
        SourceKind::Pattern => {
            info!(
                "source: test pattern {}x{}",
                config.capture.width, config.capture.height
            );
            let source = PatternSource::new(
                config.capture.width,
                config.capture.height,
                config.capture.compression_level,
            );
            run(FrameSender::with_options(source, transport, options)?).await?;
        }
        SourceKind::File => {
            info!("source: file {}", config.capture.path.display());
            let source = FileSource::new(config.capture.path.clone());
            run(FrameSender::with_options(source, transport, options)?).await?;
        }
    }

    Ok(())
}

/// Run the sender until Ctrl-C or a transport failure.
async fn run<S: FrameSource>(mut sender: FrameSender<S>) -> Result<(), Box<dyn std::error::Error>> {
    let stop = sender.stop_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received; shutting down");
        stop.store(false, Ordering::SeqCst);
    });

    sender.run().await?;

    let stats = sender.stats();
    info!(
        frames = stats.frames_sent,
        packets = stats.packets_sent,
        skipped = stats.ticks_skipped,
        "done"
    );
    Ok(())
}
