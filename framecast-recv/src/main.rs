//! framecast receiver entry point.
//!
//! ```text
//! framecast-recv                      Listen with defaults
//! framecast-recv --config <path>      Use custom config TOML
//! framecast-recv --gen-config         Dump default config and exit
//! framecast-recv --write-config <p>   Write default config to a file
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framecast_core::{
    FileSink, FrameReceiver, FrameSink, FrameTransport, LogSink, Reassembler, ReceiverStats,
    spawn_sink,
};
use framecast_recv::config::{OutputMode, ReceiverConfig};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-recv", about = "Receive and reassemble framecast frames")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-recv.toml")]
    config: PathBuf,

    /// UDP port to listen on (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Output mode: log, raw or ppm (overrides config).
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<OutputMode>,

    /// Output file for raw/ppm modes (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to a file and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

fn parse_mode(s: &str) -> Result<OutputMode, String> {
    match s {
        "log" => Ok(OutputMode::Log),
        "raw" => Ok(OutputMode::Raw),
        "ppm" => Ok(OutputMode::Ppm),
        other => Err(format!("unknown mode '{other}' (expected log, raw or ppm)")),
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ReceiverConfig::default())?;
        println!("{text}");
        return Ok(());
    }
    if let Some(path) = &cli.write_config {
        ReceiverConfig::write_default(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = ReceiverConfig::load(&cli.config);
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    if let Some(mode) = cli.mode {
        config.output.mode = mode;
    }
    if let Some(path) = cli.output {
        config.output.path = path;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("framecast-recv v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Bind ─────────────────────────────────────────────────

    let transport = FrameTransport::bind(config.bind_addr()?).await?;
    info!("listening on {}", transport.local_addr()?);

    let mut receiver =
        FrameReceiver::with_reassembler(transport, Reassembler::with_max_parts(config.network.max_parts));

    // ── 2. Sink task ────────────────────────────────────────────

    let sink: Box<dyn FrameSink> = match config.file_format() {
        None => Box::new(LogSink),
        Some(format) => {
            info!("writing frames to {} ({format:?})", config.output.path.display());
            Box::new(FileSink::new(config.output.path.clone(), format))
        }
    };
    let sink_handle = spawn_sink(receiver.frame_receiver(), sink);

    // ── 3. Periodic stats ───────────────────────────────────────

    if config.logging.stats_interval_secs > 0 {
        let stats_rx = receiver.stats_receiver();
        let period = Duration::from_secs(config.logging.stats_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                log_stats(&stats_rx.borrow());
            }
        });
    }

    // ── 4. Receive loop ─────────────────────────────────────────

    let stats_rx = receiver.stats_receiver();
    tokio::select! {
        result = receiver.run() => {
            if let Err(e) = result {
                error!("receive loop failed: {e}");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received; shutting down");
        }
    }

    sink_handle.abort();
    log_stats(&stats_rx.borrow());
    Ok(())
}

fn log_stats(stats: &ReceiverStats) {
    info!(
        fps = %format!("{:.1}", stats.fps),
        last = ?stats.last_sequence.map(|s| s.get()),
        completed = stats.reassembly.completed,
        superseded = stats.reassembly.superseded,
        stale = stats.reassembly.stale,
        duplicates = stats.reassembly.duplicates,
        malformed = stats.reassembly.malformed,
        datagrams = stats.transport.datagrams_received,
        "stats"
    );
}
