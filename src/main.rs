use adc_scope::console_display::{ConsoleDisplay, JsonLinesSink};
use adc_scope::context::ScopeContext;
use adc_scope::error::ScopeError;
use adc_scope::ingestion::IngestionWorker;
use adc_scope::input::{Action, KeyboardInput};
use adc_scope::line_source::{LineSource, ReaderLines};
use adc_scope::render_loop::RenderLoop;
use adc_scope::renderer::Renderer;
use adc_scope::simulator::Simulator;
use adc_scope::types::*;
#[cfg(feature = "hardware")]
use adc_scope::serial_reader::{self, SerialConfig};

use clap::Parser;
use crossbeam_channel::unbounded;
use log::{error, info, warn};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "adc-scope")]
#[command(about = "Live two-channel oscilloscope for a serial ADC stream")]
struct Cli {
    /// Serial port the device prints "<ch0>,<ch1>" lines on
    #[arg(long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Run on synthetic data (no hardware required)
    #[arg(long)]
    simulate: bool,

    /// Simulator output rate (lines per second)
    #[arg(long, default_value_t = 1000)]
    sim_rate: u32,

    /// Replay a captured text file instead of reading the serial port
    #[arg(long, conflicts_with = "simulate")]
    replay: Option<PathBuf>,

    /// Samples of history kept per channel (also the widest window)
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Render period in milliseconds
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Directory for CSV and PNG exports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// No terminal UI: write each frame to stdout as a JSON line
    #[arg(long)]
    headless: bool,

    /// Stop after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,
}

impl Cli {
    fn validate(&self) -> Result<(), ScopeError> {
        if self.capacity < DEFAULT_WINDOW {
            return Err(ScopeError::Config(format!(
                "--capacity must be at least {} (the default window), got {}",
                DEFAULT_WINDOW, self.capacity
            )));
        }
        if self.tick_ms == 0 {
            return Err(ScopeError::Config("--tick-ms must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Open whichever transport the CLI selected. This is the only fatal step:
/// nothing else is constructed if it fails.
fn open_source(cli: &Cli) -> Result<Box<dyn LineSource>, ScopeError> {
    if let Some(path) = &cli.replay {
        info!("Replaying {:?}", path);
        let file = File::open(path).map_err(|source| ScopeError::ReplayOpen {
            path: path.clone(),
            source,
        })?;
        return Ok(Box::new(ReaderLines::new(BufReader::new(file))));
    }
    if cli.simulate {
        info!("Starting simulator at {} lines/s", cli.sim_rate);
        return Ok(Box::new(Simulator::new(cli.sim_rate)));
    }

    #[cfg(feature = "hardware")]
    {
        let config = SerialConfig::new(cli.port.clone()).with_baud(cli.baud);
        Ok(Box::new(serial_reader::open(&config)?))
    }
    #[cfg(not(feature = "hardware"))]
    {
        error!("Hardware mode requires 'hardware' feature. Falling back to simulator.");
        Ok(Box::new(Simulator::new(cli.sim_rate)))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The terminal UI owns the screen; keep the log quiet unless asked.
    let default_filter = if cli.headless { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    if let Err(e) = cli.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("═══════════════════════════════════════════════");
    info!("  ADC SCOPE v{}", env!("CARGO_PKG_VERSION"));
    info!("  History: {} samples/channel", cli.capacity);
    info!("  UI: {}", if cli.headless { "headless (JSON lines)" } else { "terminal" });
    info!("═══════════════════════════════════════════════");

    let source = match open_source(&cli) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = Arc::new(ScopeContext::new(cli.capacity));

    // ─── Ingestion ──────────────────────────────────────────────────
    let ingestion = match IngestionWorker::new(source, Arc::clone(&ctx)).spawn() {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to start ingestion thread: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // ─── Keyboard + render loop on the main thread ──────────────────
    let (action_tx, action_rx) = unbounded::<Action>();
    let interval = Duration::from_millis(cli.tick_ms);
    let run_time = cli.duration_secs.map(Duration::from_secs);
    let renderer = Renderer::new(Arc::clone(&ctx));

    let result = if cli.headless {
        drop(action_tx);
        RenderLoop::new(renderer, JsonLinesSink::new(io::stdout().lock()), action_rx, interval)
            .with_output_dir(cli.output_dir.clone())
            .with_run_time(run_time)
            .run()
    } else {
        match ConsoleDisplay::setup() {
            Ok(display) => {
                let keyboard = KeyboardInput::new(Arc::clone(&ctx), action_tx).spawn();
                let result = RenderLoop::new(renderer, display, action_rx, interval)
                    .with_output_dir(cli.output_dir.clone())
                    .with_run_time(run_time)
                    .run();
                match keyboard {
                    Ok(h) => {
                        let _ = h.join();
                    }
                    Err(e) => warn!("Keyboard thread did not start: {}", e),
                }
                result
            }
            Err(e) => Err(e),
        }
    };

    ctx.shutdown();
    match ingestion.join() {
        Ok(count) => info!("Ingested {} samples", count),
        Err(_) => error!("Ingestion thread panicked"),
    }

    match result {
        Ok(frames) => {
            info!("Rendered {} frames", frames);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Display failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
