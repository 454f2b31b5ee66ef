//! `spot`: the spotlight launcher engine in a terminal.
//!
//! One-shot mode prints the calculator line and the final ranked list for a
//! single query. Interactive mode reads one query per stdin line and renders
//! frames as they stream in; `:next`, `:prev` and `:open` drive the selection.

use clap::Parser;
use mimalloc::MiMalloc;
use parking_lot::Mutex;
use spot_core::{
    Config, Debounce, Engine, EngineSettings, Frame, SearchAction, StopHandle, WalkPathSource,
};
use std::io::{self, BufRead, Write};
use std::path::{MAIN_SEPARATOR, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// How long a one-shot search may run before settling for partial results.
const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(30);
/// Pump slice between input checks.
const PUMP_SLICE: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "spot", version, about = "Quick launcher: calculator and file search")]
struct Args {
    /// Query to evaluate and search for. Required unless --interactive.
    query: Option<String>,

    /// Config file, defaults to <config_dir>/spotlight/config.toml
    #[arg(long, env = "SPOT_CONFIG")]
    config: Option<PathBuf>,

    /// Search root, overrides the configured directories. Repeatable.
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    #[arg(long)]
    max_depth: Option<usize>,

    /// Number of results to show
    #[arg(long)]
    limit: Option<usize>,

    /// Log file, defaults to <cache_dir>/spotlight/spot.log
    #[arg(long, env = "SPOT_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[arg(long, env = "SPOT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Read queries from stdin, one per line
    #[arg(short, long)]
    interactive: bool,

    /// Open the top result with the default application
    #[arg(long)]
    open: bool,
}

impl Args {
    fn settings(&self, config: &Config) -> EngineSettings {
        let mut settings = EngineSettings::from_config(config);
        if !self.roots.is_empty() {
            settings.roots = self.roots.clone();
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(limit) = self.limit {
            let limit = limit.max(1);
            settings.ranker.max_results = limit;
            settings.ranker.hard_cap = limit.saturating_mul(config.hard_cap_multiplier);
        }
        settings
    }
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("spotlight")
        .join("spot.log")
}

fn render_frame(out: &mut impl Write, frame: &Frame) -> io::Result<()> {
    if let Some(line) = frame.calc_line() {
        writeln!(out, "{line}")?;
    }
    for item in &frame.snapshot.items {
        writeln!(
            out,
            "{:>5}  {}{}{}",
            item.score,
            item.display_dir(),
            MAIN_SEPARATOR,
            item.marked_basename()
        )?;
    }
    Ok(())
}

fn render_status(out: &mut impl Write, frame: &Frame, selected: Option<usize>) -> io::Result<()> {
    let state = if frame.snapshot.is_final { "done" } else { "searching" };
    let selected = selected.map_or_else(|| "-".to_owned(), |i| (i + 1).to_string());
    writeln!(
        out,
        "-- {} {state}: {} shown, {} matched, {} seen, selected {selected}",
        frame.session,
        frame.snapshot.len(),
        frame.snapshot.total_matched,
        frame.snapshot.total_seen,
    )
}

fn run_once(
    engine: &mut Engine<WalkPathSource>,
    query: &str,
    open: bool,
    running: &AtomicBool,
    live_stop: &Mutex<Option<StopHandle>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = engine.on_input(query);
    let SearchAction::Schedule(query) = update.search else {
        return Ok(());
    };

    engine.start_search(&query)?;
    *live_stop.lock() = engine.live_stop_handle();

    // Ctrl-C stops the walker, which then finalizes with partial results
    let deadline = Instant::now() + ONE_SHOT_TIMEOUT;
    while engine.live_session().is_some() {
        if Instant::now() >= deadline {
            tracing::warn!(query = %query, "Search timed out");
            engine.cancel();
            break;
        }
        engine.pump(PUMP_SLICE);
    }
    if !running.load(Ordering::SeqCst) {
        tracing::info!(query = %query, "Search interrupted");
    }

    let Some(frame) = engine.frame() else {
        return Ok(());
    };
    let mut out = io::stdout().lock();
    render_frame(&mut out, frame)?;

    if open && let Some(path) = engine.launch_selected()? {
        writeln!(out, "opened {path}")?;
    }
    Ok(())
}

fn run_interactive(
    engine: &mut Engine<WalkPathSource>,
    delay: Duration,
    running: &AtomicBool,
    live_stop: &Mutex<Option<StopHandle>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (lines_tx, lines_rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("spot-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let mut debounce = Debounce::new(delay);
    let mut input_open = true;
    let mut out = io::stdout();

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let wait = if engine.live_session().is_some() {
            Duration::ZERO
        } else {
            debounce
                .time_until_ready(now)
                .unwrap_or(Duration::from_millis(100))
        };

        match lines_rx.recv_timeout(wait) {
            Ok(line) => match line.trim() {
                ":next" => engine.move_selection(1),
                ":prev" => engine.move_selection(-1),
                ":open" => match engine.launch_selected() {
                    Ok(Some(path)) => writeln!(out, "opened {path}")?,
                    Ok(None) => writeln!(out, "nothing selected")?,
                    // logged by the launcher, keep going
                    Err(err) => writeln!(out, "{err}")?,
                },
                text => {
                    let update = engine.on_input(text);
                    match update.search {
                        SearchAction::Clear => {
                            debounce.cancel();
                            *live_stop.lock() = None;
                        }
                        SearchAction::Schedule(query) => debounce.schedule(query),
                    }
                    if let Some(result) = update.calc_result {
                        writeln!(out, "= {result}")?;
                    }
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => input_open = false,
        }

        if let Some(query) = debounce.poll() {
            match engine.start_search(&query) {
                Ok(id) => {
                    tracing::debug!(session = %id, query = %query, "Scheduled search started");
                    *live_stop.lock() = engine.live_stop_handle();
                }
                Err(err) => writeln!(out, "search failed: {err}")?,
            }
        }

        if let Some(frame) = engine.pump(PUMP_SLICE) {
            writeln!(out, "\n> {}", frame.query)?;
            render_frame(&mut out, &frame)?;
            render_status(&mut out, &frame, engine.selection().index())?;
        }

        if !input_open && !debounce.is_pending() && engine.live_session().is_none() {
            break;
        }
    }

    engine.cancel();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_file = args.log_file.clone().unwrap_or_else(default_log_file);
    let _log_guard = spot_core::log::init_tracing(&log_file, args.log_level.as_deref())?;

    let config = Config::load_or_default(args.config.as_deref())?;
    let settings = args.settings(&config);
    tracing::info!(?settings, "Starting spot");

    let mut engine = Engine::new(WalkPathSource::default(), settings);

    let running = Arc::new(AtomicBool::new(true));
    let live_stop: Arc<Mutex<Option<StopHandle>>> = Arc::new(Mutex::new(None));
    {
        let running = Arc::clone(&running);
        let live_stop = Arc::clone(&live_stop);
        ctrlc::set_handler(move || {
            if let Some(stop) = live_stop.lock().take() {
                stop.stop();
            }
            if !running.swap(false, Ordering::SeqCst) {
                // second Ctrl-C while shutting down
                std::process::exit(130);
            }
        })?;
    }

    if args.interactive {
        return run_interactive(&mut engine, config.search_delay(), &running, &live_stop);
    }

    let Some(query) = args.query.as_deref() else {
        eprintln!("spot: a query is required unless --interactive is given");
        std::process::exit(2);
    };

    run_once(&mut engine, query, args.open, &running, &live_stop)
}
