//! osc-panel CLI - terminal control panel synced over OSC/WebSocket.
//!
//! This is the main binary entry point. See the `osc_panel` library for the
//! core functionality.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use osc_panel::constants::{DEFAULT_HOST, DEFAULT_PORT, HEADLESS_TICK};
use osc_panel::{commands, run, tui, ws, Config, FileStore, FolderDef, Panel, WsConnector};
use tokio::sync::mpsc;

/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Global flag for signal-triggered shutdown (as Arc for signal-hook compatibility)
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

fn register_signals() -> Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGINT, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGHUP, Arc::clone(&SHUTDOWN_FLAG))?;
    Ok(())
}

/// Build and start the panel, then hand it to the TUI or the headless loop.
fn run_start(params: Option<PathBuf>, headless: bool) -> Result<()> {
    let config = Config::load()?;

    // Load definitions BEFORE entering raw mode so errors are visible
    let app = match params.or_else(|| config.params_file.clone()) {
        Some(path) => {
            log::info!("Loading parameters from {}", path.display());
            FolderDef::from_path(&path)?
        }
        None => FolderDef::new(),
    };

    register_signals()?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let store = FileStore::new(Config::store_path()?);
    let mut panel = Panel::new(
        app,
        Box::new(WsConnector),
        Box::new(store),
        events_tx,
        config.panel_options(Config::log_filter_is_explicit()),
    )?;
    panel.start(Instant::now());

    log::info!("osc-panel v{} started", env!("CARGO_PKG_VERSION"));

    if headless {
        println!("osc-panel running headless ({}). Ctrl+C to stop.", panel.status());
        run::run_headless(&mut panel, &mut events_rx, &SHUTDOWN_FLAG, HEADLESS_TICK);
        panel.disconnect();
        println!("Shutting down...");
    } else {
        tui::run_tui(panel, events_rx, Arc::clone(&SHUTDOWN_FLAG))?;
    }
    Ok(())
}

// CLI
#[derive(Parser)]
#[command(name = "osc-panel")]
#[command(version)]
#[command(about = "Terminal control panel synced over OSC/WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the panel
    Start {
        /// Parameter definition file (JSON)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Run without a terminal UI
        #[arg(long)]
        headless: bool,
    },
    /// Send a single OSC message and exit
    Send {
        /// OSC address, e.g. /sides
        address: String,
        /// Value as a JSON literal; anything else is sent as a string
        value: String,
        /// Peer host
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        /// Peer port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Send a JSON text frame instead of a binary OSC packet
        #[arg(long)]
        json: bool,
    },
    /// Inspect or clear saved settings
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum StoreAction {
    /// Print every saved slot
    Show,
    /// Delete every saved slot
    Clear,
}

fn init_logging() -> Result<()> {
    let log_path = Config::log_path()?;
    let log_file = std::fs::File::create(&log_path)?;
    let explicit_filter = Config::log_filter_is_explicit();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format_timestamp_secs()
        .init();
    // The debugLog toggle raises this at runtime.
    if !explicit_filter {
        log::set_max_level(log::LevelFilter::Info);
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    // Set up panic hook to log panics and ensure terminal cleanup
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {:?}", panic_info);
        tui::guard::restore_terminal();
        default_hook(panic_info);
    }));

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { params, headless } => run_start(params, headless)?,
        Commands::Send { address, value, host, port, json } => {
            let url = ws::endpoint_url(&host, port);
            commands::send::run(&url, &address, &value, json)?;
            println!("Sent {address} to {url}");
        }
        Commands::Store { action } => {
            let mut store = FileStore::new(Config::store_path()?);
            match action {
                StoreAction::Show => commands::store::show(&store, &mut std::io::stdout())?,
                StoreAction::Clear => {
                    let removed = commands::store::clear(&mut store)?;
                    println!("Removed {removed} saved slots");
                }
            }
        }
        Commands::Config => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("config dir: {}", Config::config_dir()?.display());
            println!("store:      {}", Config::store_path()?.display());
            println!("log:        {}", Config::log_path()?.display());
        }
    }

    Ok(())
}
