// Entry point for the Minesweeper TUI application
// Parses the command line, sets up logging, loads the configuration and launches the UI

use clap::Parser;
use env_logger::{Env, Target};
use log::info;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use xtmines::xtm_config::{config_path, load_or_create_config};
use xtmines::xtm_ui::run as run_ui;
use xtmines::Minefield;

/// Play Minesweeper in the terminal with the keyboard or the mouse.
#[derive(Parser)]
#[command(about, long_about = None, version)]
struct Args {
    /// Number of board rows for a custom game
    #[arg(short, long)]
    rows: Option<usize>,

    /// Number of board columns for a custom game
    #[arg(short, long)]
    columns: Option<usize>,

    /// Number of mines for a custom game
    #[arg(short, long)]
    mines: Option<usize>,

    /// Enable debug mode (Ctrl+M disables mines, Ctrl+R shows them) and debug messages
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Write log messages to this file
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Use this configuration file instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Logs cannot go to the terminal while the UI owns it, so without a log
/// file everything is off unless RUST_LOG asks otherwise.
fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let default_level = match (&args.log_file, args.debug) {
        (None, _) => "off",
        (Some(_), true) => "debug",
        (Some(_), false) => "info",
    };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_level));
    if let Some(path) = &args.log_file {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let path = args.config.clone().or_else(config_path);
    let mut cfg = load_or_create_config(path.as_deref());

    if args.rows.is_some() || args.columns.is_some() || args.mines.is_some() {
        let (r, c, n) = cfg.board();
        let (r, c, n) = (args.rows.unwrap_or(r), args.columns.unwrap_or(c), args.mines.unwrap_or(n));
        // Reject a bad board before the terminal is taken over
        Minefield::new(r, c, n)?;
        cfg.set_custom(r, c, n);
    }
    if args.debug {
        cfg.debug = true;
    }

    // Launch the main UI loop
    let cfg = run_ui(cfg)?;

    // Save preferences before exiting
    if let Some(path) = path {
        cfg.save(&path)?;
    }
    info!("bye");
    Ok(())
}
