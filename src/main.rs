//! CNC Simulator - Main entry point
//!
//! Builds the engine from the variable catalogue, bridges it to the
//! data-point server and hands control to the chosen front-end.

use anyhow::Context;
use cncsim::app::App;
use cncsim::cli::{Cli, Commands};
use cncsim::config::SimConfig;
use cncsim::control::ControlSurface;
use cncsim::engine::Engine;
use cncsim::lifecycle::{self, TerminalGuard};
use cncsim::server::{TracingPointServer, bridge};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::File;
use std::io::{BufReader, IsTerminal, stdin, stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize logging. The TUI owns the terminal, so it logs to a file;
/// every other mode logs to stderr. `RUST_LOG` overrides the level.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let tui = matches!(cli.mode(), Commands::Tui);
    let default_level = if tui { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    if tui {
        let file = File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file: {}", cli.log_file.display()))?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

/// Load the catalogue named on the command line, or the built-in one
fn load_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading variable catalogue from {}", path.display());
            SimConfig::load_from_file(path)?
        }
        None => SimConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Main application entry point
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_logging(&cli)?;
    info!("CNC simulator starting up");

    match cli.mode() {
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            match SimConfig::load_from_file(config).and_then(|c| c.validate().map(|_| c)) {
                Ok(c) => {
                    println!(
                        "✓ Configuration file is valid: {} variable(s)",
                        c.variables.len()
                    );
                }
                Err(e) => {
                    error!("Configuration validation failed: {:#}", e);
                    eprintln!("✗ Configuration validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::InitConfig { path } => {
            SimConfig::default().save_to_file(path)?;
            println!("✓ Wrote default catalogue to {}", path.display());
        }
        Commands::List => {
            let config = load_config(cli.config.as_deref())?;
            println!("Endpoint:  {}", config.endpoint);
            println!("Namespace: {}", config.namespace);
            for spec in &config.variables {
                println!("  {:<14} {:<12} {}", spec.name, spec.initial, spec.domain);
            }
        }
        Commands::Tui => run_simulator(&cli, run_tui)?,
        Commands::Line { script } => {
            run_simulator(&cli, |engine| run_line(engine, script.as_deref()))?
        }
    }

    Ok(())
}

/// Start engine and server, run a front-end, then shut everything down
fn run_simulator<F>(cli: &Cli, front_end: F) -> anyhow::Result<()>
where
    F: FnOnce(&Arc<Engine>) -> anyhow::Result<()>,
{
    let config = load_config(cli.config.as_deref())?;
    let engine = Arc::new(Engine::new(&config)?);

    if let Err(e) = lifecycle::init_signal_handlers(Arc::clone(&engine)) {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let publisher = bridge(&engine, TracingPointServer::new(config.endpoint.clone()))?;

    let result = front_end(&engine);

    engine.shutdown();
    publisher.stop();
    result
}

fn run_tui(engine: &Arc<Engine>) -> anyhow::Result<()> {
    debug!("Initializing terminal for TUI mode");
    let _guard = TerminalGuard::acquire()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))
        .context("Failed to create terminal")?;

    let mut app = App::new(Arc::clone(engine))?;
    app.run(&mut terminal)?;
    Ok(())
}

fn run_line(engine: &Arc<Engine>, script: Option<&Path>) -> anyhow::Result<()> {
    let surface = ControlSurface::new(engine);
    let mut out = stdout().lock();
    match script {
        Some(path) => {
            info!("Running command script {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open script: {}", path.display()))?;
            surface.run_session(BufReader::new(file), &mut out, false)?;
        }
        None => {
            let input = stdin();
            let prompt = input.is_terminal();
            surface.run_session(input.lock(), &mut out, prompt)?;
        }
    }
    Ok(())
}
