use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lattice_wm::actor::reactor::{Event, LayoutCommand, Reactor};
use lattice_wm::actor::{self, broadcast::BroadcastEvent};
use lattice_wm::common::config::{Config, config_file};
use lattice_wm::common::log;
use lattice_wm::layout_engine::WindowSize;
use lattice_wm::sys::geometry::Rect;
use lattice_wm::sys::headless::{HeadlessDisplay, HeadlessWindow};
use lattice_wm::sys::screen::Monitor;
use lattice_wm::sys::window::WindowRef;
use serde::Serialize;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "lattice")]
#[command(about = "Tiling layout core with a headless preview")]
struct Cli {
    /// Configuration file. Defaults to ~/.lattice.toml, then the built-in
    /// configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out headless windows and print where they end up
    Preview {
        /// Number of windows to open on the first workspace
        #[arg(long, default_value_t = 3)]
        windows: usize,
        #[arg(long, default_value_t = 1920)]
        width: i32,
        #[arg(long, default_value_t = 1080)]
        height: i32,
        /// Monitor scale in percent
        #[arg(long, default_value_t = 100)]
        scale: i32,
        /// JSON list of layout commands to run after the windows are open,
        /// e.g. '["next_layout_engine", {"swap_window_in_direction": "left"}]'
        #[arg(long)]
        commands: Option<String>,
        /// Print the active engine tree instead of window positions
        #[arg(long)]
        tree: bool,
    },
    /// Validate the configuration file
    CheckConfig {
        /// Write back automatically fixable values
        #[arg(long)]
        fix: bool,
    },
}

#[derive(Serialize)]
struct PreviewWindow {
    title: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    size: WindowSize,
}

fn main() -> ExitCode {
    let cli: Cli = Parser::parse();
    log::init_logging();

    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let result = match cli.command {
        Commands::Preview {
            windows,
            width,
            height,
            scale,
            commands,
            tree,
        } => {
            let monitor = Monitor::new("preview", Rect::new(0, 0, width, height), scale);
            preview(&config_path, windows, monitor, commands.as_deref(), tree)
        }
        Commands::CheckConfig { fix } => check_config(&config_path, fix),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("lattice: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn preview(
    config_path: &Path,
    windows: usize,
    monitor: Monitor,
    commands: Option<&str>,
    tree: bool,
) -> anyhow::Result<()> {
    let config = Config::read_or_builtin(config_path)?;
    let commands: Vec<LayoutCommand> = match commands {
        Some(json) => serde_json::from_str(json).context("parsing --commands")?,
        None => Vec::new(),
    };

    let display = HeadlessDisplay::new();
    let (broadcast_tx, broadcast_rx) = actor::channel::<BroadcastEvent>();
    let mut reactor = Reactor::new(config, display.clone(), monitor, Some(broadcast_tx))
        .context("starting reactor")?;

    let handles: Vec<_> = (0..windows)
        .map(|i| WindowRef::new(HeadlessWindow::new(i, format!("window {i}"))))
        .collect();
    for window in &handles {
        reactor.handle_event(Event::WindowAdded(window.clone()));
        reactor.handle_event(Event::WindowFocused(window.clone()));
    }
    for command in commands {
        reactor.handle_event(Event::Command(command));
    }

    for (_, event) in broadcast_rx.try_iter() {
        debug!(?event, "broadcast");
    }

    let workspace = reactor.active_workspace();
    if tree {
        print!("{}", workspace.active_layout_engine().draw_tree());
        return Ok(());
    }

    let placed: Vec<PreviewWindow> = handles
        .iter()
        .filter_map(|window| workspace.try_get_window_location(window))
        .map(|state| PreviewWindow {
            title: state.window.title(),
            x: state.rect.x,
            y: state.rect.y,
            width: state.rect.width,
            height: state.rect.height,
            size: state.size,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&placed)?);
    Ok(())
}

fn check_config(config_path: &Path, fix: bool) -> anyhow::Result<()> {
    let mut config = Config::read_or_builtin(config_path)?;
    let issues = config.validate();
    for issue in &issues {
        println!("{issue}");
    }
    if issues.is_empty() {
        println!("{}: ok", config_path.display());
        return Ok(());
    }
    if !fix {
        anyhow::bail!("{} issue(s) found", issues.len());
    }

    let fixed = config.auto_fix_values();
    config.save(config_path)?;
    println!("fixed {fixed} value(s) in {}", config_path.display());
    let remaining = config.validate();
    if !remaining.is_empty() {
        anyhow::bail!("{} issue(s) could not be fixed", remaining.len());
    }
    Ok(())
}
