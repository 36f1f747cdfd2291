//! tagwm Daemon
//!
//! Main process for the tagwm window manager.
//!
//! Responsibilities:
//! - Claim the display and register for structural events
//! - Resolve configuration into border decoration and key bindings
//! - Grab the bound keys and pointer buttons on the root window
//! - Run the synchronous event loop: receive, dispatch, flush

mod config;
mod dispatcher;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{parse_color, Config, KeyConfig};
use dispatcher::{Action, Bindings, Commands, Decor, Dispatcher};
use tagwm_core::transport::Transport;
use tagwm_core::TagId;
use tagwm_platform_x11::{
    keysym_from_name, modifier_from_name, Keymap, Modifier, ShellLauncher, X11Transport,
};

#[derive(Parser, Debug)]
#[command(name = "tagwm", version, about = "A minimal tag-based window manager")]
struct Args {
    /// Configuration file, overriding the default search paths.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (needed for log level)
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            // Can't use tracing yet, fall back to eprintln
            eprintln!("Failed to load configuration: {}. Using defaults.", e);
            Config::default()
        }),
    };

    let log_level = match config.behavior.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // default fallback for invalid values
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("tagwm starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let decor = Decor {
        border_width: config.appearance.border_width.max(0),
        active_pixel: parse_color(&config.appearance.active)?,
        inactive_pixel: parse_color(&config.appearance.inactive)?,
    };
    let modifier = modifier_from_name(&config.behavior.modifier).with_context(|| {
        format!(
            "unknown modifier {:?}, expected \"mod4\" or \"mod1\"",
            config.behavior.modifier
        )
    })?;

    let mut transport = X11Transport::connect()?;

    let monitors = transport.monitors()?;
    info!("Detected {} monitor(s):", monitors.len());
    for (id, m) in monitors.iter().enumerate() {
        info!("  Monitor {}: {}x{} at x={}", id, m.width, m.height, m.x_origin);
    }

    let keymap = transport.keymap()?;
    let bindings = resolve_bindings(&config.keys, &keymap)?;

    for keycode in bindings.action_keycodes() {
        transport.grab_key(modifier, keycode)?;
    }
    for keycode in bindings.tag_keycodes() {
        // Bare switches the view, shifted moves the focused window.
        transport.grab_key(modifier, keycode)?;
        transport.grab_key(modifier | Modifier::SHIFT, keycode)?;
    }
    transport.grab_buttons(modifier)?;
    transport.flush()?;

    let mut dispatcher = Dispatcher::new(
        monitors,
        decor,
        bindings,
        Commands {
            terminal: config.commands.terminal.clone(),
            menu: config.commands.menu.clone(),
        },
        Box::new(ShellLauncher),
    );

    // Seed the current monitor from wherever the pointer already is.
    match transport.query_pointer() {
        Ok(pointer) => dispatcher.track_monitor(pointer.root_x),
        Err(err) => warn!(%err, "could not query initial pointer position"),
    }

    info!("Entering event loop");
    while dispatcher.is_running() {
        let event = transport.next_event()?;
        if let Err(err) = dispatcher.handle_event(&mut transport, event) {
            error!(%err, "fatal transport failure");
            return Err(err.into());
        }
        transport.flush()?;
    }

    info!("tagwm shutting down");
    Ok(())
}

/// Resolve configured keysym names against the server keymap. Unknown names
/// or keysyms missing from the keyboard are startup errors.
fn resolve_bindings(keys: &KeyConfig, keymap: &Keymap) -> Result<Bindings> {
    let mut bindings = Bindings::new();

    let actions = [
        (&keys.cycle_forward, Action::CycleForward),
        (&keys.cycle_backward, Action::CycleBackward),
        (&keys.toggle_tiling, Action::ToggleTiling),
        (&keys.toggle_maximize, Action::ToggleMaximize),
        (&keys.center, Action::Center),
        (&keys.close, Action::Close),
        (&keys.terminal, Action::SpawnTerminal),
        (&keys.menu, Action::SpawnMenu),
        (&keys.quit, Action::Quit),
    ];
    for (name, action) in actions {
        let keycode = resolve_key(keymap, name)?;
        if bindings.action(keycode).is_some() {
            warn!(key = %name, ?action, "key bound twice, keeping the last binding");
        }
        bindings.bind_action(keycode, action);
    }

    // Tag keys 1-9 are fixed.
    for tag in 1..=9 {
        let name = (b'0' + tag) as char;
        let keycode = resolve_key(keymap, &name.to_string())?;
        bindings.bind_tag(keycode, TagId::from(tag));
    }
    Ok(bindings)
}

fn resolve_key(keymap: &Keymap, name: &str) -> Result<u8> {
    let keysym =
        keysym_from_name(name).with_context(|| format!("unknown key name {name:?}"))?;
    keymap
        .keycode_for(keysym)
        .with_context(|| format!("key {name:?} is not present on this keyboard"))
}
