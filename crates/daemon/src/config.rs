//! Configuration management for the tagwm daemon.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. `~/.config/tagwm/config.toml` (XDG standard)
//! 2. `./config.toml` (current directory, for development)
//!
//! Every field has a default, so an absent or empty file yields a working
//! setup. Key names are keysym names ("Return", "Tab", single characters);
//! they are resolved against the server keymap at startup, and an unknown
//! name is a startup error.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure for tagwm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Border appearance.
    pub appearance: AppearanceConfig,
    /// Modifier and logging behavior.
    pub behavior: BehaviorConfig,
    /// Programs spawned by bindings.
    pub commands: CommandConfig,
    /// Action key bindings (tag keys 1-9 are fixed and not configurable).
    pub keys: KeyConfig,
}

/// Border appearance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Border width in pixels.
    #[serde(default = "default_border_width")]
    pub border_width: i32,

    /// Border color of the focused window, as `#rrggbb`.
    #[serde(default = "default_active_color")]
    pub active: String,

    /// Border color of unfocused windows, as `#rrggbb`.
    #[serde(default = "default_inactive_color")]
    pub inactive: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            border_width: default_border_width(),
            active: default_active_color(),
            inactive: default_inactive_color(),
        }
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Modifier for every binding: "mod4" (super) or "mod1" (alt).
    #[serde(default = "default_modifier")]
    pub modifier: String,

    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            modifier: default_modifier(),
            log_level: default_log_level(),
        }
    }
}

/// Programs spawned by the terminal and menu bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    #[serde(default = "default_terminal")]
    pub terminal: String,

    #[serde(default = "default_menu")]
    pub menu: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            terminal: default_terminal(),
            menu: default_menu(),
        }
    }
}

/// Keysym names for the action bindings. All are pressed together with the
/// configured modifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    #[serde(default = "default_key_cycle_forward")]
    pub cycle_forward: String,

    #[serde(default = "default_key_cycle_backward")]
    pub cycle_backward: String,

    #[serde(default = "default_key_toggle_tiling")]
    pub toggle_tiling: String,

    #[serde(default = "default_key_toggle_maximize")]
    pub toggle_maximize: String,

    #[serde(default = "default_key_center")]
    pub center: String,

    #[serde(default = "default_key_close")]
    pub close: String,

    #[serde(default = "default_key_terminal")]
    pub terminal: String,

    #[serde(default = "default_key_menu")]
    pub menu: String,

    #[serde(default = "default_key_quit")]
    pub quit: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            cycle_forward: default_key_cycle_forward(),
            cycle_backward: default_key_cycle_backward(),
            toggle_tiling: default_key_toggle_tiling(),
            toggle_maximize: default_key_toggle_maximize(),
            center: default_key_center(),
            close: default_key_close(),
            terminal: default_key_terminal(),
            menu: default_key_menu(),
            quit: default_key_quit(),
        }
    }
}

fn default_border_width() -> i32 {
    2
}

fn default_active_color() -> String {
    "#ffffff".to_string()
}

fn default_inactive_color() -> String {
    "#000000".to_string()
}

fn default_modifier() -> String {
    "mod4".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_terminal() -> String {
    "st".to_string()
}

fn default_menu() -> String {
    "dmenu_run".to_string()
}

fn default_key_cycle_forward() -> String {
    "Tab".to_string()
}

fn default_key_cycle_backward() -> String {
    "grave".to_string()
}

fn default_key_toggle_tiling() -> String {
    "t".to_string()
}

fn default_key_toggle_maximize() -> String {
    "m".to_string()
}

fn default_key_center() -> String {
    "x".to_string()
}

fn default_key_close() -> String {
    "q".to_string()
}

fn default_key_terminal() -> String {
    "Return".to_string()
}

fn default_key_menu() -> String {
    "d".to_string()
}

fn default_key_quit() -> String {
    "c".to_string()
}

impl Config {
    /// Load configuration from the first existing path, falling back to
    /// defaults when none exists.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

/// Configuration file search paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("", "", "tagwm") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    paths.push(PathBuf::from("./config.toml"));

    paths
}

/// Parse a `#rrggbb` color into the pixel value handed to the display
/// server.
pub fn parse_color(color: &str) -> Result<u32> {
    let hex = match color.strip_prefix('#') {
        Some(hex) if hex.len() == 6 => hex,
        _ => bail!("invalid color {color:?}, expected #rrggbb"),
    };
    u32::from_str_radix(hex, 16).with_context(|| format!("invalid color {color:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.appearance.border_width, 2);
        assert_eq!(config.appearance.active, "#ffffff");
        assert_eq!(config.appearance.inactive, "#000000");
        assert_eq!(config.behavior.modifier, "mod4");
        assert_eq!(config.commands.terminal, "st");
        assert_eq!(config.keys.cycle_forward, "Tab");
        assert_eq!(config.keys.quit, "c");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml_str = r#"
            [appearance]
            border_width = 4

            [keys]
            close = "w"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.appearance.border_width, 4);
        assert_eq!(config.appearance.active, "#ffffff");
        assert_eq!(config.keys.close, "w");
        assert_eq!(config.keys.menu, "d");
        assert_eq!(config.behavior.log_level, "info");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ffffff").unwrap(), 0xffffff);
        assert_eq!(parse_color("#4a90d9").unwrap(), 0x4a90d9);
        assert!(parse_color("ffffff").is_err());
        assert!(parse_color("#fff").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_config_paths_not_empty() {
        let paths = config_paths();
        assert!(!paths.is_empty());
    }
}
