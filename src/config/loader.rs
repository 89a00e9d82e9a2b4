use anyhow::{Context, Result};
use log::{error, warn};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{
    appearance::Appearance,
    keybind::{self, Bind, Command},
};

const DEFAULT_CONFIG: &str = r###"# Global modifier key for all shortcuts
# You can combine multiple modifiers with + like:
# modifier = "alt+shift"
# modifier = "super+alt"
# Available modifiers: alt, ctrl, shift, super (or win)
modifier = "alt"

# Window appearance
[appearance]
# Border width in pixels, dropped while a window is maximized
border_width = 2
# Border color in hex format
border_color = "#7A8478"
# Border color for the window under the pointer
focused_border_color = "#A7C080"
# New windows open a new column until this many columns exist,
# after that they stack in the last column
columns = 2

# Keybindings
# Commands:
#   - exit: Exit the window manager
#   - close: Close focused window
#   - maximize: Toggle the focused window between tiled and full screen
#   - spawn <cmd>: Run a command
# A bind may set its own modifier instead of the global one.
[[binds]]
key = "w"
command = "exit"

[[binds]]
key = "q"
command = "spawn alacritty"

[[binds]]
key = "c"
command = "close"

[[binds]]
key = "return"
modifier = "ctrl+alt"
command = "maximize""###;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub modifier: String,
    pub binds: Vec<Bind>,
    #[serde(default)]
    pub appearance: Appearance,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modifier: "alt".to_string(),
            binds: vec![
                Bind {
                    key: "w".to_string(),
                    command: Command::Exit,
                    modifier: None,
                },
                Bind {
                    key: "c".to_string(),
                    command: Command::Close,
                    modifier: None,
                },
                Bind {
                    key: "return".to_string(),
                    command: Command::Maximize,
                    modifier: Some("ctrl+alt".to_string()),
                },
            ],
            appearance: Appearance::default(),
        }
    }
}

impl Config {
    pub fn get_keysym_for_key(&self, key: &str) -> Option<u64> {
        keybind::get_keysym_for_key(key)
    }

    pub fn get_modifier(&self) -> u32 {
        keybind::get_modifier(&self.modifier)
    }

    /// Modifier mask `bind` is grabbed with.
    pub fn modifier_for(&self, bind: &Bind) -> u32 {
        bind.modifier
            .as_deref()
            .map_or_else(|| self.get_modifier(), keybind::get_modifier)
    }

    pub fn get_border_color(&self) -> u64 {
        self.appearance.get_border_color()
    }

    pub fn get_focused_border_color(&self) -> u64 {
        self.appearance.get_focused_border_color()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Loads the user config, falling back to the built-in one on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            error!("Failed to load config: {:#}", e);
            warn!("Using default configuration");
            Self::default()
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("Failed to get HOME directory")?;

        Ok(PathBuf::from(home).join(".config/colwm/config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path, DEFAULT_CONFIG).context("Failed to write default config")
    }
}
