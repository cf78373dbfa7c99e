/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub grid: GridConfig,
    pub gamepad: GamepadConfig,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub sound: bool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame: Duration,
    pub enemy_move_delay: Duration,
    pub key_hold: Duration,   // release fallback for terminals without Release events
}

/// Caps on the field size. `None` = fit the terminal.
#[derive(Clone, Debug, Default)]
pub struct GridConfig {
    pub max_width: Option<usize>,
    pub max_height: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_enemy_move_delay")]
    enemy_move_delay_ms: u64,
    #[serde(default = "default_key_hold")]
    key_hold_ms: u64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGrid {
    #[serde(default)]
    max_width: usize,
    #[serde(default)]
    max_height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_sound")]
    sound: bool,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }          // ~60 fps
fn default_enemy_move_delay() -> u64 { 500 }
fn default_key_hold() -> u64 { 160 }

fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_level() -> String { "info".into() }
fn default_sound() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            enemy_move_delay_ms: default_enemy_move_delay(),
            key_hold_ms: default_key_hold(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            log_file: String::new(),
            log_level: default_log_level(),
            sound: default_sound(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        Self::from_toml(load_toml(&search_dirs))
    }

    /// Parse config text directly. Parse errors fall back to defaults.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_toml_str(text: &str) -> Self {
        Self::from_toml(parse_toml(text))
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        // Zero would spin the frame loop
        let frame_ms = toml_cfg.timing.frame_ms.max(1);

        GameConfig {
            timing: TimingConfig {
                frame: Duration::from_millis(frame_ms),
                enemy_move_delay: Duration::from_millis(toml_cfg.timing.enemy_move_delay_ms),
                key_hold: Duration::from_millis(toml_cfg.timing.key_hold_ms),
            },
            grid: GridConfig {
                max_width: non_zero(toml_cfg.grid.max_width),
                max_height: non_zero(toml_cfg.grid.max_height),
            },
            gamepad: GamepadConfig {
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            log_file: if toml_cfg.general.log_file.is_empty() {
                None
            } else {
                Some(PathBuf::from(toml_cfg.general.log_file))
            },
            log_level: toml_cfg.general.log_level,
            sound: toml_cfg.general.sound,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

fn non_zero(v: usize) -> Option<usize> {
    if v == 0 { None } else { Some(v) }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before the logger exists, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Warning: config.toml parse error: {e}");
            eprintln!("Using default settings.");
            TomlConfig::default()
        }
    }
}
