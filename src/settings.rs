use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::pdf::{DEFAULT_CONTAINER_HEIGHT, DEFAULT_CONTAINER_WIDTH, RenderPolicy};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfmount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_container_width")]
    pub container_width: u32,

    #[serde(default = "default_container_height")]
    pub container_height: u32,

    #[serde(default)]
    pub render_policy: RenderPolicy,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_container_width() -> u32 {
    DEFAULT_CONTAINER_WIDTH
}

fn default_container_height() -> u32 {
    DEFAULT_CONTAINER_HEIGHT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            container_width: default_container_width(),
            container_height: default_container_height(),
            render_policy: RenderPolicy::default(),
            log_level: LogLevel::default(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the user config directory, creating the file with
/// defaults when it does not exist yet
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`.
///
/// Returns false (and leaves the current settings alone) when the file
/// cannot be read or parsed.
pub fn load_settings_from_path(path: &Path) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            return false;
        }
    };

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");

            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }

            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
            true
        }
        Err(e) => {
            error!("Failed to parse settings file {path:?}: {e}");
            false
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, format!("{SETTINGS_HEADER}{body}")) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pdfmount settings
#
# container_width / container_height: size of the reader area in pixels.
#   Pages are scaled to fit container_width.
# render_policy: what happens to page requests that arrive mid-render.
#   coalesce - only the newest request is rendered
#   queue    - every request is rendered in order
# log_level: error | warn | info | debug | trace

"#;

// Public API for accessing settings

pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_container_size() -> (u32, u32) {
    SETTINGS
        .read()
        .map(|s| (s.container_width, s.container_height))
        .unwrap_or((DEFAULT_CONTAINER_WIDTH, DEFAULT_CONTAINER_HEIGHT))
}

pub fn get_render_policy() -> RenderPolicy {
    SETTINGS
        .read()
        .map(|s| s.render_policy)
        .unwrap_or_default()
}

pub fn get_log_level() -> LogLevel {
    SETTINGS.read().map(|s| s.log_level).unwrap_or_default()
}
