//! Configuration file and runtime settings.
//!
//! The file is optional TOML; every field has a default. [`Settings`] is
//! the runtime context built once at startup and shared by `Arc` with
//! every component that reads configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::menu::{MenuAction, MenuTitleTable};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid forbidden_apps pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("drag_threshold must be at least 1")]
    DragThreshold,
}

/// Extra menu titles, added to the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuTitles {
    pub copy: Vec<String>,
    pub cut: Vec<String>,
    pub paste: Vec<String>,
}

/// On-disk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub force_copy: bool,
    pub browser_script: bool,
    pub drag_threshold: usize,
    pub trigger_delay_ms: u64,
    pub click_settle_ms: u64,
    pub restore_delay_ms: u64,
    pub ax_timeout_ms: u64,
    /// Regular expressions matched against bundle identifiers.
    pub forbidden_apps: Vec<String>,
    pub menu_titles: MenuTitles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            force_copy: false,
            browser_script: false,
            drag_threshold: 3,
            trigger_delay_ms: 100,
            click_settle_ms: 100,
            restore_delay_ms: 50,
            ax_timeout_ms: 2000,
            forbidden_apps: Vec::new(),
            menu_titles: MenuTitles::default(),
        }
    }
}

impl Config {
    /// Load from `explicit`, or from the default location.
    ///
    /// A missing explicit file is an error; a missing default file yields
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        let default = default_path(
            std::env::var_os("XDG_CONFIG_HOME"),
            std::env::var_os("HOME"),
        );
        match default {
            Some(path) if path.exists() => Self::read(&path),
            _ => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// `$XDG_CONFIG_HOME/xpop/config.toml`, else `$HOME/.config/xpop/config.toml`.
pub fn default_path(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match xdg_config_home.filter(|v| !v.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => PathBuf::from(home.filter(|v| !v.is_empty())?).join(".config"),
    };
    Some(base.join("xpop").join("config.toml"))
}

/// Runtime settings context.
#[derive(Debug)]
pub struct Settings {
    force_copy: AtomicBool,
    pub browser_script: bool,
    pub drag_threshold: usize,
    pub trigger_delay: Duration,
    pub click_settle: Duration,
    pub restore_delay: Duration,
    pub ax_timeout: Duration,
    forbidden_apps: Vec<Regex>,
    pub menu_titles: Arc<MenuTitleTable>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.drag_threshold == 0 {
            return Err(ConfigError::DragThreshold);
        }
        let forbidden_apps = config
            .forbidden_apps
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut titles = MenuTitleTable::default();
        titles.extend(MenuAction::Copy, config.menu_titles.copy.iter().cloned());
        titles.extend(MenuAction::Cut, config.menu_titles.cut.iter().cloned());
        titles.extend(MenuAction::Paste, config.menu_titles.paste.iter().cloned());

        Ok(Self {
            force_copy: AtomicBool::new(config.force_copy),
            browser_script: config.browser_script,
            drag_threshold: config.drag_threshold,
            trigger_delay: Duration::from_millis(config.trigger_delay_ms),
            click_settle: Duration::from_millis(config.click_settle_ms),
            restore_delay: Duration::from_millis(config.restore_delay_ms),
            ax_timeout: Duration::from_millis(config.ax_timeout_ms),
            forbidden_apps,
            menu_titles: Arc::new(titles),
        })
    }

    /// Whether the menu-driven strategy runs. Read fresh on every
    /// acquisition.
    pub fn force_copy(&self) -> bool {
        self.force_copy.load(Ordering::SeqCst)
    }

    pub fn set_force_copy(&self, enabled: bool) {
        self.force_copy.store(enabled, Ordering::SeqCst);
    }

    /// Whether any forbidden-app rule matches `bundle_id`.
    pub fn is_forbidden(&self, bundle_id: &str) -> bool {
        self.forbidden_apps.iter().any(|re| re.is_match(bundle_id))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            force_copy: AtomicBool::new(false),
            browser_script: false,
            drag_threshold: 3,
            trigger_delay: Duration::from_millis(100),
            click_settle: Duration::from_millis(100),
            restore_delay: Duration::from_millis(50),
            ax_timeout: Duration::from_millis(2000),
            forbidden_apps: Vec::new(),
            menu_titles: Arc::new(MenuTitleTable::default()),
        }
    }
}
